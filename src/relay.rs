//! Shared delivery node for operators that decouple upstream arrival from
//! downstream demand.
//!
//! A [`Relay`] owns the downstream subscriber, a FIFO of values waiting for
//! demand, an optional pending completion, and the upstream subscriptions
//! feeding it. It is also the `Subscription` handed downstream, so `request`
//! and `cancel` land here.
//!
//! A forwarding relay (`Relay::forwarding`) passes downstream requests to
//! its upstream unchanged; cardinality-preserving tails like `prefix` use
//! it. A buffering relay (`Relay::buffering`) asks every upstream for
//! `Unlimited` and queues arrivals against downstream demand; the combiners
//! use it, with per-upstream buffers unbounded when input rates are skewed.
//! Delivery is serialized by a `draining` guard, so re-entrant pushes and
//! requests from inside a downstream callback are picked up by the running
//! drain loop instead of interleaving.

use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::demand::Demand;
use crate::rc::{MutRc, RcDeref, RcDerefMut};
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::{BoxSubscription, DynamicSubscriptions, Subscription};

struct RelayCore<S: Subscriber> {
  downstream: Option<S>,
  demand: Demand,
  queue: VecDeque<S::Input>,
  pending: Option<Completion<S::Failure>>,
  upstream: DynamicSubscriptions<BoxSubscription>,
  forward_requests: bool,
  // Demand replenished while the upstream links are checked out of the
  // registry; the active forward loop drains it before returning.
  forward_pending: Demand,
  forwarding: bool,
  draining: bool,
  terminated: bool,
}

enum Step<S: Subscriber> {
  Value(S::Input, S),
  Complete(Completion<S::Failure>, S),
  Idle,
}

pub(crate) struct Relay<S: Subscriber> {
  core: MutRc<RelayCore<S>>,
}

impl<S: Subscriber> Clone for Relay<S> {
  fn clone(&self) -> Self { Relay { core: self.core.clone() } }
}

impl<S: Subscriber> Relay<S> {
  fn new(downstream: S, forward_requests: bool) -> Self {
    Relay {
      core: MutRc::own(RelayCore {
        downstream: Some(downstream),
        demand: Demand::NONE,
        queue: VecDeque::new(),
        pending: None,
        upstream: DynamicSubscriptions::new(),
        forward_requests,
        forward_pending: Demand::NONE,
        forwarding: false,
        draining: false,
        terminated: false,
      }),
    }
  }

  /// Relay that forwards downstream requests to its single upstream.
  pub fn forwarding(downstream: S) -> Self { Relay::new(downstream, true) }

  /// Relay that requests `Unlimited` from every attached upstream and
  /// buffers arrivals against downstream demand.
  pub fn buffering(downstream: S) -> Self { Relay::new(downstream, false) }

  /// Hand this relay to the downstream subscriber as its subscription.
  ///
  /// Must be called exactly once, before any upstream is attached, so the
  /// "subscription before any value" contract holds even when an upstream
  /// delivers synchronously on attach.
  pub fn hand_subscription(&self)
  where
    Self: Subscription + 'static,
  {
    let downstream = self.core.rc_deref_mut().downstream.take();
    if let Some(mut downstream) = downstream {
      downstream.receive_subscription(Box::new(self.clone()));
      let mut core = self.core.rc_deref_mut();
      if !core.terminated {
        core.downstream = Some(downstream);
      }
    }
    self.drain();
  }

  /// Register an upstream subscription and apply the demand policy.
  /// Returns an ID usable with [`Relay::detach`], or `usize::MAX` when the
  /// relay is already terminated and the subscription was cancelled instead.
  ///
  /// In forwarding mode the new upstream is asked for the whole outstanding
  /// downstream ledger, so a replacement upstream (concat's second half)
  /// inherits the demand its predecessor left unfilled.
  pub fn attach(&self, mut subscription: BoxSubscription) -> usize {
    let forward = {
      let core = self.core.rc_deref();
      if core.terminated {
        None
      } else {
        Some(core.forward_requests)
      }
    };
    let forward = match forward {
      Some(forward) => forward,
      None => {
        subscription.cancel();
        return usize::MAX;
      }
    };
    if forward {
      // Register first, then route the outstanding ledger through the
      // forward loop so demand replenished during a synchronous delivery
      // is not lost.
      let (id, outstanding) = {
        let mut core = self.core.rc_deref_mut();
        let id = core.upstream.add(subscription);
        (id, core.demand)
      };
      if outstanding.has_any() {
        self.forward_upstream(outstanding);
      }
      id
    } else {
      // May deliver synchronously; the core is not borrowed here.
      subscription.request(Demand::Unlimited);
      let mut core = self.core.rc_deref_mut();
      if core.terminated {
        drop(core);
        subscription.cancel();
        usize::MAX
      } else {
        core.upstream.add(subscription)
      }
    }
  }

  /// Remove and cancel one upstream link (e.g. a completed inner publisher).
  pub fn detach(&self, id: usize) {
    let removed = self.core.rc_deref_mut().upstream.remove(id);
    if let Some(mut subscription) = removed {
      subscription.cancel();
    }
  }

  /// Queue a value for delivery under downstream demand.
  pub fn push(&self, value: S::Input) {
    {
      let mut core = self.core.rc_deref_mut();
      if core.terminated || core.pending.is_some() {
        return;
      }
      core.queue.push_back(value);
    }
    self.drain();
  }

  /// Record the terminal signal. `Finished` is delivered once the queue
  /// drains; a failure clears the queue, cancels every upstream and is
  /// delivered immediately.
  pub fn finish(&self, completion: Completion<S::Failure>) {
    let failed = completion.is_failure();
    let cancelled: SmallVec<[BoxSubscription; 2]> = {
      let mut core = self.core.rc_deref_mut();
      if core.terminated || core.pending.is_some() {
        return;
      }
      if failed {
        core.queue.clear();
      }
      core.pending = Some(completion);
      if failed { core.upstream.take_all() } else { SmallVec::new() }
    };
    for mut subscription in cancelled {
      subscription.cancel();
    }
    self.drain();
  }

  pub fn is_terminated(&self) -> bool { self.core.rc_deref().terminated }

  fn forward_upstream(&self, demand: Demand) {
    {
      let mut core = self.core.rc_deref_mut();
      if core.terminated {
        return;
      }
      if core.forwarding {
        // Replenish issued while the links are checked out; the active
        // loop below drains it.
        core.forward_pending += demand;
        return;
      }
      if core.upstream.is_empty() {
        // No link yet; the ledger already holds the demand and the next
        // attach forwards it.
        return;
      }
      core.forward_pending += demand;
      core.forwarding = true;
    }
    loop {
      let (mut links, demand): (SmallVec<[BoxSubscription; 2]>, Demand) = {
        let mut core = self.core.rc_deref_mut();
        let demand = std::mem::replace(&mut core.forward_pending, Demand::NONE);
        if core.terminated || !demand.has_any() {
          core.forwarding = false;
          return;
        }
        (core.upstream.take_all(), demand)
      };
      for link in links.iter_mut() {
        link.request(demand);
      }
      let mut core = self.core.rc_deref_mut();
      if core.terminated {
        core.forwarding = false;
        drop(core);
        for mut link in links {
          link.cancel();
        }
        return;
      }
      for link in links {
        core.upstream.add(link);
      }
    }
  }

  fn drain(&self) {
    {
      let mut core = match self.core.try_rc_deref_mut() {
        Some(core) => core,
        // Re-entrant call from inside a delivery; the outer drain loop
        // picks up whatever state changed.
        None => return,
      };
      if core.draining {
        return;
      }
      core.draining = true;
    }
    loop {
      let step = {
        let mut core = self.core.rc_deref_mut();
        if core.terminated || core.downstream.is_none() {
          core.draining = false;
          Step::Idle
        } else if core.demand.has_any() && !core.queue.is_empty() {
          if let (Some(value), Some(downstream)) =
            (core.queue.pop_front(), core.downstream.take())
          {
            core.demand = core.demand.decrement();
            Step::Value(value, downstream)
          } else {
            core.draining = false;
            Step::Idle
          }
        } else if core.queue.is_empty() && core.pending.is_some() {
          if let (Some(completion), Some(downstream)) =
            (core.pending.take(), core.downstream.take())
          {
            core.terminated = true;
            Step::Complete(completion, downstream)
          } else {
            core.draining = false;
            Step::Idle
          }
        } else {
          core.draining = false;
          Step::Idle
        }
      };
      match step {
        Step::Idle => return,
        Step::Value(value, mut downstream) => {
          let more = downstream.receive(value);
          let forward = {
            let mut core = self.core.rc_deref_mut();
            core.demand += more;
            if !core.terminated {
              core.downstream = Some(downstream);
            }
            core.forward_requests && more.has_any() && !core.terminated
          };
          if forward {
            self.forward_upstream(more);
          }
        }
        Step::Complete(completion, mut downstream) => {
          downstream.receive_completion(completion);
          let links = {
            let mut core = self.core.rc_deref_mut();
            core.draining = false;
            core.upstream.take_all()
          };
          for mut link in links {
            link.cancel();
          }
          return;
        }
      }
    }
  }
}

impl<S> Subscription for Relay<S>
where
  S: Subscriber + 'static,
  S::Input: 'static,
  S::Failure: 'static,
{
  fn request(&mut self, demand: Demand) {
    let forward = {
      let mut core = self.core.rc_deref_mut();
      if core.terminated {
        return;
      }
      core.demand += demand;
      core.forward_requests
    };
    if forward && demand.has_any() {
      self.forward_upstream(demand);
    }
    self.drain();
  }

  fn cancel(&mut self) {
    let links = {
      let mut core = self.core.rc_deref_mut();
      if core.terminated {
        return;
      }
      core.terminated = true;
      core.downstream = None;
      core.queue.clear();
      core.pending = None;
      core.upstream.take_all()
    };
    for mut link in links {
      link.cancel();
    }
  }
}
