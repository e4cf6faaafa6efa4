use std::marker::PhantomData;

use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::rc::{MutRc, RcDeref, RcDerefMut};
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Flattens a publisher of publishers by following only the most recently
/// emitted inner publisher.
///
/// Every outer value bumps a generation counter; the previous inner
/// subscription is cancelled and values tagged with a stale generation are
/// discarded, so an abandoned inner can never surface values after its
/// replacement arrived. Completes when the outer is done and the final
/// inner (if any) is done.
#[derive(Clone)]
pub struct SwitchToLatestOp<S> {
  pub(crate) source: S,
}

struct SwitchState {
  generation: usize,
  inner_live: bool,
  outer_done: bool,
  inner_link: Option<usize>,
}

impl<S, P> Publisher for SwitchToLatestOp<S>
where
  S: Publisher<Output = P>,
  P: Publisher<Failure = S::Failure> + 'static,
  P::Output: 'static,
  S::Failure: 'static,
{
  type Output = P::Output;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = P::Output, Failure = S::Failure> + 'static,
  {
    let relay = Relay::buffering(subscriber);
    relay.hand_subscription();
    let state = MutRc::own(SwitchState {
      generation: 0,
      inner_live: false,
      outer_done: false,
      inner_link: None,
    });
    self
      .source
      .subscribe(SwitchOuterSubscriber { relay, state, _inner: PhantomData });
  }
}

struct SwitchOuterSubscriber<P, Sub: Subscriber> {
  relay: Relay<Sub>,
  state: MutRc<SwitchState>,
  _inner: PhantomData<fn(P)>,
}

impl<P, Sub> Subscriber for SwitchOuterSubscriber<P, Sub>
where
  P: Publisher<Output = Sub::Input, Failure = Sub::Failure> + 'static,
  Sub: Subscriber + 'static,
  Sub::Input: 'static,
  Sub::Failure: 'static,
{
  type Input = P;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.relay.attach(subscription);
  }

  fn receive(&mut self, inner: P) -> Demand {
    let (generation, previous) = {
      let mut s = self.state.rc_deref_mut();
      s.generation += 1;
      s.inner_live = true;
      (s.generation, s.inner_link.take())
    };
    if let Some(link) = previous {
      self.relay.detach(link);
    }
    inner.subscribe(SwitchInnerSubscriber {
      relay: self.relay.clone(),
      state: self.state.clone(),
      generation,
    });
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        let finish = {
          let mut s = self.state.rc_deref_mut();
          s.outer_done = true;
          !s.inner_live
        };
        if finish {
          self.relay.finish(Completion::Finished);
        }
      }
      failed => self.relay.finish(failed),
    }
  }
}

struct SwitchInnerSubscriber<Sub: Subscriber> {
  relay: Relay<Sub>,
  state: MutRc<SwitchState>,
  generation: usize,
}

impl<Sub: Subscriber> SwitchInnerSubscriber<Sub> {
  fn is_current(&self) -> bool { self.state.rc_deref().generation == self.generation }
}

impl<Sub> Subscriber for SwitchInnerSubscriber<Sub>
where
  Sub: Subscriber + 'static,
  Sub::Input: 'static,
  Sub::Failure: 'static,
{
  type Input = Sub::Input;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, mut subscription: BoxSubscription) {
    if !self.is_current() {
      subscription.cancel();
      return;
    }
    let link = self.relay.attach(subscription);
    let stale = {
      let mut s = self.state.rc_deref_mut();
      if s.generation == self.generation {
        s.inner_link = Some(link);
        false
      } else {
        true
      }
    };
    if stale {
      self.relay.detach(link);
    }
  }

  fn receive(&mut self, value: Self::Input) -> Demand {
    if self.is_current() {
      self.relay.push(value);
    }
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    if !self.is_current() {
      return;
    }
    match completion {
      Completion::Finished => {
        let finish = {
          let mut s = self.state.rc_deref_mut();
          s.inner_live = false;
          s.inner_link = None;
          s.outer_done
        };
        if finish {
          self.relay.finish(Completion::Finished);
        }
      }
      failed => self.relay.finish(failed),
    }
  }
}
