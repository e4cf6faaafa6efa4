//! Subscriber trait, completion signal, and the closure-based sink consumer.

use std::marker::PhantomData;

use crate::demand::Demand;
use crate::rc::{MutRc, RcDeref, RcDerefMut};
use crate::subscription::{BoxSubscription, Subscription};

/// Terminal signal of a stream: either normal exhaustion or a typed failure.
///
/// Completion travels on its own channel, never thrown out of `send` or
/// `receive` calls, and is delivered at most once per subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion<Err> {
  Finished,
  Failed(Err),
}

impl<Err> Completion<Err> {
  #[inline]
  pub fn is_failure(&self) -> bool { matches!(self, Completion::Failed(_)) }
}

/// The consumer side of a stream.
///
/// Protocol, in order:
/// 1. `receive_subscription` — exactly once, synchronously, before any
///    value. The subscriber is expected (not required) to call
///    [`Subscription::request`] here to bootstrap flow; zero demand is legal
///    and means "deliver nothing until asked".
/// 2. `receive` — once per value, never exceeding cumulative requested
///    demand. The returned [`Demand`] is added to the outstanding total.
/// 3. `receive_completion` — at most once; no value follows it, even if
///    demand remains outstanding.
pub trait Subscriber {
  type Input;
  type Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription);

  fn receive(&mut self, value: Self::Input) -> Demand;

  fn receive_completion(&mut self, completion: Completion<Self::Failure>);
}

/// Type-erased subscriber; what subjects and relays store internally.
pub type BoxSubscriber<Item, Err> = Box<dyn Subscriber<Input = Item, Failure = Err>>;

impl<Item, Err> Subscriber for BoxSubscriber<Item, Err> {
  type Input = Item;
  type Failure = Err;

  #[inline]
  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    (**self).receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, value: Item) -> Demand { (**self).receive(value) }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Err>) {
    (**self).receive_completion(completion)
  }
}

// ============================================================================
// Sink: closure-based consumer with unlimited demand
// ============================================================================

struct SinkState {
  subscription: Option<BoxSubscription>,
  cancelled: bool,
}

/// Handle returned by [`PublisherExt::sink`] and [`PublisherExt::sink_all`].
///
/// Keeps the attached sink cancellable from the outside. Dropping the handle
/// does not cancel; call [`Subscription::cancel`] explicitly.
///
/// [`PublisherExt::sink`]: crate::publisher::PublisherExt::sink
/// [`PublisherExt::sink_all`]: crate::publisher::PublisherExt::sink_all
pub struct Cancellable {
  state: MutRc<SinkState>,
}

impl Subscription for Cancellable {
  fn request(&mut self, demand: Demand) {
    let mut sub = {
      let mut state = self.state.rc_deref_mut();
      if state.cancelled {
        return;
      }
      state.subscription.take()
    };
    if let Some(sub) = sub.as_mut() {
      sub.request(demand);
    }
    let mut state = self.state.rc_deref_mut();
    if !state.cancelled && state.subscription.is_none() {
      state.subscription = sub;
    }
  }

  fn cancel(&mut self) {
    let sub = {
      let mut state = self.state.rc_deref_mut();
      state.cancelled = true;
      state.subscription.take()
    };
    if let Some(mut sub) = sub {
      sub.cancel();
    }
  }
}

/// Subscriber built from closures. Requests `Unlimited` up front, so it
/// exercises no backpressure of its own.
pub struct SinkSubscriber<Item, Err, N, E, C> {
  next: N,
  error: E,
  complete: C,
  state: MutRc<SinkState>,
  _marker: PhantomData<fn(Item) -> Err>,
}

impl<Item, Err, N, E, C> SinkSubscriber<Item, Err, N, E, C> {
  pub(crate) fn new(next: N, error: E, complete: C) -> (Self, Cancellable) {
    let state = MutRc::own(SinkState { subscription: None, cancelled: false });
    let handle = Cancellable { state: state.clone() };
    (
      SinkSubscriber { next, error, complete, state, _marker: PhantomData },
      handle,
    )
  }
}

impl<Item, Err, N, E, C> Subscriber for SinkSubscriber<Item, Err, N, E, C>
where
  N: FnMut(Item),
  E: FnMut(Err),
  C: FnMut(),
{
  type Input = Item;
  type Failure = Err;

  fn receive_subscription(&mut self, mut subscription: BoxSubscription) {
    let cancelled = self.state.rc_deref().cancelled;
    if cancelled {
      subscription.cancel();
      return;
    }
    subscription.request(Demand::Unlimited);
    let mut state = self.state.rc_deref_mut();
    if state.cancelled {
      drop(state);
      subscription.cancel();
    } else {
      state.subscription = Some(subscription);
    }
  }

  fn receive(&mut self, value: Item) -> Demand {
    (self.next)(value);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.state.rc_deref_mut().subscription = None;
    match completion {
      Completion::Finished => (self.complete)(),
      Completion::Failed(err) => (self.error)(err),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::{cell::RefCell, rc::Rc};

  struct CountingSubscription {
    requests: Rc<RefCell<Vec<Demand>>>,
    cancels: Rc<RefCell<u32>>,
  }

  impl Subscription for CountingSubscription {
    fn request(&mut self, demand: Demand) { self.requests.borrow_mut().push(demand); }

    fn cancel(&mut self) { *self.cancels.borrow_mut() += 1; }
  }

  #[test]
  fn sink_requests_unlimited_on_attach() {
    let requests = Rc::new(RefCell::new(vec![]));
    let cancels = Rc::new(RefCell::new(0));
    let (mut sink, _handle) =
      SinkSubscriber::new(|_: i32| {}, |_: ()| {}, || {});

    sink.receive_subscription(Box::new(CountingSubscription {
      requests: requests.clone(),
      cancels: cancels.clone(),
    }));

    assert_eq!(*requests.borrow(), vec![Demand::Unlimited]);
    assert_eq!(*cancels.borrow(), 0);
  }

  #[test]
  fn cancel_before_attach_cancels_incoming_subscription() {
    let requests = Rc::new(RefCell::new(vec![]));
    let cancels = Rc::new(RefCell::new(0));
    let (mut sink, mut handle) =
      SinkSubscriber::new(|_: i32| {}, |_: ()| {}, || {});

    handle.cancel();
    sink.receive_subscription(Box::new(CountingSubscription {
      requests: requests.clone(),
      cancels: cancels.clone(),
    }));

    assert!(requests.borrow().is_empty());
    assert_eq!(*cancels.borrow(), 1);
  }

  #[test]
  fn completion_dispatches_to_matching_closure() {
    let finished = Rc::new(RefCell::new(0));
    let failed = Rc::new(RefCell::new(vec![]));
    let c_finished = finished.clone();
    let c_failed = failed.clone();

    let (mut sink, _handle) = SinkSubscriber::new(
      |_: i32| {},
      move |e: &'static str| c_failed.borrow_mut().push(e),
      move || *c_finished.borrow_mut() += 1,
    );
    sink.receive_completion(Completion::Finished);
    assert_eq!(*finished.borrow(), 1);
    assert!(failed.borrow().is_empty());

    let (mut sink, _handle) = SinkSubscriber::new(
      |_: i32| {},
      {
        let failed = failed.clone();
        move |e: &'static str| failed.borrow_mut().push(e)
      },
      || {},
    );
    sink.receive_completion(Completion::Failed("boom"));
    assert_eq!(*failed.borrow(), vec!["boom"]);
  }
}
