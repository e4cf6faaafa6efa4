use std::marker::PhantomData;

use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::rc::{MutRc, RcDerefMut};
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Maps each value to an inner publisher and interleaves all inner values
/// into one stream, in arrival order.
///
/// Every inner runs concurrently with its own tracked upstream link.
/// Completes once the outer and every inner have finished; the first
/// failure anywhere terminates everything.
pub struct FlatMapOp<S, F, P> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) _marker: PhantomData<fn() -> P>,
}

impl<S: Clone, F: Clone, P> Clone for FlatMapOp<S, F, P> {
  fn clone(&self) -> Self {
    FlatMapOp {
      source: self.source.clone(),
      func: self.func.clone(),
      _marker: PhantomData,
    }
  }
}

struct FlatState {
  active: usize,
  outer_done: bool,
}

impl<S, P, F> Publisher for FlatMapOp<S, F, P>
where
  S: Publisher,
  S::Output: 'static,
  F: FnMut(S::Output) -> P + 'static,
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
    let state = MutRc::own(FlatState { active: 0, outer_done: false });
    self.source.subscribe(FlatMapOuterSubscriber {
      relay,
      state,
      func: self.func,
      _marker: PhantomData,
    });
  }
}

struct FlatMapOuterSubscriber<Item, P, F, Sub: Subscriber> {
  relay: Relay<Sub>,
  state: MutRc<FlatState>,
  func: F,
  _marker: PhantomData<fn(Item) -> P>,
}

impl<Item, P, F, Sub> Subscriber for FlatMapOuterSubscriber<Item, P, F, Sub>
where
  F: FnMut(Item) -> P,
  P: Publisher<Output = Sub::Input, Failure = Sub::Failure> + 'static,
  Sub: Subscriber + 'static,
  Sub::Input: 'static,
  Sub::Failure: 'static,
{
  type Input = Item;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.relay.attach(subscription);
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.state.rc_deref_mut().active += 1;
    let inner = (self.func)(value);
    inner.subscribe(FlatMapInnerSubscriber {
      relay: self.relay.clone(),
      state: self.state.clone(),
      link: None,
    });
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        let finish = {
          let mut s = self.state.rc_deref_mut();
          s.outer_done = true;
          s.active == 0
        };
        if finish {
          self.relay.finish(Completion::Finished);
        }
      }
      failed => self.relay.finish(failed),
    }
  }
}

struct FlatMapInnerSubscriber<Sub: Subscriber> {
  relay: Relay<Sub>,
  state: MutRc<FlatState>,
  link: Option<usize>,
}

impl<Sub> Subscriber for FlatMapInnerSubscriber<Sub>
where
  Sub: Subscriber + 'static,
  Sub::Input: 'static,
  Sub::Failure: 'static,
{
  type Input = Sub::Input;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.link = Some(self.relay.attach(subscription));
  }

  fn receive(&mut self, value: Self::Input) -> Demand {
    self.relay.push(value);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        if let Some(link) = self.link.take() {
          self.relay.detach(link);
        }
        let finish = {
          let mut s = self.state.rc_deref_mut();
          s.active = s.active.saturating_sub(1);
          s.outer_done && s.active == 0
        };
        if finish {
          self.relay.finish(Completion::Finished);
        }
      }
      failed => self.relay.finish(failed),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn inner_streams_interleave_into_one() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(RefCell::new(false));
    let c_result = result.clone();
    let c_completed = completed.clone();

    from_iter(1..=3)
      .flat_map(|n| from_iter(0..n).map(move |v| (n, v)))
      .sink_all(
        move |v| c_result.borrow_mut().push(v),
        |_err| {},
        move || *c_completed.borrow_mut() = true,
      );

    assert_eq!(
      *result.borrow(),
      vec![(1, 0), (2, 0), (2, 1), (3, 0), (3, 1), (3, 2)]
    );
    assert!(*completed.borrow());
  }

  #[test]
  fn completes_only_after_every_inner() {
    let completed = Rc::new(RefCell::new(false));
    let c_completed = completed.clone();

    let outer = PassthroughSubject::<i32, std::convert::Infallible>::new();
    let feed = outer.clone();
    let inner = PassthroughSubject::<i32, std::convert::Infallible>::new();
    let inner_feed = inner.clone();

    outer.flat_map(move |_| inner.clone()).sink_all(
      |_| {},
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

    feed.send(1);
    feed.send_completion(Completion::Finished);
    // Outer done, inner still open.
    assert!(!*completed.borrow());

    inner_feed.send_completion(Completion::Finished);
    assert!(*completed.borrow());
  }

  #[test]
  fn inner_failure_fails_the_whole_stream() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let c_errors = errors.clone();

    let inner = PassthroughSubject::<i32, &'static str>::new();
    let inner_feed = inner.clone();

    let outer = PassthroughSubject::<i32, &'static str>::new();
    let feed = outer.clone();

    outer.flat_map(move |_| inner.clone()).sink_all(
      |_| {},
      move |e| c_errors.borrow_mut().push(e),
      || panic!("must not finish"),
    );

    feed.send(1);
    inner_feed.send_completion(Completion::Failed("inner boom"));

    assert_eq!(*errors.borrow(), vec!["inner boom"]);
  }
}
