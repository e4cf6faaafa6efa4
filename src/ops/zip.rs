use std::collections::VecDeque;

use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::rc::{MutRc, RcDeref, RcDerefMut};
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Pairs values from two publishers index-by-index.
///
/// Each side queues values the other has not matched yet; a pair is emitted
/// as soon as both queues are non-empty. The stream completes when a side
/// has finished and its queue is drained (no further pairs can ever form).
#[derive(Clone)]
pub struct ZipOp<A, B> {
  pub(crate) a: A,
  pub(crate) b: B,
}

struct ZipState<L, R> {
  left: VecDeque<L>,
  right: VecDeque<R>,
  left_done: bool,
  right_done: bool,
}

impl<A, B> Publisher for ZipOp<A, B>
where
  A: Publisher,
  B: Publisher<Failure = A::Failure>,
  A::Output: 'static,
  B::Output: 'static,
  A::Failure: 'static,
{
  type Output = (A::Output, B::Output);
  type Failure = A::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = (A::Output, B::Output), Failure = A::Failure> + 'static,
  {
    let relay = Relay::buffering(subscriber);
    relay.hand_subscription();
    let state = MutRc::own(ZipState {
      left: VecDeque::new(),
      right: VecDeque::new(),
      left_done: false,
      right_done: false,
    });
    self.a.subscribe(ZipLeftSubscriber {
      relay: relay.clone(),
      state: state.clone(),
    });
    self.b.subscribe(ZipRightSubscriber { relay, state });
  }
}

/// Emit every ready pair, then complete if an exhausted side's queue ran
/// dry.
fn settle<L, R, Sub>(relay: &Relay<Sub>, state: &MutRc<ZipState<L, R>>)
where
  Sub: Subscriber<Input = (L, R)> + 'static,
  L: 'static,
  R: 'static,
  Sub::Failure: 'static,
{
  loop {
    let pair = {
      let mut s = state.rc_deref_mut();
      if s.left.is_empty() || s.right.is_empty() {
        None
      } else {
        s.left.pop_front().zip(s.right.pop_front())
      }
    };
    match pair {
      Some(pair) => relay.push(pair),
      None => break,
    }
  }
  let starved = {
    let s = state.rc_deref();
    (s.left_done && s.left.is_empty()) || (s.right_done && s.right.is_empty())
  };
  if starved {
    relay.finish(Completion::Finished);
  }
}

struct ZipLeftSubscriber<L, R, Sub: Subscriber> {
  relay: Relay<Sub>,
  state: MutRc<ZipState<L, R>>,
}

impl<L, R, Sub> Subscriber for ZipLeftSubscriber<L, R, Sub>
where
  Sub: Subscriber<Input = (L, R)> + 'static,
  L: 'static,
  R: 'static,
  Sub::Failure: 'static,
{
  type Input = L;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.relay.attach(subscription);
  }

  fn receive(&mut self, value: L) -> Demand {
    self.state.rc_deref_mut().left.push_back(value);
    settle(&self.relay, &self.state);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        self.state.rc_deref_mut().left_done = true;
        settle(&self.relay, &self.state);
      }
      failed => self.relay.finish(failed),
    }
  }
}

struct ZipRightSubscriber<L, R, Sub: Subscriber> {
  relay: Relay<Sub>,
  state: MutRc<ZipState<L, R>>,
}

impl<L, R, Sub> Subscriber for ZipRightSubscriber<L, R, Sub>
where
  Sub: Subscriber<Input = (L, R)> + 'static,
  L: 'static,
  R: 'static,
  Sub::Failure: 'static,
{
  type Input = R;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.relay.attach(subscription);
  }

  fn receive(&mut self, value: R) -> Demand {
    self.state.rc_deref_mut().right.push_back(value);
    settle(&self.relay, &self.state);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        self.state.rc_deref_mut().right_done = true;
        settle(&self.relay, &self.state);
      }
      failed => self.relay.finish(failed),
    }
  }
}
