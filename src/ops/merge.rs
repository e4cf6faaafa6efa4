use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::rc::{MutRc, RcDerefMut};
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Interleaves two same-typed publishers in arrival order.
///
/// Completes once both sides finish; the first failure wins, cancels the
/// surviving side and discards anything still queued.
#[derive(Clone)]
pub struct MergeOp<A, B> {
  pub(crate) a: A,
  pub(crate) b: B,
}

impl<A, B> Publisher for MergeOp<A, B>
where
  A: Publisher,
  B: Publisher<Output = A::Output, Failure = A::Failure>,
  A::Output: 'static,
  A::Failure: 'static,
{
  type Output = A::Output;
  type Failure = A::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = A::Output, Failure = A::Failure> + 'static,
  {
    let relay = Relay::buffering(subscriber);
    relay.hand_subscription();
    let live = MutRc::own(2usize);
    self
      .a
      .subscribe(MergeSideSubscriber { relay: relay.clone(), live: live.clone() });
    self.b.subscribe(MergeSideSubscriber { relay, live });
  }
}

struct MergeSideSubscriber<Sub: Subscriber> {
  relay: Relay<Sub>,
  live: MutRc<usize>,
}

impl<Sub> Subscriber for MergeSideSubscriber<Sub>
where
  Sub: Subscriber + 'static,
  Sub::Input: 'static,
  Sub::Failure: 'static,
{
  type Input = Sub::Input;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.relay.attach(subscription);
  }

  fn receive(&mut self, value: Self::Input) -> Demand {
    self.relay.push(value);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        let both_done = {
          let mut live = self.live.rc_deref_mut();
          *live = live.saturating_sub(1);
          *live == 0
        };
        if both_done {
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
  fn interleaves_in_arrival_order() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();

    let left = PassthroughSubject::<i32, std::convert::Infallible>::new();
    let right = PassthroughSubject::<i32, std::convert::Infallible>::new();
    let (feed_l, feed_r) = (left.clone(), right.clone());

    left.merge(right).sink(move |v| c_result.borrow_mut().push(v));

    feed_l.send(1);
    feed_r.send(10);
    feed_l.send(2);
    feed_r.send(20);

    assert_eq!(*result.borrow(), vec![1, 10, 2, 20]);
  }

  #[test]
  fn completes_only_after_both_sides() {
    let completed = Rc::new(RefCell::new(false));
    let c_completed = completed.clone();

    let left = PassthroughSubject::<i32, std::convert::Infallible>::new();
    let right = PassthroughSubject::<i32, std::convert::Infallible>::new();
    let (feed_l, feed_r) = (left.clone(), right.clone());

    left.merge(right).sink_all(
      |_| {},
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

    feed_l.send_completion(Completion::Finished);
    assert!(!*completed.borrow());
    feed_r.send_completion(Completion::Finished);
    assert!(*completed.borrow());
  }

  #[test]
  fn first_failure_wins_and_silences_the_survivor() {
    let values = Rc::new(RefCell::new(Vec::new()));
    let errors = Rc::new(RefCell::new(Vec::new()));
    let c_values = values.clone();
    let c_errors = errors.clone();

    let left = PassthroughSubject::<i32, &'static str>::new();
    let right = PassthroughSubject::<i32, &'static str>::new();
    let (feed_l, feed_r) = (left.clone(), right.clone());

    left.merge(right).sink_all(
      move |v| c_values.borrow_mut().push(v),
      move |e| c_errors.borrow_mut().push(e),
      || panic!("must not finish"),
    );

    feed_l.send(1);
    feed_r.send_completion(Completion::Failed("boom"));
    feed_l.send(2);

    assert_eq!(*values.borrow(), vec![1]);
    assert_eq!(*errors.borrow(), vec!["boom"]);
  }

  #[test]
  fn merged_finite_sources_deliver_everything() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();

    from_iter(0..3)
      .merge(from_iter(10..13))
      .sink(move |v| c_result.borrow_mut().push(v));

    let mut seen = result.borrow().clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 10, 11, 12]);
  }
}
