use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

#[derive(Clone)]
pub struct FilterOp<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

impl<S, F> Publisher for FilterOp<S, F>
where
  S: Publisher,
  F: FnMut(&S::Output) -> bool + 'static,
{
  type Output = S::Output;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = S::Output, Failure = S::Failure> + 'static,
  {
    self
      .source
      .subscribe(FilterSubscriber { downstream: subscriber, predicate: self.predicate });
  }
}

struct FilterSubscriber<Sub, F> {
  downstream: Sub,
  predicate: F,
}

impl<Sub, F> Subscriber for FilterSubscriber<Sub, F>
where
  Sub: Subscriber,
  F: FnMut(&Sub::Input) -> bool,
{
  type Input = Sub::Input;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, value: Self::Input) -> Demand {
    if (self.predicate)(&value) {
      self.downstream.receive(value)
    } else {
      // The dropped value consumed one unit upstream but none downstream;
      // re-request a replacement.
      Demand::max(1)
    }
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.downstream.receive_completion(completion)
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;
  use crate::subscription::BoxSubscription;

  #[test]
  fn keeps_only_matching_values() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();

    from_iter(0..10)
      .filter(|v| v % 3 == 0)
      .sink(move |v| c_result.borrow_mut().push(v));

    assert_eq!(*result.borrow(), vec![0, 3, 6, 9]);
  }

  struct Budget {
    budget: usize,
    seen: Rc<RefCell<Vec<i32>>>,
  }

  impl Subscriber for Budget {
    type Input = i32;
    type Failure = std::convert::Infallible;

    fn receive_subscription(&mut self, mut subscription: BoxSubscription) {
      subscription.request(Demand::max(self.budget));
    }

    fn receive(&mut self, value: i32) -> Demand {
      self.seen.borrow_mut().push(value);
      Demand::NONE
    }

    fn receive_completion(&mut self, _completion: Completion<Self::Failure>) {}
  }

  #[test]
  fn dropped_values_do_not_consume_downstream_demand() {
    let seen = Rc::new(RefCell::new(vec![]));

    // Two units of demand must surface two odd values even though the
    // source interleaves evens between them.
    from_iter(0..100)
      .filter(|v| v % 2 == 1)
      .subscribe(Budget { budget: 2, seen: seen.clone() });

    assert_eq!(*seen.borrow(), vec![1, 3]);
  }
}
