use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Swallows every value and forwards only the terminal signal.
///
/// Requests `Unlimited` upstream on attach, so the terminal signal arrives
/// even when the downstream never requests anything.
#[derive(Clone)]
pub struct IgnoreOutputOp<S> {
  pub(crate) source: S,
}

impl<S> Publisher for IgnoreOutputOp<S>
where
  S: Publisher,
{
  type Output = S::Output;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = S::Output, Failure = S::Failure> + 'static,
  {
    self.source.subscribe(IgnoreOutputSubscriber { downstream: subscriber });
  }
}

struct IgnoreOutputSubscriber<Sub> {
  downstream: Sub,
}

impl<Sub> Subscriber for IgnoreOutputSubscriber<Sub>
where
  Sub: Subscriber,
{
  type Input = Sub::Input;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, mut subscription: BoxSubscription) {
    subscription.request(Demand::Unlimited);
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, _value: Self::Input) -> Demand { Demand::NONE }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.downstream.receive_completion(completion)
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn only_the_terminal_signal_survives() {
    let hits = Rc::new(RefCell::new(0));
    let completed = Rc::new(RefCell::new(false));
    let c_hits = hits.clone();
    let c_completed = completed.clone();

    from_iter(0..50).ignore_output().sink_all(
      move |_| *c_hits.borrow_mut() += 1,
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

    assert_eq!(*hits.borrow(), 0);
    assert!(*completed.borrow());
  }
}
