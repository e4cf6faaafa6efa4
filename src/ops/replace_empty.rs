use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Substitutes a default value when the upstream completes without ever
/// producing one. Non-empty streams pass through untouched.
#[derive(Clone)]
pub struct ReplaceEmptyOp<S: Publisher> {
  pub(crate) source: S,
  pub(crate) default: S::Output,
}

impl<S> Publisher for ReplaceEmptyOp<S>
where
  S: Publisher,
  S::Output: 'static,
  S::Failure: 'static,
{
  type Output = S::Output;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = S::Output, Failure = S::Failure> + 'static,
  {
    let relay = Relay::buffering(subscriber);
    relay.hand_subscription();
    self.source.subscribe(ReplaceEmptySubscriber {
      relay,
      default: Some(self.default),
    });
  }
}

struct ReplaceEmptySubscriber<Sub: Subscriber> {
  relay: Relay<Sub>,
  // Taken on the first real value; `Some` at completion means empty stream.
  default: Option<Sub::Input>,
}

impl<Sub> Subscriber for ReplaceEmptySubscriber<Sub>
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
    self.default = None;
    self.relay.push(value);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        if let Some(default) = self.default.take() {
          self.relay.push(default);
        }
        self.relay.finish(Completion::Finished);
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
  fn empty_stream_yields_the_default() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();

    empty::<i32>()
      .replace_empty(42)
      .sink(move |v| c_result.borrow_mut().push(v));

    assert_eq!(*result.borrow(), vec![42]);
  }

  #[test]
  fn non_empty_stream_is_untouched() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();

    from_iter(0..3)
      .replace_empty(42)
      .sink(move |v| c_result.borrow_mut().push(v));

    assert_eq!(*result.borrow(), vec![0, 1, 2]);
  }
}
