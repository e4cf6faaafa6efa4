use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Suppresses the leading run of values matching the predicate. The gate
/// opens permanently on the first non-match.
#[derive(Clone)]
pub struct DropWhileOp<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

impl<S, F> Publisher for DropWhileOp<S, F>
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
    self.source.subscribe(DropWhileSubscriber {
      downstream: subscriber,
      predicate: self.predicate,
      dropping: true,
    });
  }
}

struct DropWhileSubscriber<Sub, F> {
  downstream: Sub,
  predicate: F,
  dropping: bool,
}

impl<Sub, F> Subscriber for DropWhileSubscriber<Sub, F>
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
    if self.dropping {
      if (self.predicate)(&value) {
        return Demand::max(1);
      }
      self.dropping = false;
    }
    self.downstream.receive(value)
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.downstream.receive_completion(completion)
  }
}
