use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Suppresses the first `count` values, then passes everything through.
#[derive(Clone)]
pub struct DropFirstOp<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<S> Publisher for DropFirstOp<S>
where
  S: Publisher,
{
  type Output = S::Output;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = S::Output, Failure = S::Failure> + 'static,
  {
    self
      .source
      .subscribe(DropFirstSubscriber { downstream: subscriber, remaining: self.count });
  }
}

struct DropFirstSubscriber<Sub> {
  downstream: Sub,
  remaining: usize,
}

impl<Sub> Subscriber for DropFirstSubscriber<Sub>
where
  Sub: Subscriber,
{
  type Input = Sub::Input;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, value: Self::Input) -> Demand {
    if self.remaining > 0 {
      self.remaining -= 1;
      return Demand::max(1);
    }
    self.downstream.receive(value)
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.downstream.receive_completion(completion)
  }
}
