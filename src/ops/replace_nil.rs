use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Unwraps a stream of `Option`s, substituting a default for every `None`.
#[derive(Clone)]
pub struct ReplaceNilOp<S, T> {
  pub(crate) source: S,
  pub(crate) default: T,
}

impl<S, T> Publisher for ReplaceNilOp<S, T>
where
  S: Publisher<Output = Option<T>>,
  T: Clone + 'static,
{
  type Output = T;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = T, Failure = S::Failure> + 'static,
  {
    self
      .source
      .subscribe(ReplaceNilSubscriber { downstream: subscriber, default: self.default });
  }
}

struct ReplaceNilSubscriber<Sub, T> {
  downstream: Sub,
  default: T,
}

impl<Sub, T> Subscriber for ReplaceNilSubscriber<Sub, T>
where
  Sub: Subscriber<Input = T>,
  T: Clone,
{
  type Input = Option<T>;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, value: Option<T>) -> Demand {
    let value = value.unwrap_or_else(|| self.default.clone());
    self.downstream.receive(value)
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.downstream.receive_completion(completion)
  }
}
