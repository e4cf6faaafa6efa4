use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Drops values equal to their immediate predecessor. Only adjacent values
/// are compared; a value may reappear after something else intervened.
#[derive(Clone)]
pub struct RemoveDuplicatesOp<S> {
  pub(crate) source: S,
}

impl<S> Publisher for RemoveDuplicatesOp<S>
where
  S: Publisher,
  S::Output: PartialEq + Clone + 'static,
{
  type Output = S::Output;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = S::Output, Failure = S::Failure> + 'static,
  {
    self
      .source
      .subscribe(RemoveDuplicatesSubscriber { downstream: subscriber, last: None });
  }
}

struct RemoveDuplicatesSubscriber<Sub: Subscriber> {
  downstream: Sub,
  last: Option<Sub::Input>,
}

impl<Sub> Subscriber for RemoveDuplicatesSubscriber<Sub>
where
  Sub: Subscriber,
  Sub::Input: PartialEq + Clone,
{
  type Input = Sub::Input;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, value: Self::Input) -> Demand {
    if self.last.as_ref() == Some(&value) {
      return Demand::max(1);
    }
    self.last = Some(value.clone());
    self.downstream.receive(value)
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.downstream.receive_completion(completion)
  }
}
