use std::marker::PhantomData;

use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Running accumulation: emits the accumulator after folding in each
/// upstream value, so the output has the same length as the input.
#[derive(Clone)]
pub struct ScanOp<S, F, B> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) seed: B,
}

impl<S, B, F> Publisher for ScanOp<S, F, B>
where
  S: Publisher,
  S::Output: 'static,
  B: Clone + 'static,
  F: FnMut(B, S::Output) -> B + 'static,
{
  type Output = B;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = B, Failure = S::Failure> + 'static,
  {
    self.source.subscribe(ScanSubscriber {
      downstream: subscriber,
      func: self.func,
      acc: self.seed,
      _marker: PhantomData,
    });
  }
}

struct ScanSubscriber<Item, Sub, F, B> {
  downstream: Sub,
  func: F,
  acc: B,
  _marker: PhantomData<fn(Item)>,
}

impl<Item, B, Sub, F> Subscriber for ScanSubscriber<Item, Sub, F, B>
where
  Sub: Subscriber<Input = B>,
  B: Clone,
  F: FnMut(B, Item) -> B,
{
  type Input = Item;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.acc = (self.func)(self.acc.clone(), value);
    self.downstream.receive(self.acc.clone())
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.downstream.receive_completion(completion)
  }
}
