use std::marker::PhantomData;

use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

pub struct MapOp<S, F, B> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) _marker: PhantomData<fn() -> B>,
}

impl<S: Clone, F: Clone, B> Clone for MapOp<S, F, B> {
  fn clone(&self) -> Self {
    MapOp { source: self.source.clone(), func: self.func.clone(), _marker: PhantomData }
  }
}

impl<S, B, F> Publisher for MapOp<S, F, B>
where
  S: Publisher,
  S::Output: 'static,
  F: FnMut(S::Output) -> B + 'static,
{
  type Output = B;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = B, Failure = S::Failure> + 'static,
  {
    self.source.subscribe(MapSubscriber {
      downstream: subscriber,
      func: self.func,
      _marker: PhantomData,
    });
  }
}

struct MapSubscriber<Item, Sub, F> {
  downstream: Sub,
  func: F,
  _marker: PhantomData<fn(Item)>,
}

impl<Item, B, Sub, F> Subscriber for MapSubscriber<Item, Sub, F>
where
  Sub: Subscriber<Input = B>,
  F: FnMut(Item) -> B,
{
  type Input = Item;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.downstream.receive((self.func)(value))
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.downstream.receive_completion(completion)
  }
}
