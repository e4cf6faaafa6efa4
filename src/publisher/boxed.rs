use crate::publisher::Publisher;
use crate::subscriber::{BoxSubscriber, Subscriber};

/// Object-safe shim behind [`BoxPublisher`]. `Publisher::subscribe` is
/// generic over the subscriber, so erasure goes through a boxed subscriber
/// instead.
trait DynPublisher {
  type Output;
  type Failure;

  fn dyn_subscribe(self: Box<Self>, subscriber: BoxSubscriber<Self::Output, Self::Failure>);
}

impl<P> DynPublisher for P
where
  P: Publisher,
  P::Output: 'static,
  P::Failure: 'static,
{
  type Output = P::Output;
  type Failure = P::Failure;

  fn dyn_subscribe(self: Box<Self>, subscriber: BoxSubscriber<P::Output, P::Failure>) {
    (*self).subscribe(subscriber)
  }
}

/// A type-erased publisher.
///
/// Lets heterogeneous operator chains share one concrete type, at the cost
/// of boxing the subscriber on subscribe.
pub struct BoxPublisher<Item, Err>(Box<dyn DynPublisher<Output = Item, Failure = Err>>);

impl<Item: 'static, Err: 'static> BoxPublisher<Item, Err> {
  pub fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Output = Item, Failure = Err> + 'static,
  {
    BoxPublisher(Box::new(publisher))
  }
}

impl<Item: 'static, Err: 'static> Publisher for BoxPublisher<Item, Err> {
  type Output = Item;
  type Failure = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Input = Item, Failure = Err> + 'static,
  {
    self.0.dyn_subscribe(Box::new(subscriber));
  }
}
