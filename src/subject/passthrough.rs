use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::rc::MutRc;
use crate::subject::{feed_from, register, send_event, SubjectCore, SubjectEvent};
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// A hot, cloneable broadcast pipe: values exist only while someone is
/// listening with demand.
///
/// Every subscriber gets its own demand ledger; a `send` reaches, in
/// registration order, exactly the subscribers whose ledger is non-empty —
/// the others silently miss that value. Sending with no subscribers at all
/// is a no-op. After `send_completion` the subject is terminally closed and
/// late subscribers immediately receive the stored completion.
pub struct PassthroughSubject<Item, Err> {
  core: MutRc<SubjectCore<Item, Err>>,
}

impl<Item, Err> Clone for PassthroughSubject<Item, Err> {
  fn clone(&self) -> Self { PassthroughSubject { core: self.core.clone() } }
}

impl<Item, Err> Default for PassthroughSubject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> PassthroughSubject<Item, Err> {
  pub fn new() -> Self { PassthroughSubject { core: SubjectCore::new(false) } }
}

impl<Item, Err> PassthroughSubject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  /// Broadcast a value to every subscriber with outstanding demand.
  pub fn send(&self, value: Item) { send_event(&self.core, SubjectEvent::Value(value)) }

  /// Close the subject. Idempotent; everything after the first call is
  /// ignored.
  pub fn send_completion(&self, completion: Completion<Err>) {
    send_event(&self.core, SubjectEvent::Terminal(completion))
  }
}

impl<Item, Err> Publisher for PassthroughSubject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  type Output = Item;
  type Failure = Err;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Input = Item, Failure = Err> + 'static,
  {
    register(&self.core, Box::new(subscriber), None);
  }
}

impl<Item, Err> Subscriber for PassthroughSubject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  type Input = Item;
  type Failure = Err;

  fn receive_subscription(&mut self, mut subscription: BoxSubscription) {
    subscription.request(Demand::Unlimited);
    feed_from(&self.core, subscription);
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.send(value);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Err>) {
    self.send_completion(completion);
  }
}
