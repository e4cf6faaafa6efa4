use std::mem;

use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Aggregates upstream values into `Vec`s.
///
/// With `count: None` the whole stream becomes a single `Vec`, emitted on
/// completion (empty stream yields an empty `Vec`). With `count: Some(n)`
/// a full buffer is emitted every `n` values and a final partial buffer on
/// completion, so the concatenation of all buffers is the input sequence.
#[derive(Clone)]
pub struct CollectOp<S> {
  pub(crate) source: S,
  pub(crate) count: Option<usize>,
}

impl<S> Publisher for CollectOp<S>
where
  S: Publisher,
  S::Output: 'static,
  S::Failure: 'static,
{
  type Output = Vec<S::Output>;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = Vec<S::Output>, Failure = S::Failure> + 'static,
  {
    let relay = Relay::buffering(subscriber);
    relay.hand_subscription();
    // A zero window can never fill; treat it as collect-everything.
    let count = self.count.filter(|n| *n > 0);
    self
      .source
      .subscribe(CollectSubscriber { relay, count, buf: Vec::new() });
  }
}

struct CollectSubscriber<Item, Sub: Subscriber> {
  relay: Relay<Sub>,
  count: Option<usize>,
  buf: Vec<Item>,
}

impl<Item, Sub> Subscriber for CollectSubscriber<Item, Sub>
where
  Item: 'static,
  Sub: Subscriber<Input = Vec<Item>> + 'static,
  Sub::Failure: 'static,
{
  type Input = Item;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.relay.attach(subscription);
  }

  fn receive(&mut self, value: Item) -> Demand {
    self.buf.push(value);
    if let Some(count) = self.count {
      if self.buf.len() == count {
        self.relay.push(mem::take(&mut self.buf));
      }
    }
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        // collect() always emits, even an empty Vec; a windowed collect
        // only flushes a non-empty remainder.
        if self.count.is_none() || !self.buf.is_empty() {
          self.relay.push(mem::take(&mut self.buf));
        }
        self.relay.finish(Completion::Finished);
      }
      failed => self.relay.finish(failed),
    }
  }
}
