use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Emits the first `count` values, then completes and cancels the upstream.
#[derive(Clone)]
pub struct PrefixOp<S> {
  source: S,
  count: usize,
}

impl<S> PrefixOp<S> {
  pub(crate) fn new(source: S, count: usize) -> Self { PrefixOp { source, count } }
}

impl<S> Publisher for PrefixOp<S>
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
    let relay = Relay::forwarding(subscriber);
    relay.hand_subscription();
    if self.count == 0 {
      relay.finish(Completion::Finished);
      return;
    }
    self
      .source
      .subscribe(PrefixSubscriber { relay, remaining: self.count });
  }
}

struct PrefixSubscriber<Sub: Subscriber> {
  relay: Relay<Sub>,
  remaining: usize,
}

impl<Sub> Subscriber for PrefixSubscriber<Sub>
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
    if self.remaining == 0 {
      return Demand::NONE;
    }
    self.remaining -= 1;
    self.relay.push(value);
    if self.remaining == 0 {
      self.relay.finish(Completion::Finished);
    }
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.relay.finish(completion);
  }
}
