use std::marker::PhantomData;

use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::rc::{MutRc, RcDeref, RcDerefMut};
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::{BoxSubscription, ClosedSubscription, PairSubscription};

/// Suppresses source values until the trigger publisher produces its first
/// value, then cancels the trigger and lets everything through.
///
/// A trigger failure fails the stream; a trigger that finishes without
/// producing leaves the gate shut forever (only the source's terminal
/// signal gets through). Downstream cancellation reaches both upstreams.
#[derive(Clone)]
pub struct DropUntilOutputFromOp<S, T> {
  pub(crate) source: S,
  pub(crate) trigger: T,
}

impl<S, T> Publisher for DropUntilOutputFromOp<S, T>
where
  S: Publisher,
  T: Publisher<Failure = S::Failure>,
  S::Output: 'static,
  S::Failure: 'static,
  T::Output: 'static,
{
  type Output = S::Output;
  type Failure = S::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = S::Output, Failure = S::Failure> + 'static,
  {
    let relay = Relay::forwarding(subscriber);
    relay.hand_subscription();
    let gate = MutRc::own(false);
    self.trigger.subscribe(TriggerSubscriber {
      relay: relay.clone(),
      gate: gate.clone(),
      link: None,
      _value: PhantomData,
    });
    if relay.is_terminated() {
      // Trigger failed synchronously.
      return;
    }
    self.source.subscribe(GatedSubscriber { relay, gate });
  }
}

struct GatedSubscriber<Sub: Subscriber> {
  relay: Relay<Sub>,
  gate: MutRc<bool>,
}

impl<Sub> Subscriber for GatedSubscriber<Sub>
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
    if *self.gate.rc_deref() {
      self.relay.push(value);
      Demand::NONE
    } else {
      Demand::max(1)
    }
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.relay.finish(completion);
  }
}

struct TriggerSubscriber<Item, Sub: Subscriber> {
  relay: Relay<Sub>,
  gate: MutRc<bool>,
  link: Option<usize>,
  _value: PhantomData<fn(Item)>,
}

impl<Item, Sub> Subscriber for TriggerSubscriber<Item, Sub>
where
  Sub: Subscriber + 'static,
  Sub::Input: 'static,
  Sub::Failure: 'static,
{
  type Input = Item;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, mut subscription: BoxSubscription) {
    subscription.request(Demand::max(1));
    if *self.gate.rc_deref() {
      // Fired synchronously during the request; nothing left to track.
      subscription.cancel();
      return;
    }
    // The trigger manages its own one-unit demand; the relay link exists
    // only so downstream cancellation reaches it.
    let link = PairSubscription::new(ClosedSubscription, subscription);
    self.link = Some(self.relay.attach(Box::new(link)));
  }

  fn receive(&mut self, _value: Item) -> Demand {
    *self.gate.rc_deref_mut() = true;
    if let Some(link) = self.link.take() {
      self.relay.detach(link);
    }
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      // Finishing without a value leaves the gate shut.
      Completion::Finished => {}
      failed => self.relay.finish(failed),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn values_pass_only_after_the_trigger_fires() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();

    let source = PassthroughSubject::<i32, std::convert::Infallible>::new();
    let trigger = PassthroughSubject::<(), std::convert::Infallible>::new();
    let (feed, fire) = (source.clone(), trigger.clone());

    source
      .drop_until_output_from(trigger)
      .sink(move |v| c_result.borrow_mut().push(v));

    feed.send(1);
    feed.send(2);
    fire.send(());
    feed.send(3);
    feed.send(4);

    assert_eq!(*result.borrow(), vec![3, 4]);
  }

  #[test]
  fn trigger_finishing_empty_keeps_the_gate_shut() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(RefCell::new(false));
    let c_result = result.clone();
    let c_completed = completed.clone();

    let source = PassthroughSubject::<i32, std::convert::Infallible>::new();
    let trigger = PassthroughSubject::<(), std::convert::Infallible>::new();
    let (feed, fire) = (source.clone(), trigger.clone());

    source.drop_until_output_from(trigger).sink_all(
      move |v| c_result.borrow_mut().push(v),
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

    fire.send_completion(Completion::Finished);
    feed.send(1);
    feed.send_completion(Completion::Finished);

    assert!(result.borrow().is_empty());
    assert!(*completed.borrow());
  }

  #[test]
  fn trigger_failure_fails_the_stream() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let c_errors = errors.clone();

    let source = PassthroughSubject::<i32, &'static str>::new();
    let trigger = PassthroughSubject::<(), &'static str>::new();
    let fire = trigger.clone();

    source.drop_until_output_from(trigger).sink_all(
      |_| {},
      move |e| c_errors.borrow_mut().push(e),
      || panic!("must not finish"),
    );

    fire.send_completion(Completion::Failed("trigger boom"));

    assert_eq!(*errors.borrow(), vec!["trigger boom"]);
  }
}
