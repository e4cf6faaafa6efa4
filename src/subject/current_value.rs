use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::rc::{MutRc, RcDeref, RcDerefMut};
use crate::subject::{feed_from, register, send_event, SubjectCore, SubjectEvent};
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// A broadcast subject that remembers its latest value.
///
/// New subscribers are primed with the current value and receive it on
/// their first request, before any later sends. While a primed value sits
/// undelivered (the slot has no demand yet), newer sends conflate into it —
/// the slot eventually observes only the latest state, never a stale one.
pub struct CurrentValueSubject<Item, Err> {
  core: MutRc<SubjectCore<Item, Err>>,
  current: MutRc<Item>,
}

impl<Item, Err> Clone for CurrentValueSubject<Item, Err> {
  fn clone(&self) -> Self {
    CurrentValueSubject { core: self.core.clone(), current: self.current.clone() }
  }
}

impl<Item, Err> CurrentValueSubject<Item, Err> {
  pub fn new(initial: Item) -> Self {
    CurrentValueSubject { core: SubjectCore::new(true), current: MutRc::own(initial) }
  }
}

impl<Item, Err> CurrentValueSubject<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  /// The latest value, readable even after completion.
  pub fn value(&self) -> Item { self.current.rc_deref().clone() }

  /// Update the stored value and broadcast it. Ignored after completion,
  /// leaving the stored value untouched.
  pub fn send(&self, value: Item) {
    if self.core.rc_deref().completion.is_some() {
      return;
    }
    *self.current.rc_deref_mut() = value.clone();
    send_event(&self.core, SubjectEvent::Value(value));
  }

  /// Property-style alias for [`CurrentValueSubject::send`].
  pub fn set_value(&self, value: Item) { self.send(value) }

  /// Close the subject. The stored value stays readable via
  /// [`CurrentValueSubject::value`].
  pub fn send_completion(&self, completion: Completion<Err>) {
    send_event(&self.core, SubjectEvent::Terminal(completion))
  }
}

impl<Item, Err> Publisher for CurrentValueSubject<Item, Err>
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
    let primed = Some(self.value());
    register(&self.core, Box::new(subscriber), primed);
  }
}

impl<Item, Err> Subscriber for CurrentValueSubject<Item, Err>
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

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;
  use crate::subscription::BoxSubscription;

  #[test]
  fn subscribers_are_primed_with_the_current_value() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();

    let subject = CurrentValueSubject::<i32, std::convert::Infallible>::new(7);
    subject.clone().sink(move |v| c_result.borrow_mut().push(v));

    subject.send(8);

    assert_eq!(*result.borrow(), vec![7, 8]);
  }

  #[test]
  fn value_tracks_the_latest_send() {
    let subject = CurrentValueSubject::<i32, std::convert::Infallible>::new(0);
    assert_eq!(subject.value(), 0);
    subject.set_value(3);
    assert_eq!(subject.value(), 3);
    subject.send_completion(Completion::Finished);
    subject.send(9);
    assert_eq!(subject.value(), 3);
  }

  #[test]
  fn undelivered_primed_value_conflates_to_the_latest() {
    struct Starving {
      seen: Rc<RefCell<Vec<i32>>>,
      subscription: Rc<RefCell<Option<BoxSubscription>>>,
    }

    impl Subscriber for Starving {
      type Input = i32;
      type Failure = std::convert::Infallible;

      fn receive_subscription(&mut self, subscription: BoxSubscription) {
        *self.subscription.borrow_mut() = Some(subscription);
      }

      fn receive(&mut self, value: i32) -> Demand {
        self.seen.borrow_mut().push(value);
        Demand::NONE
      }

      fn receive_completion(&mut self, _completion: Completion<Self::Failure>) {}
    }

    let seen = Rc::new(RefCell::new(vec![]));
    let handle: Rc<RefCell<Option<BoxSubscription>>> = Rc::new(RefCell::new(None));

    let subject = CurrentValueSubject::<i32, std::convert::Infallible>::new(1);
    subject
      .clone()
      .subscribe(Starving { seen: seen.clone(), subscription: handle.clone() });

    // The primed 1 is never delivered; 2 then 3 overwrite it in place.
    subject.send(2);
    subject.send(3);
    assert!(seen.borrow().is_empty());

    if let Some(subscription) = handle.borrow_mut().as_mut() {
      subscription.request(Demand::max(5));
    }

    assert_eq!(*seen.borrow(), vec![3]);
  }

  #[test]
  fn late_subscriber_after_completion_gets_no_value() {
    let hits = Rc::new(RefCell::new(0));
    let completed = Rc::new(RefCell::new(false));
    let c_hits = hits.clone();
    let c_completed = completed.clone();

    let subject = CurrentValueSubject::<i32, std::convert::Infallible>::new(1);
    subject.send_completion(Completion::Finished);

    subject.clone().sink_all(
      move |_| *c_hits.borrow_mut() += 1,
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

    assert_eq!(*hits.borrow(), 0);
    assert!(*completed.borrow());
  }
}
