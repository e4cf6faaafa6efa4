//! Finite-sequence sources.

use std::convert::Infallible;
use std::iter::Peekable;

use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::rc::{MutRc, RcDerefMut};
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::Subscription;

/// Creates a publisher that delivers the iterator's values under demand.
///
/// Values flow only while outstanding demand is nonzero; the publisher
/// completes as soon as the iterator is exhausted, and completes immediately
/// on subscribe for an empty iterator. Never fails.
///
/// # Examples
///
/// ```
/// use ripple::prelude::*;
/// use std::{cell::RefCell, rc::Rc};
///
/// let collected = Rc::new(RefCell::new(vec![]));
/// let c = collected.clone();
/// from_iter(0..4).sink(move |v| c.borrow_mut().push(v));
/// assert_eq!(*collected.borrow(), vec![0, 1, 2, 3]);
/// ```
pub fn from_iter<I>(iter: I) -> FromIter<I>
where
  I: IntoIterator,
{
  FromIter(iter)
}

/// Publisher over a single value.
pub fn of<Item>(value: Item) -> FromIter<std::iter::Once<Item>> {
  from_iter(std::iter::once(value))
}

/// Publisher that completes without ever emitting a value.
pub fn empty<Item>() -> FromIter<std::iter::Empty<Item>> { from_iter(std::iter::empty()) }

/// Publisher producing the same value `n` times.
pub fn repeat<Item>(value: Item, n: usize) -> FromIter<std::iter::Take<std::iter::Repeat<Item>>>
where
  Item: Clone,
{
  from_iter(std::iter::repeat(value).take(n))
}

#[derive(Clone)]
pub struct FromIter<I>(I);

struct IterState<I: Iterator, S> {
  iter: Option<Peekable<I>>,
  subscriber: Option<S>,
  demand: Demand,
  pumping: bool,
  closed: bool,
}

enum Action<Item, S> {
  Deliver(Item, S),
  Complete(Option<S>),
  Stop,
}

impl<I> Publisher for FromIter<I>
where
  I: IntoIterator,
  I::IntoIter: 'static,
{
  type Output = I::Item;
  type Failure = Infallible;

  fn subscribe<S2>(self, mut subscriber: S2)
  where
    S2: Subscriber<Input = I::Item, Failure = Infallible> + 'static,
  {
    let state = MutRc::own(IterState {
      iter: Some(self.0.into_iter().peekable()),
      subscriber: None,
      demand: Demand::NONE,
      pumping: false,
      closed: false,
    });
    // Hand the subscription before storing the subscriber: a request made
    // from inside receive_subscription only accumulates demand and the pump
    // below delivers it.
    subscriber.receive_subscription(Box::new(IterSubscription { state: state.clone() }));
    {
      let mut s = state.rc_deref_mut();
      if !s.closed {
        s.subscriber = Some(subscriber);
      }
    }
    pump(&state);
  }
}

struct IterSubscription<I: Iterator, S> {
  state: MutRc<IterState<I, S>>,
}

impl<I, S> Subscription for IterSubscription<I, S>
where
  I: Iterator,
  S: Subscriber<Input = I::Item>,
{
  fn request(&mut self, demand: Demand) {
    {
      let mut s = self.state.rc_deref_mut();
      if s.closed {
        return;
      }
      s.demand += demand;
    }
    pump(&self.state);
  }

  fn cancel(&mut self) {
    let mut s = self.state.rc_deref_mut();
    s.closed = true;
    s.iter = None;
    s.subscriber = None;
    s.demand = Demand::NONE;
  }
}

fn pump<I, S>(state: &MutRc<IterState<I, S>>)
where
  I: Iterator,
  S: Subscriber<Input = I::Item>,
{
  {
    let mut s = state.rc_deref_mut();
    if s.pumping {
      return;
    }
    s.pumping = true;
  }
  loop {
    let action = {
      let mut s = state.rc_deref_mut();
      if s.closed || s.subscriber.is_none() {
        s.pumping = false;
        Action::Stop
      } else {
        let exhausted = s.iter.as_mut().map_or(true, |it| it.peek().is_none());
        if exhausted {
          s.closed = true;
          s.iter = None;
          s.pumping = false;
          Action::Complete(s.subscriber.take())
        } else if !s.demand.has_any() {
          s.pumping = false;
          Action::Stop
        } else {
          match (s.iter.as_mut().and_then(Iterator::next), s.subscriber.take()) {
            (Some(value), Some(subscriber)) => {
              s.demand = s.demand.decrement();
              Action::Deliver(value, subscriber)
            }
            _ => {
              s.pumping = false;
              Action::Stop
            }
          }
        }
      }
    };
    match action {
      Action::Stop => return,
      Action::Complete(subscriber) => {
        if let Some(mut subscriber) = subscriber {
          subscriber.receive_completion(Completion::Finished);
        }
        return;
      }
      Action::Deliver(value, mut subscriber) => {
        let more = subscriber.receive(value);
        let mut s = state.rc_deref_mut();
        s.demand += more;
        if !s.closed {
          s.subscriber = Some(subscriber);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::prelude::*;
  use crate::subscription::BoxSubscription;

  #[test]
  fn delivers_everything_under_unlimited_demand() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(RefCell::new(false));
    let c_result = result.clone();
    let c_completed = completed.clone();

    from_iter(0..5).sink_all(
      move |v| c_result.borrow_mut().push(v),
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

    assert_eq!(*result.borrow(), vec![0, 1, 2, 3, 4]);
    assert!(*completed.borrow());
  }

  #[test]
  fn empty_completes_without_values() {
    let hits = Rc::new(RefCell::new(0));
    let completed = Rc::new(RefCell::new(false));
    let c_hits = hits.clone();
    let c_completed = completed.clone();

    empty::<i32>().sink_all(
      move |_| *c_hits.borrow_mut() += 1,
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

    assert_eq!(*hits.borrow(), 0);
    assert!(*completed.borrow());
  }

  #[test]
  fn repeat_emits_exactly_n() {
    let hits = Rc::new(RefCell::new(0));
    let c_hits = hits.clone();
    repeat(7, 3).sink(move |v| {
      assert_eq!(v, 7);
      *c_hits.borrow_mut() += 1;
    });
    assert_eq!(*hits.borrow(), 3);
  }

  /// Subscriber with a fixed demand budget; never replenishes.
  struct Budget {
    budget: usize,
    seen: Rc<RefCell<Vec<i32>>>,
    completions: Rc<RefCell<u32>>,
  }

  impl Subscriber for Budget {
    type Input = i32;
    type Failure = std::convert::Infallible;

    fn receive_subscription(&mut self, mut subscription: BoxSubscription) {
      subscription.request(Demand::max(self.budget));
    }

    fn receive(&mut self, value: i32) -> Demand {
      self.seen.borrow_mut().push(value);
      Demand::NONE
    }

    fn receive_completion(&mut self, _completion: Completion<Self::Failure>) {
      *self.completions.borrow_mut() += 1;
    }
  }

  #[test]
  fn never_exceeds_requested_demand() {
    let seen = Rc::new(RefCell::new(vec![]));
    let completions = Rc::new(RefCell::new(0));

    from_iter(0..100).subscribe(Budget {
      budget: 3,
      seen: seen.clone(),
      completions: completions.clone(),
    });

    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    assert_eq!(*completions.borrow(), 0);
  }

  #[test]
  fn zero_demand_starves_correctly() {
    let seen = Rc::new(RefCell::new(vec![]));
    let completions = Rc::new(RefCell::new(0));

    from_iter(0..10).subscribe(Budget {
      budget: 0,
      seen: seen.clone(),
      completions: completions.clone(),
    });

    assert!(seen.borrow().is_empty());
    assert_eq!(*completions.borrow(), 0);
  }

  #[test]
  fn exact_budget_reaches_completion() {
    let seen = Rc::new(RefCell::new(vec![]));
    let completions = Rc::new(RefCell::new(0));

    from_iter(0..3).subscribe(Budget {
      budget: 3,
      seen: seen.clone(),
      completions: completions.clone(),
    });

    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    assert_eq!(*completions.borrow(), 1);
  }

  #[test]
  fn cancel_stops_flow() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();

    /// Cancels itself after two values.
    struct TwoThenCancel {
      seen: Rc<RefCell<Vec<i32>>>,
      subscription: Option<BoxSubscription>,
    }

    impl Subscriber for TwoThenCancel {
      type Input = i32;
      type Failure = std::convert::Infallible;

      fn receive_subscription(&mut self, mut subscription: BoxSubscription) {
        subscription.request(Demand::Unlimited);
        self.subscription = Some(subscription);
      }

      fn receive(&mut self, value: i32) -> Demand {
        self.seen.borrow_mut().push(value);
        if self.seen.borrow().len() == 2 {
          if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
          }
        }
        Demand::NONE
      }

      fn receive_completion(&mut self, _completion: Completion<Self::Failure>) {
        panic!("completion after cancel");
      }
    }

    from_iter(0..100).subscribe(TwoThenCancel { seen: c_result, subscription: None });
    assert_eq!(*result.borrow(), vec![0, 1]);
  }
}
