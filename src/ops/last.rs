use crate::demand::Demand;
use crate::ops::filter::FilterOp;
use crate::publisher::Publisher;
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Emits the final upstream value once the upstream completes. Must observe
/// the whole sequence, so it requests `Unlimited` upstream.
#[derive(Clone)]
pub struct LastOp<S> {
  pub(crate) source: S,
}

pub type LastWhereOp<S, F> = LastOp<FilterOp<S, F>>;

impl<S> Publisher for LastOp<S>
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
    let relay = Relay::buffering(subscriber);
    relay.hand_subscription();
    self.source.subscribe(LastSubscriber { relay, last: None });
  }
}

struct LastSubscriber<Sub: Subscriber> {
  relay: Relay<Sub>,
  last: Option<Sub::Input>,
}

impl<Sub> Subscriber for LastSubscriber<Sub>
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
    self.last = Some(value);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        if let Some(value) = self.last.take() {
          self.relay.push(value);
        }
        self.relay.finish(Completion::Finished);
      }
      failed => self.relay.finish(failed),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn emits_only_the_final_value() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(RefCell::new(false));
    let c_result = result.clone();
    let c_completed = completed.clone();

    from_iter(0..10).last().sink_all(
      move |v| c_result.borrow_mut().push(v),
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

    assert_eq!(*result.borrow(), vec![9]);
    assert!(*completed.borrow());
  }

  #[test]
  fn last_where_tracks_the_final_match() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();

    from_iter(0..10)
      .last_where(|v| v % 4 == 0)
      .sink(move |v| c_result.borrow_mut().push(v));

    assert_eq!(*result.borrow(), vec![8]);
  }

  #[test]
  fn empty_stream_completes_without_a_value() {
    let hits = Rc::new(RefCell::new(0));
    let completed = Rc::new(RefCell::new(false));
    let c_hits = hits.clone();
    let c_completed = completed.clone();

    empty::<i32>().last().sink_all(
      move |_| *c_hits.borrow_mut() += 1,
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

    assert_eq!(*hits.borrow(), 0);
    assert!(*completed.borrow());
  }
}
