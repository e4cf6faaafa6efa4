//! Cross-operator scenarios exercising the whole engine: demand accounting
//! through chains, cancellation, fan-out, and failure propagation.

use std::{cell::RefCell, rc::Rc};

use ripple::prelude::*;

/// Subscriber with a fixed demand budget that never replenishes.
struct Budget {
  budget: usize,
  seen: Rc<RefCell<Vec<i32>>>,
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

  fn receive_completion(&mut self, _completion: Completion<Self::Failure>) {}
}

#[test]
fn a_long_chain_flows_end_to_end() {
  let result = Rc::new(RefCell::new(Vec::new()));
  let completed = Rc::new(RefCell::new(false));
  let c_result = result.clone();
  let c_completed = completed.clone();

  from_iter(1..=20)
    .filter(|v| v % 2 == 0)
    .map(|v| v * 10)
    .drop_first(2)
    .prefix(4)
    .collect()
    .sink_all(
      move |v| c_result.borrow_mut().push(v),
      |_err| {},
      move || *c_completed.borrow_mut() = true,
    );

  assert_eq!(*result.borrow(), vec![vec![60, 80, 100, 120]]);
  assert!(*completed.borrow());
}

#[test]
fn demand_is_never_exceeded_through_a_chain() {
  let seen = Rc::new(RefCell::new(vec![]));

  from_iter(0..10_000)
    .map(|v| v + 1)
    .filter(|v| v % 3 == 0)
    .subscribe(Budget { budget: 4, seen: seen.clone() });

  assert_eq!(*seen.borrow(), vec![3, 6, 9, 12]);
}

#[test]
fn cancellation_stops_an_unbounded_source() {
  struct CancelAfter {
    limit: usize,
    seen: Rc<RefCell<Vec<i32>>>,
    subscription: Option<BoxSubscription>,
  }

  impl Subscriber for CancelAfter {
    type Input = i32;
    type Failure = std::convert::Infallible;

    fn receive_subscription(&mut self, mut subscription: BoxSubscription) {
      subscription.request(Demand::Unlimited);
      self.subscription = Some(subscription);
    }

    fn receive(&mut self, value: i32) -> Demand {
      self.seen.borrow_mut().push(value);
      if self.seen.borrow().len() == self.limit {
        if let Some(mut subscription) = self.subscription.take() {
          subscription.cancel();
        }
      }
      Demand::NONE
    }

    fn receive_completion(&mut self, _completion: Completion<Self::Failure>) {
      panic!("nothing may follow a cancel");
    }
  }

  let seen = Rc::new(RefCell::new(vec![]));
  from_iter(0..)
    .map(|v| v * 2)
    .subscribe(CancelAfter { limit: 5, seen: seen.clone(), subscription: None });

  assert_eq!(*seen.borrow(), vec![0, 2, 4, 6, 8]);
}

#[test]
fn collect_count_windows_reassemble_the_input() {
  for window in [1usize, 2, 3, 5, 7] {
    let buffers: Rc<RefCell<Vec<Vec<i32>>>> = Rc::new(RefCell::new(Vec::new()));
    let c_buffers = buffers.clone();

    let input: Vec<i32> = (0..17).collect();
    from_iter(input.clone())
      .collect_count(window)
      .sink(move |buf| c_buffers.borrow_mut().push(buf));

    let buffers = buffers.borrow();
    let expected_count = (input.len() + window - 1) / window;
    assert_eq!(buffers.len(), expected_count, "window {}", window);
    for buf in buffers.iter().take(buffers.len() - 1) {
      assert_eq!(buf.len(), window, "window {}", window);
    }
    let rebuilt: Vec<i32> = buffers.iter().flatten().copied().collect();
    assert_eq!(rebuilt, input, "window {}", window);
  }
}

#[test]
fn subject_fanout_keeps_per_subscriber_demand_apart() {
  let eager = Rc::new(RefCell::new(Vec::new()));
  let capped = Rc::new(RefCell::new(vec![]));
  let c_eager = eager.clone();

  let subject = PassthroughSubject::<i32, std::convert::Infallible>::new();
  subject.clone().sink(move |v| c_eager.borrow_mut().push(v));
  subject
    .clone()
    .subscribe(Budget { budget: 2, seen: capped.clone() });

  for v in 0..5 {
    subject.send(v);
  }

  // The unlimited sink saw everything; the capped one only its budget.
  assert_eq!(*eager.borrow(), vec![0, 1, 2, 3, 4]);
  assert_eq!(*capped.borrow(), vec![0, 1]);
}

#[test]
fn failure_propagates_through_a_chain_and_latches() {
  let values = Rc::new(RefCell::new(Vec::new()));
  let errors = Rc::new(RefCell::new(Vec::new()));
  let c_values = values.clone();
  let c_errors = errors.clone();

  let subject = PassthroughSubject::<i32, &'static str>::new();
  let feed = subject.clone();

  subject
    .map(|v| v * 10)
    .filter(|v| *v > 5)
    .sink_all(
      move |v| c_values.borrow_mut().push(v),
      move |e| c_errors.borrow_mut().push(e),
      || panic!("must not finish"),
    );

  feed.send(1);
  feed.send_completion(Completion::Failed("broken"));
  feed.send(2);
  feed.send_completion(Completion::Failed("again"));

  assert_eq!(*values.borrow(), vec![10]);
  assert_eq!(*errors.borrow(), vec!["broken"]);
}

#[test]
fn current_value_subject_primes_a_combine_latest() {
  let result = Rc::new(RefCell::new(Vec::new()));
  let c_result = result.clone();

  let state = CurrentValueSubject::<i32, std::convert::Infallible>::new(1);
  let events = PassthroughSubject::<&'static str, std::convert::Infallible>::new();
  let (set_state, fire) = (state.clone(), events.clone());

  state
    .combine_latest(events)
    .sink(move |v| c_result.borrow_mut().push(v));

  fire.send("a");
  set_state.send(2);
  fire.send("b");

  assert_eq!(*result.borrow(), vec![(1, "a"), (2, "a"), (2, "b")]);
}

#[test]
fn merge_and_zip_compose_over_subject_feeds() {
  let result = Rc::new(RefCell::new(Vec::new()));
  let c_result = result.clone();

  let a = PassthroughSubject::<i32, std::convert::Infallible>::new();
  let b = PassthroughSubject::<i32, std::convert::Infallible>::new();
  let ticks = PassthroughSubject::<i32, std::convert::Infallible>::new();
  let (feed_a, feed_b, tick) = (a.clone(), b.clone(), ticks.clone());

  a.merge(b)
    .zip(ticks)
    .sink(move |v| c_result.borrow_mut().push(v));

  feed_a.send(1);
  feed_b.send(2);
  tick.send(100);
  tick.send(200);
  tick.send(300);
  feed_a.send(3);

  assert_eq!(*result.borrow(), vec![(1, 100), (2, 200), (3, 300)]);
}

#[test]
fn scan_over_a_subject_accumulates_across_sends() {
  let result = Rc::new(RefCell::new(Vec::new()));
  let c_result = result.clone();

  let subject = PassthroughSubject::<i32, std::convert::Infallible>::new();
  let feed = subject.clone();

  subject
    .scan(0, |acc, v| acc + v)
    .remove_duplicates()
    .sink(move |v| c_result.borrow_mut().push(v));

  feed.send(1);
  feed.send(0); // running total unchanged; duplicate is dropped
  feed.send(2);

  assert_eq!(*result.borrow(), vec![1, 3]);
}
