use std::convert::Infallible;
use std::marker::PhantomData;

use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Re-types a never-failing publisher with an arbitrary failure type, so it
/// can splice into chains that do fail. Purely a type-level operation; the
/// failure arm is statically unreachable.
pub struct SetFailureTypeOp<S, E> {
  source: S,
  _failure: PhantomData<E>,
}

impl<S, E> SetFailureTypeOp<S, E> {
  pub(crate) fn new(source: S) -> Self { SetFailureTypeOp { source, _failure: PhantomData } }
}

impl<S: Clone, E> Clone for SetFailureTypeOp<S, E> {
  fn clone(&self) -> Self { SetFailureTypeOp::new(self.source.clone()) }
}

impl<S, E> Publisher for SetFailureTypeOp<S, E>
where
  S: Publisher<Failure = Infallible>,
  E: 'static,
{
  type Output = S::Output;
  type Failure = E;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = S::Output, Failure = E> + 'static,
  {
    self.source.subscribe(SetFailureTypeSubscriber { downstream: subscriber });
  }
}

struct SetFailureTypeSubscriber<Sub> {
  downstream: Sub,
}

impl<Sub> Subscriber for SetFailureTypeSubscriber<Sub>
where
  Sub: Subscriber,
{
  type Input = Sub::Input;
  type Failure = Infallible;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, value: Self::Input) -> Demand { self.downstream.receive(value) }

  fn receive_completion(&mut self, completion: Completion<Infallible>) {
    match completion {
      Completion::Finished => self.downstream.receive_completion(Completion::Finished),
      Completion::Failed(never) => match never {},
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[test]
  fn retyped_source_composes_with_failing_chains() {
    let result = Rc::new(RefCell::new(Vec::new()));
    let completions = Rc::new(RefCell::new(Vec::new()));
    let c_result = result.clone();
    let c_completions = completions.clone();

    let failing = PassthroughSubject::<i32, &'static str>::new();
    failing.send_completion(Completion::Finished);

    from_iter(0..3)
      .set_failure_type::<&'static str>()
      .append_publisher(failing)
      .sink_all(
        move |v| c_result.borrow_mut().push(v),
        |_err| {},
        move || c_completions.borrow_mut().push("done"),
      );

    assert_eq!(*result.borrow(), vec![0, 1, 2]);
    assert_eq!(*completions.borrow(), vec!["done"]);
  }
}
