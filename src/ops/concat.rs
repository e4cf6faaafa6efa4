use crate::demand::Demand;
use crate::ops::set_failure_type::SetFailureTypeOp;
use crate::publisher::{FromIter, Publisher};
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Runs `first` to completion, then `second`; the output is the strict
/// concatenation of the two. `second` is not even subscribed until `first`
/// finishes, and any downstream demand `first` left unfilled is re-requested
/// from `second` on attach. A failure on either side terminates the whole
/// stream.
///
/// `prepend`/`append` with plain iterators are this node with a
/// `from_iter` source spliced in.
#[derive(Clone)]
pub struct ConcatOp<P1, P2> {
  pub(crate) first: P1,
  pub(crate) second: P2,
}

pub type PrependOp<S, I> =
  ConcatOp<SetFailureTypeOp<FromIter<I>, <S as Publisher>::Failure>, S>;

pub type AppendOp<S, I> =
  ConcatOp<S, SetFailureTypeOp<FromIter<I>, <S as Publisher>::Failure>>;

impl<P1, P2> Publisher for ConcatOp<P1, P2>
where
  P1: Publisher,
  P2: Publisher<Output = P1::Output, Failure = P1::Failure> + 'static,
  P1::Output: 'static,
  P1::Failure: 'static,
{
  type Output = P1::Output;
  type Failure = P1::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = P1::Output, Failure = P1::Failure> + 'static,
  {
    let relay = Relay::forwarding(subscriber);
    relay.hand_subscription();
    self.first.subscribe(ConcatFirstSubscriber {
      relay,
      second: Some(self.second),
      link: usize::MAX,
    });
  }
}

struct ConcatFirstSubscriber<P2, Sub: Subscriber> {
  relay: Relay<Sub>,
  second: Option<P2>,
  link: usize,
}

impl<P2, Sub> Subscriber for ConcatFirstSubscriber<P2, Sub>
where
  P2: Publisher<Output = Sub::Input, Failure = Sub::Failure> + 'static,
  Sub: Subscriber + 'static,
  Sub::Input: 'static,
  Sub::Failure: 'static,
{
  type Input = Sub::Input;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.link = self.relay.attach(subscription);
  }

  fn receive(&mut self, value: Self::Input) -> Demand {
    self.relay.push(value);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        // The spent link must go before the handover so the second
        // upstream is the only one receiving forwarded demand.
        self.relay.detach(self.link);
        if self.relay.is_terminated() {
          return;
        }
        if let Some(second) = self.second.take() {
          second.subscribe(ConcatSecondSubscriber { relay: self.relay.clone() });
        }
      }
      failed => self.relay.finish(failed),
    }
  }
}

struct ConcatSecondSubscriber<Sub: Subscriber> {
  relay: Relay<Sub>,
}

impl<Sub> Subscriber for ConcatSecondSubscriber<Sub>
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
    self.relay.push(value);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    self.relay.finish(completion);
  }
}
