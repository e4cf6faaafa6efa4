use crate::demand::Demand;
use crate::publisher::Publisher;
use crate::rc::{MutRc, RcDeref, RcDerefMut};
use crate::relay::Relay;
use crate::subscriber::{Completion, Subscriber};
use crate::subscription::BoxSubscription;

/// Emits the latest pair on every update from either side, once both sides
/// have produced at least one value.
///
/// A side finishing after it emitted keeps its last value alive and the
/// combination continues on the other side's updates. A side finishing
/// without ever emitting makes further pairs impossible, so the combined
/// stream completes right away.
#[derive(Clone)]
pub struct CombineLatestOp<A, B> {
  pub(crate) a: A,
  pub(crate) b: B,
}

struct CombineState<L, R> {
  left: Option<L>,
  right: Option<R>,
  left_done: bool,
  right_done: bool,
}

impl<A, B> Publisher for CombineLatestOp<A, B>
where
  A: Publisher,
  B: Publisher<Failure = A::Failure>,
  A::Output: Clone + 'static,
  B::Output: Clone + 'static,
  A::Failure: 'static,
{
  type Output = (A::Output, B::Output);
  type Failure = A::Failure;

  fn subscribe<Sub>(self, subscriber: Sub)
  where
    Sub: Subscriber<Input = (A::Output, B::Output), Failure = A::Failure> + 'static,
  {
    let relay = Relay::buffering(subscriber);
    relay.hand_subscription();
    let state = MutRc::own(CombineState {
      left: None,
      right: None,
      left_done: false,
      right_done: false,
    });
    self.a.subscribe(CombineLeftSubscriber {
      relay: relay.clone(),
      state: state.clone(),
    });
    self.b.subscribe(CombineRightSubscriber { relay, state });
  }
}

fn emit_latest<L, R, Sub>(relay: &Relay<Sub>, state: &MutRc<CombineState<L, R>>)
where
  Sub: Subscriber<Input = (L, R)> + 'static,
  L: Clone + 'static,
  R: Clone + 'static,
  Sub::Failure: 'static,
{
  let pair = {
    let s = state.rc_deref();
    s.left.clone().zip(s.right.clone())
  };
  if let Some(pair) = pair {
    relay.push(pair);
  }
}

/// Side finished: complete if the other side is also done, or if this side
/// never produced (no pair can ever form).
fn side_finished<L, R, Sub>(relay: &Relay<Sub>, state: &MutRc<CombineState<L, R>>)
where
  Sub: Subscriber<Input = (L, R)> + 'static,
  L: 'static,
  R: 'static,
  Sub::Failure: 'static,
{
  let done = {
    let s = state.rc_deref();
    (s.left_done && s.right_done)
      || (s.left_done && s.left.is_none())
      || (s.right_done && s.right.is_none())
  };
  if done {
    relay.finish(Completion::Finished);
  }
}

struct CombineLeftSubscriber<L, R, Sub: Subscriber> {
  relay: Relay<Sub>,
  state: MutRc<CombineState<L, R>>,
}

impl<L, R, Sub> Subscriber for CombineLeftSubscriber<L, R, Sub>
where
  Sub: Subscriber<Input = (L, R)> + 'static,
  L: Clone + 'static,
  R: Clone + 'static,
  Sub::Failure: 'static,
{
  type Input = L;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.relay.attach(subscription);
  }

  fn receive(&mut self, value: L) -> Demand {
    self.state.rc_deref_mut().left = Some(value);
    emit_latest(&self.relay, &self.state);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        self.state.rc_deref_mut().left_done = true;
        side_finished(&self.relay, &self.state);
      }
      failed => self.relay.finish(failed),
    }
  }
}

struct CombineRightSubscriber<L, R, Sub: Subscriber> {
  relay: Relay<Sub>,
  state: MutRc<CombineState<L, R>>,
}

impl<L, R, Sub> Subscriber for CombineRightSubscriber<L, R, Sub>
where
  Sub: Subscriber<Input = (L, R)> + 'static,
  L: Clone + 'static,
  R: Clone + 'static,
  Sub::Failure: 'static,
{
  type Input = R;
  type Failure = Sub::Failure;

  fn receive_subscription(&mut self, subscription: BoxSubscription) {
    self.relay.attach(subscription);
  }

  fn receive(&mut self, value: R) -> Demand {
    self.state.rc_deref_mut().right = Some(value);
    emit_latest(&self.relay, &self.state);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Self::Failure>) {
    match completion {
      Completion::Finished => {
        self.state.rc_deref_mut().right_done = true;
        side_finished(&self.relay, &self.state);
      }
      failed => self.relay.finish(failed),
    }
  }
}
