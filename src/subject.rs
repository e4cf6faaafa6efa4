//! Shared subject machinery: the slot registry and serialized fan-out both
//! subject flavors are built on.
//!
//! Each subscriber gets a slot with its own demand ledger, so one slow
//! consumer never blocks another. A slot without demand misses
//! (passthrough) or conflates (current-value) the values sent meanwhile.
//! A `send` issued from inside a delivery callback is queued on a backlog
//! and broadcast after the current fan-out finishes.

use std::collections::VecDeque;

use crate::demand::Demand;
use crate::rc::{MutRc, RcDeref, RcDerefMut};
use crate::subscriber::{BoxSubscriber, Completion, Subscriber};
use crate::subscription::{
  BoxSubscription, ClosedSubscription, DynamicSubscriptions, Subscription,
};

mod current_value;
mod passthrough;
pub use current_value::CurrentValueSubject;
pub use passthrough::PassthroughSubject;

pub(crate) enum SubjectEvent<Item, Err> {
  Value(Item),
  Terminal(Completion<Err>),
}

struct SubjectSlot<Item, Err> {
  subscriber: Option<BoxSubscriber<Item, Err>>,
  demand: Demand,
  // Value waiting for demand: the current-value priming, or a conflated
  // newer send that arrived while the primed one was still undelivered.
  pending: Option<Item>,
}

pub(crate) struct SubjectCore<Item, Err> {
  slots: DynamicSubscriptions<SubjectSlot<Item, Err>>,
  upstream: DynamicSubscriptions<BoxSubscription>,
  backlog: VecDeque<SubjectEvent<Item, Err>>,
  sending: bool,
  completion: Option<Completion<Err>>,
  conflate: bool,
}

impl<Item, Err> SubjectCore<Item, Err> {
  pub(crate) fn new(conflate: bool) -> MutRc<Self> {
    MutRc::own(SubjectCore {
      slots: DynamicSubscriptions::new(),
      upstream: DynamicSubscriptions::new(),
      backlog: VecDeque::new(),
      sending: false,
      completion: None,
      conflate,
    })
  }
}

/// Queue an event and run the fan-out unless one is already running.
pub(crate) fn send_event<Item, Err>(
  core: &MutRc<SubjectCore<Item, Err>>,
  event: SubjectEvent<Item, Err>,
) where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  {
    let mut c = core.rc_deref_mut();
    if c.completion.is_some() {
      return;
    }
    c.backlog.push_back(event);
  }
  pump(core);
}

/// Register an upstream feed driving this subject (the subject's
/// `Subscriber` side).
pub(crate) fn feed_from<Item, Err>(
  core: &MutRc<SubjectCore<Item, Err>>,
  mut subscription: BoxSubscription,
) {
  {
    let mut c = core.rc_deref_mut();
    if c.completion.is_none() {
      c.upstream.add(subscription);
      return;
    }
  }
  subscription.cancel();
}

enum Placed<Item, Err> {
  Stored,
  Closed(Completion<Err>, BoxSubscriber<Item, Err>),
  Gone,
}

/// Add a subscriber slot, hand it its subscription, and prime it with an
/// optional initial value. A subject that already completed replays the
/// stored completion immediately.
pub(crate) fn register<Item, Err>(
  core: &MutRc<SubjectCore<Item, Err>>,
  mut subscriber: BoxSubscriber<Item, Err>,
  primed: Option<Item>,
) where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  let closed = core.rc_deref().completion.clone();
  if let Some(completion) = closed {
    subscriber.receive_subscription(Box::new(ClosedSubscription));
    subscriber.receive_completion(completion);
    return;
  }
  let id = {
    let mut c = core.rc_deref_mut();
    let id = c.slots.reserve_id();
    c.slots.insert(
      id,
      SubjectSlot { subscriber: None, demand: Demand::NONE, pending: primed },
    );
    id
  };
  // Demand requested from inside receive_subscription lands in the slot's
  // ledger; delivery starts once the subscriber is stored below.
  subscriber.receive_subscription(Box::new(SubjectSubscription { core: core.clone(), id }));
  let placed = {
    let mut c = core.rc_deref_mut();
    if let Some(completion) = c.completion.clone() {
      Placed::Closed(completion, subscriber)
    } else if let Some(slot) = c.slots.get_mut(id) {
      slot.subscriber = Some(subscriber);
      Placed::Stored
    } else {
      // Cancelled during the hand-off.
      Placed::Gone
    }
  };
  match placed {
    Placed::Stored => pump(core),
    Placed::Closed(completion, mut subscriber) => subscriber.receive_completion(completion),
    Placed::Gone => {}
  }
}

struct SubjectSubscription<Item, Err> {
  core: MutRc<SubjectCore<Item, Err>>,
  id: usize,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err>
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  fn request(&mut self, demand: Demand) {
    {
      let mut c = self.core.rc_deref_mut();
      match c.slots.get_mut(self.id) {
        Some(slot) => slot.demand += demand,
        None => return,
      }
    }
    pump(&self.core);
  }

  fn cancel(&mut self) {
    self.core.rc_deref_mut().slots.remove(self.id);
  }
}

fn pump<Item, Err>(core: &MutRc<SubjectCore<Item, Err>>)
where
  Item: Clone + 'static,
  Err: Clone + 'static,
{
  {
    let mut c = match core.try_rc_deref_mut() {
      Some(c) => c,
      // Re-entrant call from inside a delivery; the running pump continues.
      None => return,
    };
    if c.sending {
      return;
    }
    c.sending = true;
  }
  loop {
    flush_pending(core);
    let event = {
      let mut c = core.rc_deref_mut();
      match c.backlog.pop_front() {
        Some(event) => event,
        None => {
          c.sending = false;
          return;
        }
      }
    };
    match event {
      SubjectEvent::Value(value) => broadcast_value(core, value),
      SubjectEvent::Terminal(completion) => {
        broadcast_completion(core, completion);
        core.rc_deref_mut().sending = false;
        return;
      }
    }
  }
}

/// Deliver primed/conflated values to any slot that now has demand.
fn flush_pending<Item, Err>(core: &MutRc<SubjectCore<Item, Err>>) {
  loop {
    let ready = {
      let mut c = core.rc_deref_mut();
      let mut ready = None;
      for id in c.slots.ids() {
        if let Some(slot) = c.slots.get_mut(id) {
          if slot.pending.is_some() && slot.demand.has_any() && slot.subscriber.is_some() {
            slot.demand = slot.demand.decrement();
            if let (Some(value), Some(subscriber)) =
              (slot.pending.take(), slot.subscriber.take())
            {
              ready = Some((id, value, subscriber));
            }
            break;
          }
        }
      }
      ready
    };
    let (id, value, mut subscriber) = match ready {
      Some(ready) => ready,
      None => return,
    };
    let more = subscriber.receive(value);
    let mut c = core.rc_deref_mut();
    if let Some(slot) = c.slots.get_mut(id) {
      slot.demand += more;
      slot.subscriber = Some(subscriber);
    }
  }
}

fn broadcast_value<Item, Err>(core: &MutRc<SubjectCore<Item, Err>>, value: Item)
where
  Item: Clone,
{
  let ids = core.rc_deref().slots.ids();
  if ids.is_empty() {
    // Zero subscribers: the value is silently dropped.
    return;
  }
  let last = ids.len() - 1;
  let mut value = Some(value);
  for (i, id) in ids.into_iter().enumerate() {
    // The final slot takes the original; everyone before it a clone.
    let value = if i == last { value.take() } else { value.clone() };
    if let Some(value) = value {
      deliver_to_slot(core, id, value);
    }
  }
}

fn deliver_to_slot<Item, Err>(core: &MutRc<SubjectCore<Item, Err>>, id: usize, value: Item) {
  let subscriber = {
    let mut c = core.rc_deref_mut();
    let conflate = c.conflate;
    match c.slots.get_mut(id) {
      None => return,
      Some(slot) => {
        let ready =
          slot.demand.has_any() && slot.subscriber.is_some() && slot.pending.is_none();
        if !ready {
          if conflate {
            // Overwrite any undelivered value; only the latest matters.
            slot.pending = Some(value);
          }
          return;
        }
        slot.demand = slot.demand.decrement();
        match slot.subscriber.take() {
          Some(subscriber) => subscriber,
          None => return,
        }
      }
    }
  };
  let mut subscriber = subscriber;
  let more = subscriber.receive(value);
  let mut c = core.rc_deref_mut();
  if let Some(slot) = c.slots.get_mut(id) {
    slot.demand += more;
    slot.subscriber = Some(subscriber);
  }
}

fn broadcast_completion<Item, Err>(
  core: &MutRc<SubjectCore<Item, Err>>,
  completion: Completion<Err>,
) where
  Err: Clone,
{
  let (slots, upstreams) = {
    let mut c = core.rc_deref_mut();
    c.completion = Some(completion.clone());
    c.backlog.clear();
    (c.slots.take_all(), c.upstream.take_all())
  };
  for mut link in upstreams {
    link.cancel();
  }
  for mut slot in slots {
    if let Some(mut subscriber) = slot.subscriber.take() {
      subscriber.receive_completion(completion.clone());
    }
  }
}
