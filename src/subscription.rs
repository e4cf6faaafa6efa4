//! The handle a producer gives a consumer to request values or cancel.

use crate::demand::Demand;
use crate::rc::{MutRc, RcDerefMut};

mod dynamic;
pub use dynamic::DynamicSubscriptions;

/// Connects a subscriber back to the producer it is attached to.
///
/// `request` grants the producer permission to deliver up to `demand` more
/// values; grants accumulate. `cancel` tears the link down: it is idempotent,
/// safe to call after completion, and propagates upstream through any
/// operator chain so no further work happens on behalf of the subscriber.
/// Once a subscription is terminal (cancelled or completed) `request` is a
/// no-op.
pub trait Subscription {
  fn request(&mut self, demand: Demand);

  fn cancel(&mut self);
}

/// The type-erased subscription handed to [`Subscriber::receive_subscription`].
///
/// [`Subscriber::receive_subscription`]: crate::subscriber::Subscriber::receive_subscription
pub type BoxSubscription = Box<dyn Subscription>;

impl<T: ?Sized> Subscription for Box<T>
where
  T: Subscription,
{
  #[inline]
  fn request(&mut self, demand: Demand) { (**self).request(demand) }

  #[inline]
  fn cancel(&mut self) { (**self).cancel() }
}

impl<T> Subscription for MutRc<T>
where
  T: Subscription,
{
  #[inline]
  fn request(&mut self, demand: Demand) { self.rc_deref_mut().request(demand) }

  #[inline]
  fn cancel(&mut self) { self.rc_deref_mut().cancel() }
}

/// A subscription with nothing behind it.
///
/// Handed to subscribers that attach to an already-terminated publisher, so
/// the "subscription before completion" contract still holds.
#[derive(Clone, Copy, Default)]
pub struct ClosedSubscription;

impl Subscription for ClosedSubscription {
  #[inline]
  fn request(&mut self, _demand: Demand) {}

  #[inline]
  fn cancel(&mut self) {}
}

/// Ties two subscriptions together so cancellation reaches both.
///
/// Used where one downstream link fans out to a pair of upstream sources
/// (e.g. a gated operator listening to a trigger publisher). `request` only
/// reaches the primary side; the secondary is demand-less by construction.
pub struct PairSubscription<A, B> {
  primary: A,
  secondary: B,
}

impl<A, B> PairSubscription<A, B> {
  pub fn new(primary: A, secondary: B) -> Self { PairSubscription { primary, secondary } }
}

impl<A, B> Subscription for PairSubscription<A, B>
where
  A: Subscription,
  B: Subscription,
{
  #[inline]
  fn request(&mut self, demand: Demand) { self.primary.request(demand); }

  fn cancel(&mut self) {
    self.primary.cancel();
    self.secondary.cancel();
  }
}
