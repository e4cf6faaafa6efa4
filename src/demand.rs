//! Demand: how many values a consumer has authorized a producer to deliver.

use std::ops::{Add, AddAssign};

/// The number of values a subscriber is willing to accept.
///
/// `Demand` is an immutable value type. Arithmetic saturates: adding to
/// [`Demand::Unlimited`] stays unlimited, and decrementing never underflows.
///
/// The derived ordering ranks `Max(a) < Max(b)` for `a < b`, and any finite
/// demand below `Unlimited`.
///
/// # Example
///
/// ```
/// use ripple::prelude::*;
///
/// let d = Demand::max(2) + Demand::max(3);
/// assert_eq!(d, Demand::max(5));
/// assert_eq!(d + Demand::Unlimited, Demand::Unlimited);
/// assert!(!Demand::NONE.has_any());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Demand {
  /// Accept at most this many values.
  Max(usize),
  /// Accept values as fast as the producer can deliver them.
  Unlimited,
}

impl Demand {
  /// Zero demand: deliver nothing until more is requested.
  pub const NONE: Demand = Demand::Max(0);

  /// A finite demand of `count` values.
  #[inline]
  pub fn max(count: usize) -> Demand { Demand::Max(count) }

  /// Whether at least one more value may be delivered.
  #[inline]
  pub fn has_any(self) -> bool { !matches!(self, Demand::Max(0)) }

  #[inline]
  pub fn is_unlimited(self) -> bool { matches!(self, Demand::Unlimited) }

  /// Saturating addition. `Unlimited` absorbs any addend.
  #[inline]
  pub fn saturating_add(self, rhs: Demand) -> Demand {
    match (self, rhs) {
      (Demand::Max(a), Demand::Max(b)) => Demand::Max(a.saturating_add(b)),
      _ => Demand::Unlimited,
    }
  }

  /// Consume one unit of demand. `Unlimited` stays unlimited and zero stays
  /// zero.
  #[inline]
  pub fn decrement(self) -> Demand {
    match self {
      Demand::Max(n) => Demand::Max(n.saturating_sub(1)),
      Demand::Unlimited => Demand::Unlimited,
    }
  }
}

impl Add for Demand {
  type Output = Demand;

  #[inline]
  fn add(self, rhs: Demand) -> Demand { self.saturating_add(rhs) }
}

impl AddAssign for Demand {
  #[inline]
  fn add_assign(&mut self, rhs: Demand) { *self = self.saturating_add(rhs); }
}

impl Default for Demand {
  #[inline]
  fn default() -> Self { Demand::NONE }
}
