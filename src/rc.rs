use std::{
  cell::{Ref, RefCell, RefMut},
  rc::Rc,
};

/// Immutable access to a shared cell.
pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a>;
}

/// Mutable access to a shared cell.
pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a>;

  /// Non-panicking variant: `None` while the cell is already borrowed. Used
  /// by delivery loops to detect re-entrancy instead of aborting.
  #[allow(clippy::needless_lifetimes)]
  fn try_rc_deref_mut<'a>(&'a self) -> Option<Self::Target<'a>>;
}

/// Shared mutable state for the single-threaded engine.
///
/// Every node that must be reachable from both ends of a subscription (the
/// producer delivering values and the consumer requesting or cancelling)
/// lives behind one of these. Exclusive access per call is the
/// synchronization boundary; delivery loops release the borrow before
/// invoking user callbacks so that re-entrant `request`/`cancel` calls stay
/// legal.
#[derive(Default, Debug)]
pub struct MutRc<T>(Rc<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }
}

impl<T> RcDeref for MutRc<T> {
  type Target<'a>
    = Ref<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a> { self.0.borrow() }
}

impl<T> RcDerefMut for MutRc<T> {
  type Target<'a>
    = RefMut<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a> { self.0.borrow_mut() }

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn try_rc_deref_mut<'a>(&'a self) -> Option<Self::Target<'a>> { self.0.try_borrow_mut().ok() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shared_mutation_is_visible_through_clones() {
    let a = MutRc::own(0);
    let b = a.clone();
    *a.rc_deref_mut() += 5;
    assert_eq!(*b.rc_deref(), 5);
  }

  #[test]
  fn try_deref_detects_outstanding_borrow() {
    let cell = MutRc::own(1);
    let guard = cell.rc_deref_mut();
    assert!(cell.try_rc_deref_mut().is_none());
    drop(guard);
    assert!(cell.try_rc_deref_mut().is_some());
  }
}
