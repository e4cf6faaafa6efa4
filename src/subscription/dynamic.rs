use smallvec::SmallVec;

/// A container for managing multiple subscriptions with ID-based tracking.
///
/// Operator nodes that juggle several upstream links at once (merge, zip,
/// flat_map, switch_to_latest) store them here so an individual link can be
/// detached when its side completes, or all links cancelled together when
/// the downstream cancels.
///
/// Uses `SmallVec<[_; 2]>` so the common two-upstream case stays off the
/// heap.
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  /// Create an empty container.
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an item and return its unique ID.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, item));
    id
  }

  /// Reserve the next ID without adding an item.
  ///
  /// Use this with `insert()` when the ID is needed before the item exists,
  /// e.g. an inner subscriber that must know its own ID before subscribing.
  #[inline]
  pub fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  /// Insert an item with a pre-reserved ID.
  #[inline]
  pub fn insert(&mut self, id: usize, item: U) { self.items.push((id, item)); }

  /// Remove an item by ID.
  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  /// Check if an ID exists in the container.
  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  /// Mutable access to one item by ID.
  pub fn get_mut(&mut self, id: usize) -> Option<&mut U> {
    self.items.iter_mut().find(|(i, _)| *i == id).map(|(_, item)| item)
  }

  /// Snapshot of the live IDs, in registration order.
  pub fn ids(&self) -> SmallVec<[usize; 2]> { self.items.iter().map(|(id, _)| *id).collect() }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Move everything out, leaving the container empty but keeping the ID
  /// counter. Lets callers cancel links without holding a borrow of the
  /// container's owner.
  pub fn take_all(&mut self) -> SmallVec<[U; 2]> {
    self.items.drain(..).map(|(_, item)| item).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_remove_round_trip() {
    let mut subs: DynamicSubscriptions<&str> = DynamicSubscriptions::new();
    let a = subs.add("a");
    let b = subs.add("b");
    assert_ne!(a, b);
    assert_eq!(subs.len(), 2);

    assert_eq!(subs.remove(a), Some("a"));
    assert!(!subs.contains(a));
    assert!(subs.contains(b));
    assert_eq!(subs.len(), 1);
  }

  #[test]
  fn reserved_ids_stay_unique() {
    let mut subs: DynamicSubscriptions<()> = DynamicSubscriptions::new();
    let reserved = subs.reserve_id();
    let added = subs.add(());
    assert_ne!(reserved, added);
    subs.insert(reserved, ());
    assert_eq!(subs.len(), 2);
  }
}
