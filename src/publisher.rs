//! Publisher trait and the combinator extension surface.

use std::convert::Infallible;
use std::marker::PhantomData;

use crate::ops::{
  collect::CollectOp,
  combine_latest::CombineLatestOp,
  compact_map::CompactMapOp,
  concat::{AppendOp, ConcatOp, PrependOp},
  drop_first::DropFirstOp,
  drop_until_output_from::DropUntilOutputFromOp,
  drop_while::DropWhileOp,
  filter::FilterOp,
  first::{FirstOp, FirstWhereOp},
  flat_map::FlatMapOp,
  ignore_output::IgnoreOutputOp,
  last::{LastOp, LastWhereOp},
  map::MapOp,
  merge::MergeOp,
  prefix::PrefixOp,
  remove_duplicates::RemoveDuplicatesOp,
  replace_empty::ReplaceEmptyOp,
  replace_nil::ReplaceNilOp,
  scan::ScanOp,
  set_failure_type::SetFailureTypeOp,
  switch_to_latest::SwitchToLatestOp,
  zip::ZipOp,
};
use crate::subscriber::{Cancellable, SinkSubscriber, Subscriber};

mod boxed;
mod from_iter;
pub use boxed::BoxPublisher;
pub use from_iter::{empty, from_iter, of, repeat, FromIter};

/// A lazy description of a sequence of values delivered under
/// consumer-controlled backpressure.
///
/// Subscribing consumes the publisher value; cloneable publishers (subjects,
/// sources over cloneable iterators) can be subscribed repeatedly via
/// `clone()`. The publisher constructs a subscription, hands it to the
/// subscriber exactly once before any value, and from then on never delivers
/// more values than the subscriber has cumulatively requested.
pub trait Publisher {
  type Output;
  type Failure;

  fn subscribe<S>(self, subscriber: S)
  where
    Self: Sized,
    S: Subscriber<Input = Self::Output, Failure = Self::Failure> + 'static;
}

/// Operator combinators, available on every publisher.
///
/// Each method wraps `self` in an operator node; nothing runs until the
/// resulting publisher is subscribed.
pub trait PublisherExt: Publisher + Sized {
  /// Transform each value 1:1. Failures pass through unchanged.
  fn map<B, F>(self, func: F) -> MapOp<Self, F, B>
  where
    F: FnMut(Self::Output) -> B,
  {
    MapOp { source: self, func, _marker: PhantomData }
  }

  /// Emit only the values for which `predicate` holds. Dropping a value does
  /// not consume downstream demand; one replacement unit is re-requested
  /// upstream instead.
  fn filter<F>(self, predicate: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Self::Output) -> bool,
  {
    FilterOp { source: self, predicate }
  }

  /// Transform each value and drop those for which `func` yields `None`.
  fn compact_map<B, F>(self, func: F) -> CompactMapOp<Self, F, B>
  where
    F: FnMut(Self::Output) -> Option<B>,
  {
    CompactMapOp { source: self, func, _marker: PhantomData }
  }

  /// Emit the running accumulation of `func` over the stream, starting from
  /// `seed`. One output per input.
  fn scan<B, F>(self, seed: B, func: F) -> ScanOp<Self, F, B>
  where
    B: Clone,
    F: FnMut(B, Self::Output) -> B,
  {
    ScanOp { source: self, func, seed }
  }

  /// Drop values equal to their immediate predecessor.
  fn remove_duplicates(self) -> RemoveDuplicatesOp<Self>
  where
    Self::Output: PartialEq + Clone,
  {
    RemoveDuplicatesOp { source: self }
  }

  /// Gather every value into one `Vec`, emitted on upstream completion.
  fn collect(self) -> CollectOp<Self> { CollectOp { source: self, count: None } }

  /// Gather values into `Vec`s of `count` elements; a final partial buffer
  /// is emitted on completion.
  fn collect_count(self, count: usize) -> CollectOp<Self> {
    CollectOp { source: self, count: Some(count) }
  }

  /// Replace `None` values with a default, unwrapping the `Option`.
  fn replace_nil<T>(self, default: T) -> ReplaceNilOp<Self, T>
  where
    Self: Publisher<Output = Option<T>>,
    T: Clone,
  {
    ReplaceNilOp { source: self, default }
  }

  /// Emit `default` if the upstream completes without producing any value.
  fn replace_empty(self, default: Self::Output) -> ReplaceEmptyOp<Self> {
    ReplaceEmptyOp { source: self, default }
  }

  /// Suppress all values; only the terminal signal passes through.
  fn ignore_output(self) -> IgnoreOutputOp<Self> { IgnoreOutputOp { source: self } }

  /// Suppress the first `count` values.
  fn drop_first(self, count: usize) -> DropFirstOp<Self> {
    DropFirstOp { source: self, count }
  }

  /// Suppress the leading values for which `predicate` holds. Once it fails
  /// once, every later value passes, even if the predicate would hold again.
  fn drop_while<F>(self, predicate: F) -> DropWhileOp<Self, F>
  where
    F: FnMut(&Self::Output) -> bool,
  {
    DropWhileOp { source: self, predicate }
  }

  /// Suppress values until `trigger` produces its first value, then cancel
  /// the trigger and let everything through.
  fn drop_until_output_from<T>(self, trigger: T) -> DropUntilOutputFromOp<Self, T>
  where
    T: Publisher<Failure = Self::Failure>,
  {
    DropUntilOutputFromOp { source: self, trigger }
  }

  /// Emit only the first `count` values, then complete and cancel upstream.
  fn prefix(self, count: usize) -> PrefixOp<Self> { PrefixOp::new(self, count) }

  /// Emit the first value, then complete and cancel upstream.
  fn first(self) -> FirstOp<Self> { PrefixOp::new(self, 1) }

  /// Emit the first value matching `predicate`, then complete and cancel
  /// upstream.
  fn first_where<F>(self, predicate: F) -> FirstWhereOp<Self, F>
  where
    F: FnMut(&Self::Output) -> bool,
  {
    PrefixOp::new(self.filter(predicate), 1)
  }

  /// Emit the final value once the upstream completes.
  fn last(self) -> LastOp<Self> { LastOp { source: self } }

  /// Emit the final value matching `predicate` once the upstream completes.
  fn last_where<F>(self, predicate: F) -> LastWhereOp<Self, F>
  where
    F: FnMut(&Self::Output) -> bool,
  {
    LastOp { source: self.filter(predicate) }
  }

  /// Splice the values of `iter` strictly before this publisher's values.
  fn prepend<I>(self, iter: I) -> PrependOp<Self, I>
  where
    I: IntoIterator<Item = Self::Output>,
    I::IntoIter: 'static,
    Self::Output: 'static,
  {
    ConcatOp { first: from_iter(iter).set_failure_type(), second: self }
  }

  /// Run `publisher` to completion first, then this publisher.
  fn prepend_publisher<P>(self, publisher: P) -> ConcatOp<P, Self>
  where
    P: Publisher<Output = Self::Output, Failure = Self::Failure>,
  {
    ConcatOp { first: publisher, second: self }
  }

  /// Splice the values of `iter` strictly after this publisher completes.
  fn append<I>(self, iter: I) -> AppendOp<Self, I>
  where
    I: IntoIterator<Item = Self::Output>,
    I::IntoIter: 'static,
    Self::Output: 'static,
  {
    ConcatOp { first: self, second: from_iter(iter).set_failure_type() }
  }

  /// Run this publisher to completion, then `publisher`.
  fn append_publisher<P>(self, publisher: P) -> ConcatOp<Self, P>
  where
    P: Publisher<Output = Self::Output, Failure = Self::Failure>,
  {
    ConcatOp { first: self, second: publisher }
  }

  /// Interleave values from both publishers in arrival order. Completes once
  /// both complete; the first failure wins and cancels the other side.
  fn merge<P>(self, other: P) -> MergeOp<Self, P>
  where
    P: Publisher<Output = Self::Output, Failure = Self::Failure>,
  {
    MergeOp { a: self, b: other }
  }

  /// Pair values index-by-index. Unmatched values are buffered per side;
  /// completes when an exhausted side's buffer drains.
  fn zip<P>(self, other: P) -> ZipOp<Self, P>
  where
    P: Publisher<Failure = Self::Failure>,
  {
    ZipOp { a: self, b: other }
  }

  /// Emit the latest pair on every update from either side, once both have
  /// produced at least one value.
  fn combine_latest<P>(self, other: P) -> CombineLatestOp<Self, P>
  where
    Self::Output: Clone,
    P: Publisher<Failure = Self::Failure>,
    P::Output: Clone,
  {
    CombineLatestOp { a: self, b: other }
  }

  /// Flatten a publisher of publishers by always following the most recently
  /// emitted inner publisher; values from abandoned inners are dropped.
  fn switch_to_latest(self) -> SwitchToLatestOp<Self>
  where
    Self::Output: Publisher,
  {
    SwitchToLatestOp { source: self }
  }

  /// Map each value to an inner publisher and interleave all inner values
  /// into one stream.
  fn flat_map<P, F>(self, func: F) -> FlatMapOp<Self, F, P>
  where
    F: FnMut(Self::Output) -> P,
    P: Publisher<Failure = Self::Failure>,
  {
    FlatMapOp { source: self, func, _marker: PhantomData }
  }

  /// Re-type a never-failing publisher with an arbitrary failure type so it
  /// composes with failing chains.
  fn set_failure_type<E>(self) -> SetFailureTypeOp<Self, E>
  where
    Self: Publisher<Failure = Infallible>,
  {
    SetFailureTypeOp::new(self)
  }

  /// Erase the concrete publisher type.
  fn boxed(self) -> BoxPublisher<Self::Output, Self::Failure>
  where
    Self: 'static,
    Self::Output: 'static,
    Self::Failure: 'static,
  {
    BoxPublisher::new(self)
  }

  /// Attach a consumer with unlimited demand to a never-failing publisher.
  /// Returns a handle that cancels the attachment.
  fn sink<N>(self, next: N) -> Cancellable
  where
    Self: Publisher<Failure = Infallible>,
    N: FnMut(Self::Output) + 'static,
    Self::Output: 'static,
  {
    let (subscriber, handle) = SinkSubscriber::new(next, |_err: Infallible| {}, || {});
    self.subscribe(subscriber);
    handle
  }

  /// Attach a consumer with unlimited demand and explicit error/completion
  /// handlers.
  fn sink_all<N, E, C>(self, next: N, error: E, complete: C) -> Cancellable
  where
    N: FnMut(Self::Output) + 'static,
    E: FnMut(Self::Failure) + 'static,
    C: FnMut() + 'static,
    Self::Output: 'static,
    Self::Failure: 'static,
  {
    let (subscriber, handle) = SinkSubscriber::new(next, error, complete);
    self.subscribe(subscriber);
    handle
  }
}

impl<P: Publisher> PublisherExt for P {}
