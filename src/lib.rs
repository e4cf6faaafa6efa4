//! # ripple: demand-driven reactive streams
//!
//! A single-threaded [`Publisher`]/[`Subscriber`] engine with
//! consumer-controlled backpressure: a source never delivers more values
//! than the subscriber has cumulatively requested.
//!
//! A [`Publisher`] is a lazy description of a value sequence; subscribing
//! starts the flow. A [`Subscriber`] consumes a subscription, values, and a
//! terminal [`Completion`]. [`Demand`] counts how many more values the
//! subscriber will accept, and the [`Subscription`] handle requests demand
//! or cancels the flow. [`PassthroughSubject`] and [`CurrentValueSubject`]
//! are imperative entry points that broadcast to many subscribers.
//!
//! ```rust
//! use ripple::prelude::*;
//!
//! from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .sink(|v| println!("Value: {}", v));
//! ```
//!
//! [`Publisher`]: publisher::Publisher
//! [`Subscriber`]: subscriber::Subscriber
//! [`Demand`]: demand::Demand
//! [`Subscription`]: subscription::Subscription
//! [`Completion`]: subscriber::Completion
//! [`PassthroughSubject`]: subject::PassthroughSubject
//! [`CurrentValueSubject`]: subject::CurrentValueSubject

pub mod demand;
pub mod ops;
pub mod prelude;
pub mod publisher;
pub mod rc;
pub(crate) mod relay;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;
