//! One-stop imports for working with the crate.

pub use crate::demand::Demand;
pub use crate::publisher::{
  empty, from_iter, of, repeat, BoxPublisher, FromIter, Publisher, PublisherExt,
};
pub use crate::subject::{CurrentValueSubject, PassthroughSubject};
pub use crate::subscriber::{BoxSubscriber, Cancellable, Completion, Subscriber};
pub use crate::subscription::{BoxSubscription, Subscription};
