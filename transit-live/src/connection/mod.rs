//! Transport abstraction.
//!
//! The engine talks to the server through two primitives: a one-shot
//! remote procedure `call`, and a durable `subscribe` to a topic. Both
//! carry untyped JSON values; typing them is the event decoder's job.
//!
//! The real transport lives outside this crate. [`MockConnection`] is an
//! in-memory implementation for tests and the demo binary.

mod error;
mod mock;

use std::future::Future;
use std::sync::Arc;

use futures::stream::BoxStream;
use serde_json::Value;

pub use error::ConnectionError;
pub use mock::{MockConnection, RecordedCall};

/// Live feed of raw events delivered on a topic.
///
/// The feed never completes while the connection is open. Individual
/// deliveries may fail without ending the feed.
pub type EventFeed = BoxStream<'static, Result<Value, ConnectionError>>;

/// A connection to the server.
///
/// Implementations must be safe for concurrent `call` and `subscribe` use;
/// one instance is shared by every mirror and timetable query.
pub trait Connection: Send + Sync + 'static {
    /// Call a remote procedure with positional arguments.
    fn call(
        &self,
        procedure: &str,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<Value, ConnectionError>> + Send;

    /// Subscribe to every future event published on `topic`.
    ///
    /// Dropping the returned feed ends the subscription.
    fn subscribe(&self, topic: &str) -> EventFeed;
}

impl<C: Connection> Connection for Arc<C> {
    fn call(
        &self,
        procedure: &str,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<Value, ConnectionError>> + Send {
        (**self).call(procedure, args)
    }

    fn subscribe(&self, topic: &str) -> EventFeed {
        (**self).subscribe(topic)
    }
}
