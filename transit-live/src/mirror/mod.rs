//! Entity mirrors.
//!
//! A [`Mirror`] keeps a local copy of one route, vehicle or station in step
//! with the server by merging a one-shot "last event" call with the live
//! subscription on the entity's topic.
//!
//! Lifecycle: opening subscribes and issues the snapshot call at once, and
//! the mirror is live from then on. Failures are retried by resubscribing
//! up to [`MirrorConfig::retry_attempts`] times in a row; the next failure
//! goes to the [`Delegate`] and the mirror carries on with its current
//! subscription. Observers of the state never see an error.

mod cell;
mod config;
mod delegate;
mod error;
mod live;
mod pipeline;


pub use cell::{Dispatch, MirrorCell, MirrorState};
pub use config::{DEFAULT_RETRY_ATTEMPTS, MirrorConfig};
pub use delegate::{Delegate, LogDelegate, Report};
pub use error::MirrorError;
pub use live::Mirror;
pub use pipeline::LAST_EVENT_PROCEDURE;
