//! Out-of-band sinks for events and errors a mirror does not absorb.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::Entity;
use crate::event::RawEvent;

use super::error::MirrorError;

/// Receives what a mirror cannot apply to its own state.
///
/// A mirror's value stream never fails. Events it does not understand and
/// failures that outlast the retry policy go here instead.
pub trait Delegate<E: Entity>: Send + Sync + 'static {
    /// An event on the mirror's topic that does not describe the entity.
    fn unhandled_event(&self, id: &E::Id, event: RawEvent);

    /// A failure that survived every retry.
    fn error(&self, id: &E::Id, error: MirrorError);
}

/// Delegate that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelegate;

impl<E: Entity> Delegate<E> for LogDelegate {
    fn unhandled_event(&self, id: &E::Id, event: RawEvent) {
        debug!(
            kind = E::KIND,
            id = %id,
            event = %event.event,
            "ignoring unhandled event"
        );
    }

    fn error(&self, id: &E::Id, error: MirrorError) {
        warn!(kind = E::KIND, id = %id, error = %error, "mirror update failed");
    }
}

/// What a mirror handed to its delegate.
#[derive(Debug)]
pub enum Report<E: Entity> {
    Unhandled { id: E::Id, event: RawEvent },
    Error { id: E::Id, error: MirrorError },
}

/// Forward reports over a channel. Reports are dropped once the receiver
/// is gone.
impl<E: Entity> Delegate<E> for mpsc::UnboundedSender<Report<E>> {
    fn unhandled_event(&self, id: &E::Id, event: RawEvent) {
        let _ = self.send(Report::Unhandled {
            id: id.clone(),
            event,
        });
    }

    fn error(&self, id: &E::Id, error: MirrorError) {
        let _ = self.send(Report::Error {
            id: id.clone(),
            error,
        });
    }
}
