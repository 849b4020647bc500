//! Timetable error types.

use crate::connection::ConnectionError;
use crate::event::DecodeError;

/// Failure fetching a page of arrivals.
#[derive(Debug, thiserror::Error)]
pub enum TimetableError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("malformed timetable response from {procedure}: {source}")]
    Decode {
        procedure: String,
        #[source]
        source: DecodeError,
    },
}

impl TimetableError {
    /// Whether the connection has gone away for good.
    pub fn is_closed(&self) -> bool {
        matches!(self, TimetableError::Connection(ConnectionError::Closed))
    }
}
