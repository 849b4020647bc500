//! Connection error types.

/// Errors from the transport.
///
/// `Clone` so one delivery failure can fan out to every subscriber of a
/// topic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The connection has been closed; no further calls or deliveries.
    #[error("connection closed")]
    Closed,

    /// The peer does not register the procedure.
    #[error("no such procedure: {0}")]
    NoSuchProcedure(String),

    /// A call failed on the remote side or in transit.
    #[error("call to {procedure} failed: {message}")]
    Call { procedure: String, message: String },

    /// A single subscription delivery failed.
    #[error("delivery on {topic} failed: {message}")]
    Delivery { topic: String, message: String },

    /// A fixture file could not be loaded.
    #[error("fixture error: {0}")]
    Fixture(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(ConnectionError::Closed.to_string(), "connection closed");

        let err = ConnectionError::NoSuchProcedure("meta.last_event".into());
        assert_eq!(err.to_string(), "no such procedure: meta.last_event");

        let err = ConnectionError::Call {
            procedure: "timetable.visits_after".into(),
            message: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "call to timetable.visits_after failed: timeout"
        );

        let err = ConnectionError::Delivery {
            topic: "routes.4B".into(),
            message: "lagged".into(),
        };
        assert_eq!(err.to_string(), "delivery on routes.4B failed: lagged");
    }
}
