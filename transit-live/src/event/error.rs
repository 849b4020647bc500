//! Decode error types.

use crate::domain::TimeError;

/// A raw payload did not match its expected shape.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The topic payload is not an event envelope.
    #[error("malformed event envelope on {topic}: {source}")]
    Envelope {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    /// The envelope's body does not decode into the expected type.
    #[error("failed to decode {kind}: {source}")]
    Body {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A procedure result has the wrong structure.
    #[error("unexpected shape: {0}")]
    Shape(String),

    /// A timestamp field is malformed.
    #[error(transparent)]
    Time(#[from] TimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DecodeError::Shape("expected an array of size 4".into());
        assert_eq!(err.to_string(), "unexpected shape: expected an array of size 4");

        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = DecodeError::Body {
            kind: "routes",
            source,
        };
        assert!(err.to_string().starts_with("failed to decode routes: "));
    }
}
