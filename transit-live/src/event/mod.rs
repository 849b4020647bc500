//! Event decoder.
//!
//! Turns raw topic payloads and "last event" results into typed
//! [`DomainEvent`]s for one entity kind.
//!
//! Topic payloads are envelopes naming the event and carrying a body:
//!
//! ```json
//! {"event": "update", "data": {"code": "4B", "color": "#C28E0E"}}
//! ```
//!
//! `snapshot` and `update` bodies decode into the entity itself. The
//! entity's related event (e.g. `vehicle_update` on a route topic) keeps
//! its body raw for [`Entity::replace_related`]. Anything else is passed
//! through as a [`RawEvent`].

mod error;

use serde::Deserialize;
use serde::de::Error as _;
use serde_json::Value;

use crate::domain::Entity;

pub use error::DecodeError;

/// Event name for a full record.
pub const SNAPSHOT_EVENT: &str = "snapshot";

/// Event name for a partial update.
pub const UPDATE_EVENT: &str = "update";

/// An event the decoder does not interpret.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub topic: String,
    pub event: String,
    pub data: Value,
}

/// A decoded event for entity kind `E`.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent<E> {
    /// Full record of the entity.
    Snapshot(E),
    /// Partial update of the entity.
    Update(E),
    /// Update of an entity nested inside this one.
    RelatedUpdate(Value),
    /// Any other event.
    Other(RawEvent),
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Decode a payload delivered on `topic`.
pub fn decode_topic_event<E: Entity>(
    topic: &str,
    payload: Value,
) -> Result<DomainEvent<E>, DecodeError> {
    // A sequence would otherwise deserialize into the envelope by position.
    if !payload.is_object() {
        return Err(DecodeError::Envelope {
            topic: topic.to_string(),
            source: serde_json::Error::custom(format!("expected an event object, got {payload}")),
        });
    }
    let envelope: Envelope =
        serde_json::from_value(payload).map_err(|source| DecodeError::Envelope {
            topic: topic.to_string(),
            source,
        })?;

    match envelope.event.as_str() {
        SNAPSHOT_EVENT => decode_body(envelope.data).map(DomainEvent::Snapshot),
        UPDATE_EVENT => decode_body(envelope.data).map(DomainEvent::Update),
        name if E::RELATED_EVENT == Some(name) => Ok(DomainEvent::RelatedUpdate(envelope.data)),
        _ => Ok(DomainEvent::Other(RawEvent {
            topic: topic.to_string(),
            event: envelope.event,
            data: envelope.data,
        })),
    }
}

/// Decode the result of a "last event" call on `topic`.
///
/// The result may be the entity itself, the last envelope published on the
/// topic, or either of those as the first element of an argument list.
/// `null` or an empty list means nothing has been published yet.
pub fn decode_last_event<E: Entity>(
    topic: &str,
    result: Value,
) -> Result<Option<DomainEvent<E>>, DecodeError> {
    let body = match result {
        Value::Array(mut args) => {
            if args.is_empty() {
                return Ok(None);
            }
            args.swap_remove(0)
        }
        other => other,
    };

    if body.is_null() {
        return Ok(None);
    }

    if is_envelope(&body) {
        return decode_topic_event(topic, body).map(Some);
    }

    decode_body(body).map(|entity| Some(DomainEvent::Snapshot(entity)))
}

fn is_envelope(value: &Value) -> bool {
    value.get("event").is_some_and(Value::is_string) && value.get("data").is_some()
}

fn decode_body<E: Entity>(data: Value) -> Result<E, DecodeError> {
    serde_json::from_value(data).map_err(|source| DecodeError::Body {
        kind: E::KIND,
        source,
    })
}
