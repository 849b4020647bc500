//! Arrivals and the wire records they are decoded from.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Entity, Route, parse_timestamp};
use crate::event::DecodeError;
use crate::mirror::Mirror;

/// A vehicle on some route arriving at a station.
#[derive(Debug, Clone)]
pub struct Arrival {
    pub eta: NaiveDateTime,
    pub etd: NaiveDateTime,
    /// Live mirror of the route the arriving vehicle serves.
    pub route: Mirror<Route>,
    /// Direction label, e.g. `"Purdue West"`.
    pub heading: Option<String>,
}

/// One decoded timetable record, before its route is mirrored.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Response {
    pub(crate) route: Route,
    pub(crate) heading: Option<String>,
    pub(crate) eta: NaiveDateTime,
    pub(crate) etd: NaiveDateTime,
}

impl Response {
    /// Decode a `[route, heading, eta, etd]` record.
    pub(crate) fn decode(record: &Value) -> Result<Self, DecodeError> {
        let fields = match record.as_array() {
            Some(fields) if fields.len() == 4 => fields,
            _ => return Err(DecodeError::Shape("expected an array of size 4".into())),
        };

        let route = Route::deserialize(&fields[0]).map_err(|source| DecodeError::Body {
            kind: Route::KIND,
            source,
        })?;

        let heading = match &fields[1] {
            Value::Null => None,
            Value::String(heading) => Some(heading.clone()),
            other => {
                return Err(DecodeError::Shape(format!(
                    "expected a heading string or null, got {other}"
                )));
            }
        };

        Ok(Self {
            route,
            heading,
            eta: timestamp(&fields[2])?,
            etd: timestamp(&fields[3])?,
        })
    }

    /// Decode a whole result. `null` is an empty batch.
    pub(crate) fn decode_all(result: &Value) -> Result<Vec<Self>, DecodeError> {
        match result {
            Value::Null => Ok(Vec::new()),
            Value::Array(records) => records.iter().map(Self::decode).collect(),
            other => Err(DecodeError::Shape(format!(
                "expected an array of arrivals, got {other}"
            ))),
        }
    }
}

fn timestamp(value: &Value) -> Result<NaiveDateTime, DecodeError> {
    match value.as_str() {
        Some(s) => Ok(parse_timestamp(s)?),
        None => Err(DecodeError::Shape(format!(
            "expected a timestamp string, got {value}"
        ))),
    }
}
