//! Domain types for mirrored transit entities.
//!
//! Identifiers are validated at construction. Entity attributes other than
//! the identifier are optional, because the same types describe both a
//! full record and a partial update.

mod entity;
mod id;
mod route;
mod station;
mod time;
mod vehicle;

pub use entity::Entity;
pub use id::{InvalidId, RouteCode, StopId, VehicleName};
pub use route::{Point, Route};
pub use station::Station;
pub use time::{TIMESTAMP_FORMAT, TimeError, format_timestamp, parse_timestamp};
pub use vehicle::Vehicle;
