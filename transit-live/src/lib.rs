//! Live transit data client.
//!
//! Keeps local mirrors of server-owned routes, vehicles and stations in
//! step with the server, and streams arrivals at a station page by page
//! as the caller asks for them.
//!
//! - [`mirror`] merges a "last event" call with a live topic subscription
//!   into one continuously updated entity.
//! - [`timetable`] pages through `timetable.visits_*` results, one arrival
//!   at a time after an initial burst.
//! - [`connection`] is the transport seam; [`cache`] wraps it to cache
//!   idempotent calls.

pub mod cache;
pub mod config;
pub mod connection;
pub mod domain;
pub mod event;
pub mod mirror;
pub mod timetable;
