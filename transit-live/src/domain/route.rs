//! Routes and their geometry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{Entity, overwrite};
use super::id::RouteCode;
use super::station::Station;
use super::vehicle::Vehicle;

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub long: f64,
}

/// A transit route.
///
/// Routes carry the vehicles currently serving them. Vehicle updates are
/// published on the route's topic as `vehicle_update` events and replace
/// the matching vehicle in place (see [`Entity::replace_related`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub code: RouteCode,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub description: Option<String>,
    /// Display color as a hex string, e.g. `"#C28E0E"`.
    pub color: Option<String>,
    pub path: Option<Vec<Point>>,
    pub stations: Option<Vec<Station>>,
    pub vehicles: Option<Vec<Vehicle>>,
}

impl Route {
    /// Stations served by the route, empty if unknown.
    pub fn stations(&self) -> &[Station] {
        self.stations.as_deref().unwrap_or(&[])
    }

    /// Vehicles serving the route, empty if unknown.
    pub fn vehicles(&self) -> &[Vehicle] {
        self.vehicles.as_deref().unwrap_or(&[])
    }
}

impl Entity for Route {
    type Id = RouteCode;

    const KIND: &'static str = "routes";
    const RELATED_EVENT: Option<&'static str> = Some("vehicle_update");

    fn id(&self) -> &RouteCode {
        &self.code
    }

    fn unknown(code: RouteCode) -> Self {
        Self {
            code,
            name: None,
            short_name: None,
            description: None,
            color: None,
            path: None,
            stations: None,
            vehicles: None,
        }
    }

    fn merge(&mut self, update: &Self) {
        overwrite(&mut self.name, &update.name);
        overwrite(&mut self.short_name, &update.short_name);
        overwrite(&mut self.description, &update.description);
        overwrite(&mut self.color, &update.color);
        overwrite(&mut self.path, &update.path);
        overwrite(&mut self.stations, &update.stations);
        overwrite(&mut self.vehicles, &update.vehicles);
    }

    /// Replace every held vehicle whose name matches the updated vehicle.
    ///
    /// Matching is by name only. Vehicles that do not match are untouched,
    /// and an update for a vehicle the route does not hold is ignored.
    fn replace_related(&mut self, payload: &Value) -> Result<usize, serde_json::Error> {
        let updated = Vehicle::deserialize(payload)?;
        let Some(vehicles) = self.vehicles.as_mut() else {
            return Ok(0);
        };

        let mut replaced = 0;
        for vehicle in vehicles.iter_mut().filter(|v| v.name == updated.name) {
            *vehicle = updated.clone();
            replaced += 1;
        }
        Ok(replaced)
    }
}
