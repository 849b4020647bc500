//! Vehicles.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, overwrite};
use super::id::{RouteCode, StopId, VehicleName};
use super::route::Point;

/// A vehicle in service.
///
/// Every attribute besides the name is optional: a freshly opened mirror
/// knows nothing but the name, and updates carry only what changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub name: VehicleName,
    pub code: Option<i64>,
    pub position: Option<Point>,
    pub capacity: Option<u32>,
    pub onboard: Option<u32>,
    /// Fraction of capacity in use.
    pub saturation: Option<f64>,
    pub last_station: Option<StopId>,
    pub next_station: Option<StopId>,
    pub route: Option<RouteCode>,
    /// Seconds ahead (negative) or behind (positive) schedule.
    pub schedule_delta: Option<f64>,
    /// Compass heading in degrees.
    pub heading: Option<f64>,
    pub speed: Option<f64>,
}

impl Entity for Vehicle {
    type Id = VehicleName;

    const KIND: &'static str = "vehicles";

    fn id(&self) -> &VehicleName {
        &self.name
    }

    fn unknown(name: VehicleName) -> Self {
        Self {
            name,
            code: None,
            position: None,
            capacity: None,
            onboard: None,
            saturation: None,
            last_station: None,
            next_station: None,
            route: None,
            schedule_delta: None,
            heading: None,
            speed: None,
        }
    }

    fn merge(&mut self, update: &Self) {
        overwrite(&mut self.code, &update.code);
        overwrite(&mut self.position, &update.position);
        overwrite(&mut self.capacity, &update.capacity);
        overwrite(&mut self.onboard, &update.onboard);
        overwrite(&mut self.saturation, &update.saturation);
        overwrite(&mut self.last_station, &update.last_station);
        overwrite(&mut self.next_station, &update.next_station);
        overwrite(&mut self.route, &update.route);
        overwrite(&mut self.schedule_delta, &update.schedule_delta);
        overwrite(&mut self.heading, &update.heading);
        overwrite(&mut self.speed, &update.speed);
    }
}
