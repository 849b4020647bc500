//! Stations.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, overwrite};
use super::id::{RouteCode, StopId};
use super::route::Point;

/// A station stop served by one or more routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub stop_id: StopId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub position: Option<Point>,
    pub routes: Option<Vec<RouteCode>>,
}

impl Entity for Station {
    type Id = StopId;

    const KIND: &'static str = "stations";

    fn id(&self) -> &StopId {
        &self.stop_id
    }

    fn unknown(stop_id: StopId) -> Self {
        Self {
            stop_id,
            name: None,
            description: None,
            position: None,
            routes: None,
        }
    }

    fn merge(&mut self, update: &Self) {
        overwrite(&mut self.name, &update.name);
        overwrite(&mut self.description, &update.description);
        overwrite(&mut self.position, &update.position);
        overwrite(&mut self.routes, &update.routes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_station() {
        let station: Station = serde_json::from_value(json!({
            "stop_id": "BUS215",
            "name": "Walmart (East Side)",
            "routes": ["4B", "10"],
        }))
        .unwrap();

        assert_eq!(station.stop_id.as_str(), "BUS215");
        assert_eq!(station.routes.as_ref().map(Vec::len), Some(2));
        assert_eq!(station.position, None);
    }

    #[test]
    fn missing_stop_id_is_an_error() {
        let result = serde_json::from_value::<Station>(json!({"name": "Nowhere"}));
        assert!(result.is_err());
    }

    #[test]
    fn topic_uses_kind_and_stop_id() {
        let station = Station::unknown(StopId::parse("BUS215").unwrap());
        assert_eq!(station.topic(), "stations.BUS215");
    }
}
