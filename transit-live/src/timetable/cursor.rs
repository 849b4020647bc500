//! Paging state of an arrival query.

use serde_json::Value;

use crate::domain::{RouteCode, StopId, format_timestamp};

use super::timing::Timing;

/// Prefix shared by every timetable procedure.
pub const PROCEDURE_PREFIX: &str = "timetable.visits_";

/// Where an arrival query will resume.
///
/// A cursor fully describes the next page to fetch, so it can be kept and
/// passed back to [`Timetable::page`](super::Timetable::page) later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub station: StopId,
    /// Only return arrivals on this route.
    pub route: Option<RouteCode>,
    pub timing: Timing,
    /// Maximum number of arrivals to return.
    pub count: usize,
}

impl Cursor {
    pub fn new(station: StopId, route: Option<RouteCode>, timing: Timing, count: usize) -> Self {
        Self {
            station,
            route,
            timing,
            count,
        }
    }

    /// Procedure answering this cursor, e.g. `timetable.visits_after_on_route`.
    pub fn procedure(&self) -> String {
        let suffix = if self.route.is_some() { "_on_route" } else { "" };
        format!("{PROCEDURE_PREFIX}{}{suffix}", self.timing.direction())
    }

    /// Call arguments: `[route?, station, timestamps.., count]`.
    pub fn args(&self) -> Vec<Value> {
        let mut args = Vec::with_capacity(5);
        if let Some(route) = &self.route {
            args.push(Value::from(route.as_str()));
        }
        args.push(Value::from(self.station.as_str()));
        args.extend(
            self.timing
                .bounds()
                .iter()
                .map(|t| Value::from(format_timestamp(t))),
        );
        args.push(Value::from(self.count));
        args
    }

    /// Cursor for the page after one containing arrivals at `etas`.
    pub(crate) fn advance<I>(&self, etas: I) -> Cursor
    where
        I: IntoIterator<Item = chrono::NaiveDateTime>,
    {
        Cursor {
            timing: self.timing.excluding_etas(etas),
            count: 1,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::json;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, 5)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn station() -> StopId {
        StopId::parse("BUS215").unwrap()
    }

    fn route() -> Option<RouteCode> {
        Some(RouteCode::parse("4B").unwrap())
    }

    #[test]
    fn procedure_names() {
        let cases = [
            (Timing::Before(at(9, 0, 0)), None, "timetable.visits_before"),
            (Timing::After(at(9, 0, 0)), None, "timetable.visits_after"),
            (
                Timing::Between(at(9, 0, 0), at(10, 0, 0)),
                None,
                "timetable.visits_between",
            ),
            (Timing::Before(at(9, 0, 0)), route(), "timetable.visits_before_on_route"),
            (Timing::After(at(9, 0, 0)), route(), "timetable.visits_after_on_route"),
            (
                Timing::Between(at(9, 0, 0), at(10, 0, 0)),
                route(),
                "timetable.visits_between_on_route",
            ),
        ];

        for (timing, route, expected) in cases {
            let cursor = Cursor::new(station(), route, timing, 5);
            assert_eq!(cursor.procedure(), expected);
        }
    }

    #[test]
    fn args_without_route() {
        let cursor = Cursor::new(station(), None, Timing::After(at(9, 0, 0)), 5);
        assert_eq!(cursor.args(), vec![json!("BUS215"), json!("20170105 09:00:00"), json!(5)]);
    }

    #[test]
    fn args_with_route_and_window() {
        let cursor = Cursor::new(
            station(),
            route(),
            Timing::Between(at(9, 0, 0), at(10, 0, 0)),
            1,
        );
        assert_eq!(
            cursor.args(),
            vec![
                json!("4B"),
                json!("BUS215"),
                json!("20170105 09:00:00"),
                json!("20170105 10:00:00"),
                json!(1),
            ]
        );
    }

    #[test]
    fn advance_narrows_and_pages_by_one() {
        let cursor = Cursor::new(station(), route(), Timing::After(at(9, 0, 0)), 5);

        let next = cursor.advance([at(9, 10, 0), at(9, 20, 0)]);
        assert_eq!(next.timing, Timing::After(at(9, 20, 1)));
        assert_eq!(next.count, 1);
        assert_eq!(next.station, cursor.station);
        assert_eq!(next.route, cursor.route);

        let unchanged = cursor.advance([]);
        assert_eq!(unchanged.timing, cursor.timing);
        assert_eq!(unchanged.count, 1);
    }
}
