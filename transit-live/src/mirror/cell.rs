//! Versioned entity state and the atomic apply step.

use serde_json::Value;
use tokio::sync::watch;

use crate::domain::Entity;
use crate::event::{DecodeError, DomainEvent, RawEvent};

use super::error::MirrorError;

/// Everything a mirror knows about its entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorState<E> {
    /// Incremented on every mutation; zero until the first event applies.
    pub version: u64,
    /// Merged view of every record applied so far.
    pub value: E,
    /// The last record applied, as it was received.
    pub source: E,
}

/// Outcome of dispatching one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// The event described this entity and has been applied.
    Handled,
    /// The event is not about this entity's state.
    Unhandled(RawEvent),
}

/// Shared, atomically updated state of one mirrored entity.
///
/// All writes go through the watch sender's modify calls, which hold the
/// channel's lock for the whole read-modify-write. Two updates therefore
/// never interleave, and observers always see a complete state.
#[derive(Debug)]
pub struct MirrorCell<E: Entity> {
    id: E::Id,
    state: watch::Sender<MirrorState<E>>,
}

impl<E: Entity> MirrorCell<E> {
    /// Create a cell holding `initial` at version zero.
    pub fn new(initial: E) -> Self {
        let id = initial.id().clone();
        let (state, _) = watch::channel(MirrorState {
            version: 0,
            value: initial.clone(),
            source: initial,
        });
        Self { id, state }
    }

    pub fn id(&self) -> &E::Id {
        &self.id
    }

    /// Current state.
    pub fn snapshot(&self) -> MirrorState<E> {
        self.state.borrow().clone()
    }

    /// Observe state changes.
    pub fn watch(&self) -> watch::Receiver<MirrorState<E>> {
        self.state.subscribe()
    }

    /// Apply one decoded event.
    pub fn dispatch(&self, event: DomainEvent<E>) -> Result<Dispatch, MirrorError> {
        match event {
            DomainEvent::Snapshot(record) | DomainEvent::Update(record) => {
                self.apply(record)?;
                Ok(Dispatch::Handled)
            }
            DomainEvent::RelatedUpdate(payload) => {
                self.replace_related(&payload)?;
                Ok(Dispatch::Handled)
            }
            DomainEvent::Other(raw) => Ok(Dispatch::Unhandled(raw)),
        }
    }

    /// Merge `record` into the held value and make it the source record.
    ///
    /// A record for a different entity is rejected without touching state.
    pub fn apply(&self, record: E) -> Result<(), MirrorError> {
        if record.id() != &self.id {
            return Err(MirrorError::IdentityMismatch {
                expected: self.id.to_string(),
                found: record.id().to_string(),
            });
        }

        self.state.send_modify(|state| {
            state.value.merge(&record);
            state.source = record;
            state.version += 1;
        });
        Ok(())
    }

    /// Replace nested entities matching the one in `payload`.
    ///
    /// Returns how many were replaced. Observers are only notified when
    /// something changed.
    pub fn replace_related(&self, payload: &Value) -> Result<usize, MirrorError> {
        let mut outcome = Ok(0);

        self.state
            .send_if_modified(|state| match state.value.replace_related(payload) {
                Ok(0) => false,
                Ok(replaced) => {
                    state.version += 1;
                    outcome = Ok(replaced);
                    true
                }
                Err(source) => {
                    outcome = Err(source);
                    false
                }
            });

        outcome.map_err(|source| {
            MirrorError::Decode(DecodeError::Body {
                kind: E::RELATED_EVENT.unwrap_or(E::KIND),
                source,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Route, RouteCode, Vehicle, VehicleName};
    use proptest::prelude::*;
    use serde_json::json;

    fn code(s: &str) -> RouteCode {
        RouteCode::parse(s).unwrap()
    }

    fn vehicle(name: &str, onboard: u32) -> Vehicle {
        let mut v = Vehicle::unknown(VehicleName::parse(name).unwrap());
        v.onboard = Some(onboard);
        v
    }

    fn held_route() -> Route {
        let mut route = Route::unknown(code("4B"));
        route.name = Some("Purdue West".into());
        route.color = Some("#000000".into());
        route.vehicles = Some(vec![vehicle("1", 5), vehicle("2", 7)]);
        route
    }

    #[test]
    fn new_cell_is_version_zero() {
        let cell = MirrorCell::new(held_route());
        let state = cell.snapshot();

        assert_eq!(state.version, 0);
        assert_eq!(state.value, held_route());
        assert_eq!(state.source, held_route());
    }

    #[test]
    fn apply_merges_partially() {
        let cell = MirrorCell::new(held_route());

        let mut update = Route::unknown(code("4B"));
        update.color = Some("#C28E0E".into());
        cell.apply(update.clone()).unwrap();

        let state = cell.snapshot();
        assert_eq!(state.version, 1);
        assert_eq!(state.value.name.as_deref(), Some("Purdue West"));
        assert_eq!(state.value.color.as_deref(), Some("#C28E0E"));
        assert_eq!(state.value.vehicles().len(), 2);
        // The source record is replaced in full.
        assert_eq!(state.source, update);
    }

    #[test]
    fn apply_rejects_other_identity() {
        let cell = MirrorCell::new(held_route());

        let mut update = Route::unknown(code("10"));
        update.name = Some("Other".into());
        let result = cell.apply(update);

        assert!(matches!(
            result,
            Err(MirrorError::IdentityMismatch { ref expected, ref found })
                if expected == "4B" && found == "10"
        ));
        assert_eq!(cell.snapshot().version, 0);
        assert_eq!(cell.snapshot().value, held_route());
    }

    #[test]
    fn related_update_replaces_only_match() {
        let cell = MirrorCell::new(held_route());

        let outcome = cell
            .dispatch(DomainEvent::RelatedUpdate(json!({"name": "2", "onboard": 30})))
            .unwrap();

        assert_eq!(outcome, Dispatch::Handled);
        let state = cell.snapshot();
        assert_eq!(state.version, 1);
        assert_eq!(state.value.vehicles()[0], vehicle("1", 5));
        assert_eq!(state.value.vehicles()[1], vehicle("2", 30));
    }

    #[test]
    fn related_update_without_match_is_silent() {
        let cell = MirrorCell::new(held_route());
        let rx = cell.watch();

        let replaced = cell
            .replace_related(&json!({"name": "3", "onboard": 30}))
            .unwrap();

        assert_eq!(replaced, 0);
        assert_eq!(cell.snapshot().value, held_route());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn malformed_related_update_is_a_decode_error() {
        let cell = MirrorCell::new(held_route());

        let result = cell.replace_related(&json!({"onboard": "many"}));

        assert!(matches!(
            result,
            Err(MirrorError::Decode(DecodeError::Body { kind: "vehicle_update", .. }))
        ));
        assert_eq!(cell.snapshot().version, 0);
    }

    #[test]
    fn other_events_are_unhandled() {
        let cell = MirrorCell::new(held_route());
        let raw = RawEvent {
            topic: "routes.4B".into(),
            event: "detour".into(),
            data: json!(null),
        };

        let outcome = cell.dispatch(DomainEvent::Other(raw.clone())).unwrap();

        assert_eq!(outcome, Dispatch::Unhandled(raw));
        assert_eq!(cell.snapshot().version, 0);
    }

    #[test]
    fn observers_are_notified() {
        let cell = MirrorCell::new(held_route());
        let mut rx = cell.watch();

        cell.dispatch(DomainEvent::Update(Route::unknown(code("4B"))))
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().version, 1);
    }

    fn route_strategy(code_str: &'static str) -> impl Strategy<Value = Route> {
        (
            proptest::option::of("[a-z ]{1,12}"),
            proptest::option::of("[A-Z]{1,3}"),
            proptest::option::of("#[0-9A-F]{6}"),
        )
            .prop_map(move |(name, short_name, color)| {
                let mut route = Route::unknown(code(code_str));
                route.name = name;
                route.short_name = short_name;
                route.color = color;
                route
            })
    }

    proptest! {
        #[test]
        fn mismatched_identity_never_mutates(update in route_strategy("10")) {
            let cell = MirrorCell::new(held_route());

            prop_assert!(cell.apply(update).is_err());
            prop_assert_eq!(cell.snapshot(), MirrorCell::new(held_route()).snapshot());
        }

        #[test]
        fn set_fields_win_and_unset_fields_stay(update in route_strategy("4B")) {
            let held = held_route();
            let cell = MirrorCell::new(held.clone());

            cell.apply(update.clone()).unwrap();
            let value = cell.snapshot().value;

            prop_assert_eq!(value.name, update.name.or(held.name));
            prop_assert_eq!(value.short_name, update.short_name.or(held.short_name));
            prop_assert_eq!(value.color, update.color.or(held.color));
            prop_assert_eq!(value.vehicles, held.vehicles);
        }
    }
}
