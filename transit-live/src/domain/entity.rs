//! The entity abstraction shared by every mirrored model.

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A server-owned model that can be mirrored locally.
///
/// Entity values double as partial updates: every attribute other than the
/// identifier is optional, and an update only carries the attributes that
/// changed. [`Entity::merge`] folds such an update into a held value.
pub trait Entity: Clone + fmt::Debug + DeserializeOwned + Send + Sync + 'static {
    /// Identifier naming an entity within its kind.
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Topic namespace for this kind, e.g. `"routes"`.
    const KIND: &'static str;

    /// Event name for updates of entities nested inside this one, if any.
    const RELATED_EVENT: Option<&'static str> = None;

    /// Returns the identifier.
    fn id(&self) -> &Self::Id;

    /// An entity with every attribute unset.
    fn unknown(id: Self::Id) -> Self;

    /// Overwrite every attribute that is set in `update`.
    ///
    /// Attributes that are unset in `update` keep their current value.
    /// Callers check identity first; `merge` does not look at the id.
    fn merge(&mut self, update: &Self);

    /// Replace nested entities matching the identity of the one in `payload`.
    ///
    /// Returns how many were replaced. Kinds without nested entities keep
    /// the default, which replaces nothing.
    fn replace_related(&mut self, payload: &Value) -> Result<usize, serde_json::Error> {
        let _ = payload;
        Ok(0)
    }

    /// Topic carrying events for the entity named `id`.
    fn topic_for(id: &Self::Id) -> String {
        format!("{}.{}", Self::KIND, id)
    }

    /// Topic carrying events for this entity.
    fn topic(&self) -> String {
        Self::topic_for(self.id())
    }
}

/// Overwrite `slot` if `update` is set.
pub(crate) fn overwrite<T: Clone>(slot: &mut Option<T>, update: &Option<T>) {
    if let Some(value) = update {
        *slot = Some(value.clone());
    }
}
