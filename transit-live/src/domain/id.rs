//! String identifier newtypes.
//!
//! Every entity kind is named by an opaque server-assigned string. The
//! newtypes keep a route code from being passed where a vehicle name is
//! expected, and reject empty identifiers at the boundary.

use std::fmt;

/// Error returned when an identifier is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: must not be empty")]
pub struct InvalidId {
    kind: &'static str,
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, rejecting empty or whitespace-only input.
            pub fn parse(s: impl Into<String>) -> Result<Self, InvalidId> {
                let s = s.into();
                if s.trim().is_empty() {
                    return Err(InvalidId { kind: $kind });
                }
                Ok(Self(s))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Code naming a route, e.g. `"4B"`.
    RouteCode,
    "route code"
);

string_id!(
    /// Name of a vehicle, e.g. `"1402"`.
    VehicleName,
    "vehicle name"
);

string_id!(
    /// Identifier of a station stop, e.g. `"BUS215"`.
    StopId,
    "stop id"
);
