//! Identifier types for Courtside entities.
//!
//! All identifiers are UUIDs wrapped in distinct newtypes so a player id can
//! never be passed where a team id is expected. Action ids double as the
//! client-generated idempotency key the backend deduplicates on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| crate::Error::invalid_id($kind, s))
            }
        }
    };
}

uuid_id!(
    /// Identifies a scheduled or running match.
    MatchId,
    "match"
);

uuid_id!(
    /// Identifies a team (club entry) taking part in a match.
    TeamId,
    "team"
);

uuid_id!(
    /// Identifies a rostered player.
    PlayerId,
    "player"
);

uuid_id!(
    /// Identifies a ledger entry; also the idempotency key for submission.
    ActionId,
    "action"
);

uuid_id!(
    /// Identifies one scorekeeper installation.
    DeviceId,
    "device"
);
