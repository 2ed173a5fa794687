//! # Domain Identity Newtypes
//!
//! You cannot pass a `DrawId` where a `TaskId` is expected. Every
//! identifier displays with a namespace prefix (`task:…`) and parses from
//! either the bare UUID or the prefixed form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.trim();
                let raw = raw.strip_prefix(concat!($prefix, ":")).unwrap_or(raw);
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidIdentifier(s.to_string()))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a task or subtask.
    TaskId,
    "task"
);

uuid_id!(
    /// Unique identifier for a fund draw.
    DrawId,
    "draw"
);

uuid_id!(
    /// Unique identifier for a construction project.
    ProjectId,
    "project"
);

/// Sequential draw number within a project, assigned at creation.
///
/// Numbers start at 1 and are never reused, even after a draw is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawNumber(pub u32);

impl DrawNumber {
    /// The first draw of a project.
    pub const FIRST: DrawNumber = DrawNumber(1);

    /// The number after this one, or `None` at `u32::MAX`.
    pub fn next(self) -> Option<DrawNumber> {
        self.0.checked_add(1).map(DrawNumber)
    }
}

impl fmt::Display for DrawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
