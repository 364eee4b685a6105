//! Newtype domain identifiers.
//!
//! Every named or identified concept in the composition domain is a distinct
//! newtype wrapping a primitive. This prevents accidentally interchanging, for
//! example, a [`RunId`] with a [`TraceId`] even though both are UUIDs under the
//! hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), TryFrom<String>,
// Display. Deserialization goes through new(), so blank values are rejected.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty
            /// or only whitespace.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = &'static str;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(concat!(stringify!($name), " must not be blank"))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for UUID-wrapped newtypes (internally generated).
// Generates: struct (Copy), new_random(), from_uuid(), as_uuid(), Display.
// ---------------------------------------------------------------------------
macro_rules! uuid_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            pub fn new_random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying [`Uuid`].
            pub fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Names an evolution: a deterministic stage, a generative stage, or a
    /// composed path.
    ///
    /// Stage names tag every [`crate::Elaboration`] link and every
    /// [`crate::Experience`] node, so they double as the key for diagnostic
    /// log entries.
    StageName
}

impl StageName {
    /// Source name carried by the first node of every run.
    pub const ORIGIN: &'static str = "origin";

    pub(crate) fn origin() -> Self {
        Self(Self::ORIGIN.to_owned())
    }
}

// Lets maps keyed by stage name be queried with a plain `&str`.
impl std::borrow::Borrow<str> for StageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed
// ---------------------------------------------------------------------------

uuid_id! {
    /// Identifies one pipeline run (one call to `process`).
    ///
    /// Generated fresh for every run and attached to the run's tracing span so
    /// all stage activity from a single run can be correlated.
    RunId
}

uuid_id! {
    /// Identifies a trace handed to a [`crate::MemorySink`].
    TraceId
}
