//! Shared value types for the composition domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. confidence is in `[0.0, 1.0]`) and
//! travel inside experience nodes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// The external or internal trigger that starts a pipeline run.
///
/// Any JSON value may be an origin: plain text from a user, a structured log
/// record, or the interpretation of an earlier run fed back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(Value);

impl Origin {
    /// Wraps an arbitrary JSON value as an origin.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Returns the origin text if the origin is a plain string.
    pub fn as_text(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl From<&str> for Origin {
    fn from(text: &str) -> Self {
        Self(Value::String(text.to_owned()))
    }
}

impl From<String> for Origin {
    fn from(text: String) -> Self {
        Self(Value::String(text))
    }
}

impl From<Value> for Origin {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(text) => write!(f, "{text}"),
            other => write!(f, "{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Free-form metadata attached to an experience node.
///
/// A `BTreeMap` keeps serialised output stable across runs.
pub type Metadata = BTreeMap<String, Value>;

/// Metadata key under which every node records its creation time.
pub const TIMESTAMP_KEY: &str = "timestamp";

// ---------------------------------------------------------------------------
// Score types
// ---------------------------------------------------------------------------

/// Confidence reported by an inference boundary, in the range `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Creates a [`Confidence`], returning `None` if `value` is outside
    /// the valid range `[0.0, 1.0]`.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Full confidence (`1.0`).
    pub fn certain() -> Self {
        Self(1.0)
    }

    /// Returns the score as an `f64` in `[0.0, 1.0]`.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("confidence {value} is outside [0.0, 1.0]"))
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
