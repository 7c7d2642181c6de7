//! Storage-layer types for key scoping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scope a key lives in, mirroring the two browser storage areas.
///
/// `Local` survives restarts; `Session` holds short-lived credentials and is
/// expected to be wiped when a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Local,
    Session,
}

impl Namespace {
    /// The value stored in the `namespace` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Local => "local",
            Namespace::Session => "session",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Namespace::Local),
            "session" => Ok(Namespace::Session),
            other => Err(format!(
                "unknown namespace '{}', expected local/session",
                other
            )),
        }
    }
}
