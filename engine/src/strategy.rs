//! Conflict resolution strategies.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to choose between a local and a server copy of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Later `updatedAt` (then `createdAt`) wins; ties go to the server (default)
    #[default]
    LastWriteWins,
    /// Local copy always wins
    ClientWins,
    /// Server copy always wins
    ServerWins,
    /// Shallow merge, local members override server members
    Merge,
    /// Per-kind rules, see [`Resolver`](crate::Resolver)
    Custom,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::LastWriteWins,
        Strategy::ClientWins,
        Strategy::ServerWins,
        Strategy::Merge,
        Strategy::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::LastWriteWins => "last-write-wins",
            Strategy::ClientWins => "client-wins",
            Strategy::ServerWins => "server-wins",
            Strategy::Merge => "merge",
            Strategy::Custom => "custom",
        }
    }

    /// Parse a strategy name, degrading unknown names to `LastWriteWins`.
    ///
    /// Intended for string boundaries where callers expect the lenient
    /// behaviour; typed callers should use [`FromStr`].
    pub fn lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(strategy = name, "unknown strategy, using last-write-wins");
            Strategy::LastWriteWins
        })
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| Error::UnknownStrategy(s.to_string()))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
