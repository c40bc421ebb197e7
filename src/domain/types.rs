//! Shared domain enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Kind of payload stored in the typed competition cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Today,
    FixturesSummary,
    Standings,
    Scorers,
}

impl DataKind {
    pub const ALL: [DataKind; 4] = [
        DataKind::Today,
        DataKind::FixturesSummary,
        DataKind::Standings,
        DataKind::Scorers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::Today => "today",
            DataKind::FixturesSummary => "fixtures_summary",
            DataKind::Standings => "standings",
            DataKind::Scorers => "scorers",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DataKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| DomainError::validation(format!("unknown data kind `{value}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Postponed,
    Suspended,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Suspended => "suspended",
            MatchStatus::Cancelled => "cancelled",
        }
    }
}
