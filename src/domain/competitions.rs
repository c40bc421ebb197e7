//! Competition codes and their canonical display names.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

const MAX_CODE_LEN: usize = 10;

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("PL", "Premier League"),
    ("PD", "La Liga"),
    ("SA", "Serie A"),
    ("BL1", "Bundesliga"),
    ("FL1", "Ligue 1"),
    ("CL", "UEFA Champions League"),
    ("EL", "UEFA Europa League"),
    ("DED", "Eredivisie"),
    ("PPL", "Primeira Liga"),
    ("ELC", "Championship"),
];

/// Validated, upper-cased provider competition code such as `PL` or `BL1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompetitionCode(String);

impl CompetitionCode {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("competition code must not be empty"));
        }
        if trimmed.len() > MAX_CODE_LEN {
            return Err(DomainError::validation(format!(
                "competition code `{trimmed}` exceeds {MAX_CODE_LEN} characters"
            )));
        }
        if !trimmed.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(DomainError::validation(format!(
                "competition code `{trimmed}` must be alphanumeric"
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical name for well-known competitions.
    pub fn display_name(&self) -> Option<&'static str> {
        display_name(&self.0)
    }
}

impl fmt::Display for CompetitionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CompetitionCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CompetitionCode> for String {
    fn from(code: CompetitionCode) -> Self {
        code.0
    }
}

pub fn display_name(code: &str) -> Option<&'static str> {
    DISPLAY_NAMES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Display name for `code`, falling back to whatever the provider called it.
pub fn display_name_or(code: &str, provider_name: &str) -> String {
    display_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| provider_name.to_string())
}
