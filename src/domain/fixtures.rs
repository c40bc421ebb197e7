//! Normalized fixture DTOs served to API consumers.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

use super::types::MatchStatus;

/// Number of fixtures kept in the `upcoming` bucket of a summary.
pub const UPCOMING_LIMIT: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureMatch {
    #[serde(with = "time::serde::rfc3339")]
    pub match_date: OffsetDateTime,
    pub home_team_name: String,
    pub away_team_name: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub match_status: MatchStatus,
    pub venue: Option<String>,
    pub home_logo_url: Option<String>,
    pub away_logo_url: Option<String>,
}

impl FixtureMatch {
    pub fn match_day(&self) -> Date {
        self.match_date.to_offset(UtcOffset::UTC).date()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionFixtures {
    pub competition_name: String,
    pub competition_code: String,
    pub logo_url: Option<String>,
    pub matches: Vec<FixtureMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixturesSummary {
    pub competition_name: String,
    pub competition_code: String,
    pub logo_url: Option<String>,
    pub today: Vec<FixtureMatch>,
    pub tomorrow: Vec<FixtureMatch>,
    pub upcoming: Vec<FixtureMatch>,
}

impl FixturesSummary {
    /// Bucket `matches` relative to `today` (UTC).
    ///
    /// Matches before `today` are dropped; anything after tomorrow lands in
    /// `upcoming`, earliest first, capped at [`UPCOMING_LIMIT`].
    pub fn from_matches(
        competition_name: String,
        competition_code: String,
        logo_url: Option<String>,
        mut matches: Vec<FixtureMatch>,
        today: Date,
    ) -> Self {
        matches.sort_by_key(|fixture| fixture.match_date);
        let tomorrow = today.next_day();

        let mut summary = Self {
            competition_name,
            competition_code,
            logo_url,
            today: Vec::new(),
            tomorrow: Vec::new(),
            upcoming: Vec::new(),
        };

        for fixture in matches {
            let day = fixture.match_day();
            if day == today {
                summary.today.push(fixture);
            } else if Some(day) == tomorrow {
                summary.tomorrow.push(fixture);
            } else if day > today && summary.upcoming.len() < UPCOMING_LIMIT {
                summary.upcoming.push(fixture);
            }
        }

        summary
    }

    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.tomorrow.is_empty() && self.upcoming.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;

    fn fixture(at: OffsetDateTime, home: &str) -> FixtureMatch {
        FixtureMatch {
            match_date: at,
            home_team_name: home.to_string(),
            away_team_name: "Away".to_string(),
            home_score: None,
            away_score: None,
            match_status: MatchStatus::Scheduled,
            venue: None,
            home_logo_url: None,
            away_logo_url: None,
        }
    }

    #[test]
    fn buckets_matches_by_utc_day() {
        let matches = vec![
            fixture(datetime!(2026-03-14 19:45 UTC), "late-today"),
            fixture(datetime!(2026-03-13 15:00 UTC), "yesterday"),
            fixture(datetime!(2026-03-14 12:30 UTC), "early-today"),
            fixture(datetime!(2026-03-15 00:30 +02:00), "still-today-in-utc"),
            fixture(datetime!(2026-03-15 16:00 UTC), "tomorrow"),
            fixture(datetime!(2026-03-17 16:00 UTC), "d3"),
        ];

        let summary = FixturesSummary::from_matches(
            "Premier League".into(),
            "PL".into(),
            None,
            matches,
            date!(2026 - 03 - 14),
        );

        let names = |bucket: &[FixtureMatch]| {
            bucket
                .iter()
                .map(|m| m.home_team_name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(&summary.today),
            ["early-today", "late-today", "still-today-in-utc"]
        );
        assert_eq!(names(&summary.tomorrow), ["tomorrow"]);
        assert_eq!(names(&summary.upcoming), ["d3"]);
    }

    #[test]
    fn upcoming_is_capped() {
        let matches = (16..=23)
            .map(|day| {
                let at = date!(2026 - 03 - 01)
                    .replace_day(day)
                    .unwrap()
                    .midnight()
                    .assume_utc();
                fixture(at, &format!("day-{day}"))
            })
            .collect();

        let summary = FixturesSummary::from_matches(
            "Serie A".into(),
            "SA".into(),
            None,
            matches,
            date!(2026 - 03 - 14),
        );

        assert!(summary.today.is_empty());
        assert!(summary.tomorrow.is_empty());
        assert_eq!(summary.upcoming.len(), UPCOMING_LIMIT);
        assert_eq!(summary.upcoming[0].home_team_name, "day-16");
        assert!(!summary.is_empty());
    }
}
