//! Cache keys for the sports resources served by the API.

use time::Date;

use super::{competitions::CompetitionCode, types::DataKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SportsResource {
    TodayFixtures { date: Date },
    FixturesSummary(CompetitionCode),
    Standings(CompetitionCode),
    Scorers(CompetitionCode),
}

impl SportsResource {
    pub fn cache_key(&self) -> String {
        match self {
            SportsResource::TodayFixtures { date } => format!("todays_fixtures_{date}"),
            SportsResource::FixturesSummary(code) => format!("fixtures_summary_{code}"),
            SportsResource::Standings(code) => format!("standings_{code}"),
            SportsResource::Scorers(code) => format!("scorers_{code}"),
        }
    }

    pub fn data_kind(&self) -> DataKind {
        match self {
            SportsResource::TodayFixtures { .. } => DataKind::Today,
            SportsResource::FixturesSummary(_) => DataKind::FixturesSummary,
            SportsResource::Standings(_) => DataKind::Standings,
            SportsResource::Scorers(_) => DataKind::Scorers,
        }
    }

    pub fn competition(&self) -> Option<&CompetitionCode> {
        match self {
            SportsResource::TodayFixtures { .. } => None,
            SportsResource::FixturesSummary(code)
            | SportsResource::Standings(code)
            | SportsResource::Scorers(code) => Some(code),
        }
    }
}
