//! Wire shapes of the football-data.org v4 API.
//!
//! Optional fields are `Option`s; anything else missing fails decoding.

use serde::Deserialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<MatchResource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResource {
    #[serde(with = "time::serde::rfc3339")]
    pub utc_date: OffsetDateTime,
    pub status: ProviderMatchStatus,
    pub venue: Option<String>,
    pub competition: CompetitionRef,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    pub score: Option<ScoreResource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderMatchStatus {
    Scheduled,
    Timed,
    InPlay,
    Paused,
    ExtraTime,
    PenaltyShootout,
    Live,
    Finished,
    Awarded,
    Postponed,
    Suspended,
    Cancelled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompetitionRef {
    pub name: String,
    pub code: String,
    pub emblem: Option<String>,
}

/// Teams of undrawn knockout ties come back with null names.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamRef {
    pub name: Option<String>,
    pub crest: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResource {
    pub full_time: Option<ScoreLine>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoreLine {
    #[serde(alias = "homeTeam")]
    pub home: Option<i32>,
    #[serde(alias = "awayTeam")]
    pub away: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionResource {
    pub name: String,
    pub code: String,
    pub emblem: Option<String>,
    pub current_season: Option<SeasonResource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonResource {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandingsResponse {
    pub competition: CompetitionRef,
    pub season: Option<SeasonResource>,
    pub standings: Vec<StandingGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandingGroup {
    pub stage: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub group: Option<String>,
    pub table: Vec<TableRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub position: i32,
    pub team: TeamRef,
    pub played_games: i32,
    pub won: i32,
    pub draw: i32,
    pub lost: i32,
    pub points: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScorersResponse {
    pub competition: CompetitionRef,
    pub season: Option<SeasonResource>,
    pub scorers: Vec<ScorerRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScorerRow {
    pub player: PlayerRef,
    pub team: TeamRef,
    pub goals: i32,
    pub assists: Option<i32>,
    pub penalties: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRef {
    pub name: String,
}
