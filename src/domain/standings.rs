//! League tables and scorer charts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub position: i32,
    pub team_name: String,
    pub team_crest: Option<String>,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionStandings {
    pub competition_name: String,
    pub competition_code: String,
    /// Season label such as `2025/2026`.
    pub season: Option<String>,
    pub standings: Vec<StandingsRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerStats {
    pub player_name: String,
    pub team_name: String,
    pub team_crest: Option<String>,
    pub goals: i32,
    pub assists: Option<i32>,
    pub penalties: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionScorers {
    pub competition_name: String,
    pub competition_code: String,
    pub season: Option<String>,
    pub scorers: Vec<ScorerStats>,
}
