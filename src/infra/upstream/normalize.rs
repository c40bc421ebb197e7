//! Provider payloads to domain DTOs.

use time::Date;

use crate::domain::{
    competitions::{CompetitionCode, display_name_or},
    fixtures::{CompetitionFixtures, FixtureMatch, FixturesSummary},
    standings::{CompetitionScorers, CompetitionStandings, ScorerStats, StandingsRow},
    types::MatchStatus,
};

use super::models::{
    CompetitionResource, MatchResource, ProviderMatchStatus, ScorersResponse, SeasonResource,
    StandingGroup, StandingsResponse, TeamRef,
};

/// Placeholder for teams the provider has not determined yet.
pub const UNDECIDED_TEAM: &str = "TBD";

const REGULAR_SEASON: &str = "REGULAR_SEASON";
const TOTAL_TABLE: &str = "TOTAL";

pub fn match_status(status: ProviderMatchStatus) -> MatchStatus {
    match status {
        ProviderMatchStatus::Scheduled | ProviderMatchStatus::Timed => MatchStatus::Scheduled,
        ProviderMatchStatus::InPlay
        | ProviderMatchStatus::Paused
        | ProviderMatchStatus::ExtraTime
        | ProviderMatchStatus::PenaltyShootout
        | ProviderMatchStatus::Live => MatchStatus::Live,
        ProviderMatchStatus::Finished | ProviderMatchStatus::Awarded => MatchStatus::Finished,
        ProviderMatchStatus::Postponed => MatchStatus::Postponed,
        ProviderMatchStatus::Suspended => MatchStatus::Suspended,
        ProviderMatchStatus::Cancelled => MatchStatus::Cancelled,
    }
}

fn team_name(team: &TeamRef) -> String {
    team.name
        .clone()
        .unwrap_or_else(|| UNDECIDED_TEAM.to_string())
}

pub fn fixture_match(resource: MatchResource) -> FixtureMatch {
    let full_time = resource.score.and_then(|score| score.full_time);
    FixtureMatch {
        match_date: resource.utc_date,
        home_team_name: team_name(&resource.home_team),
        away_team_name: team_name(&resource.away_team),
        home_score: full_time.and_then(|line| line.home),
        away_score: full_time.and_then(|line| line.away),
        match_status: match_status(resource.status),
        venue: resource.venue,
        home_logo_url: resource.home_team.crest,
        away_logo_url: resource.away_team.crest,
    }
}

/// Group matches per competition, keeping the order competitions first appear in.
pub fn group_by_competition(matches: Vec<MatchResource>) -> Vec<CompetitionFixtures> {
    let mut groups: Vec<CompetitionFixtures> = Vec::new();

    for resource in matches {
        let code = resource.competition.code.clone();
        let index = match groups.iter().position(|group| group.competition_code == code) {
            Some(index) => index,
            None => {
                groups.push(CompetitionFixtures {
                    competition_name: display_name_or(&code, &resource.competition.name),
                    competition_code: code,
                    logo_url: resource.competition.emblem.clone(),
                    matches: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[index].matches.push(fixture_match(resource));
    }

    for group in &mut groups {
        group.matches.sort_by_key(|fixture| fixture.match_date);
    }
    groups
}

pub fn fixtures_summary(
    competition: CompetitionResource,
    matches: Vec<MatchResource>,
    today: Date,
) -> FixturesSummary {
    let fixtures = matches.into_iter().map(fixture_match).collect();
    FixturesSummary::from_matches(
        display_name_or(&competition.code, &competition.name),
        competition.code,
        competition.emblem,
        fixtures,
        today,
    )
}

/// `2025/2026` from a season spanning two calendar years, `2026` otherwise.
pub fn season_label(season: &SeasonResource) -> Option<String> {
    let start = season.start_date.get(..4)?;
    let end = season.end_date.get(..4)?;
    if start == end {
        Some(start.to_string())
    } else {
        Some(format!("{start}/{end}"))
    }
}

fn primary_table(groups: Vec<StandingGroup>) -> Option<StandingGroup> {
    let is_regular = |group: &StandingGroup| group.stage.as_deref() == Some(REGULAR_SEASON);
    let is_total = |group: &StandingGroup| {
        group.kind.as_deref().is_none_or(|kind| kind == TOTAL_TABLE)
    };

    let preferred = groups
        .iter()
        .position(|group| is_regular(group) && is_total(group) && !group.table.is_empty())
        .or_else(|| {
            groups
                .iter()
                .position(|group| is_regular(group) && !group.table.is_empty())
        });

    let mut groups = groups;
    match preferred {
        Some(index) => Some(groups.swap_remove(index)),
        None if groups.is_empty() => None,
        None => Some(groups.swap_remove(0)),
    }
}

pub fn standings(response: StandingsResponse, code: &CompetitionCode) -> CompetitionStandings {
    let season = response.season.as_ref().and_then(season_label);
    let rows = primary_table(response.standings)
        .map(|group| {
            group
                .table
                .into_iter()
                .map(|row| StandingsRow {
                    position: row.position,
                    team_name: team_name(&row.team),
                    team_crest: row.team.crest,
                    played: row.played_games,
                    won: row.won,
                    drawn: row.draw,
                    lost: row.lost,
                    goals_for: row.goals_for,
                    goals_against: row.goals_against,
                    goal_difference: row.goal_difference,
                    points: row.points,
                })
                .collect()
        })
        .unwrap_or_default();

    CompetitionStandings {
        competition_name: display_name_or(code.as_str(), &response.competition.name),
        competition_code: code.to_string(),
        season,
        standings: rows,
    }
}

pub fn scorers(response: ScorersResponse, code: &CompetitionCode) -> CompetitionScorers {
    let season = response.season.as_ref().and_then(season_label);
    let scorers = response
        .scorers
        .into_iter()
        .map(|row| ScorerStats {
            player_name: row.player.name,
            team_name: team_name(&row.team),
            team_crest: row.team.crest,
            goals: row.goals,
            assists: row.assists,
            penalties: row.penalties,
        })
        .collect();

    CompetitionScorers {
        competition_name: display_name_or(code.as_str(), &response.competition.name),
        competition_code: code.to_string(),
        season,
        scorers,
    }
}
