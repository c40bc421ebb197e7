use std::{num::NonZeroU32, time::Duration};

use httpmock::MockServer;
use libero::{
    application::upstream::{SportsProvider, UpstreamError},
    domain::{competitions::CompetitionCode, types::MatchStatus},
    infra::upstream::{FootballDataClient, FootballDataConfig, UNDECIDED_TEAM},
};
use reqwest::Url;
use time::{OffsetDateTime, macros::date};
use tokio::time::Instant;

fn config(server: &MockServer, api_key: Option<&str>) -> FootballDataConfig {
    let base_url = Url::parse(&format!("{}/v4", server.base_url())).expect("base url");
    FootballDataConfig {
        base_url,
        api_key: api_key.map(str::to_string),
        timeout: Duration::from_secs(5),
        requests_per_minute: NonZeroU32::new(600).expect("non-zero"),
        default_retry_after: Duration::from_millis(200),
        max_retry_after: Duration::from_secs(5),
        competitions: vec![code("PL"), code("SA")],
    }
}

fn client(server: &MockServer, api_key: Option<&str>) -> FootballDataClient {
    FootballDataClient::new(config(server, api_key)).expect("client")
}

fn code(raw: &str) -> CompetitionCode {
    CompetitionCode::parse(raw).expect("code")
}

const STANDINGS_BODY: &str = r#"{
    "competition": { "name": "Premier League", "code": "PL", "emblem": "https://crests.example/PL.png" },
    "season": { "startDate": "2025-08-15", "endDate": "2026-05-24" },
    "standings": [{
        "stage": "REGULAR_SEASON",
        "type": "TOTAL",
        "group": null,
        "table": [{
            "position": 1,
            "team": { "name": "Arsenal FC", "crest": "https://crests.example/57.png" },
            "playedGames": 28, "won": 20, "draw": 5, "lost": 3, "points": 65,
            "goalsFor": 60, "goalsAgainst": 22, "goalDifference": 38
        }]
    }]
}"#;

#[tokio::test]
async fn standings_are_fetched_with_the_auth_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/v4/competitions/PL/standings")
            .header("x-auth-token", "secret-token");
        then.status(200)
            .header("content-type", "application/json")
            .body(STANDINGS_BODY);
    });

    let standings = client(&server, Some("secret-token"))
        .fetch_standings(&code("pl"))
        .await
        .expect("standings");

    mock.assert();
    assert_eq!(standings.competition_code, "PL");
    assert_eq!(standings.season.as_deref(), Some("2025/2026"));
    assert_eq!(standings.standings.len(), 1);
    assert_eq!(standings.standings[0].team_name, "Arsenal FC");
    assert_eq!(standings.standings[0].drawn, 5);
    assert_eq!(standings.standings[0].points, 65);
}

#[tokio::test]
async fn rate_limited_request_is_retried_once_after_retry_after() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/v4/competitions/SA/scorers");
        then.status(429).header("Retry-After", "2");
    });

    let started = Instant::now();
    let err = client(&server, None)
        .fetch_top_scorers(&code("SA"))
        .await
        .expect_err("still rate limited");

    mock.assert_calls(2);
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(matches!(
        err,
        UpstreamError::Unavailable {
            status: Some(429),
            ..
        }
    ));
}

#[tokio::test]
async fn missing_retry_after_uses_the_default_pause() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/v4/competitions/PL/standings");
        then.status(429);
    });

    let started = Instant::now();
    let err = client(&server, None)
        .fetch_standings(&code("PL"))
        .await
        .expect_err("rate limited");

    mock.assert_calls(2);
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(matches!(err, UpstreamError::Unavailable { .. }));
}

#[tokio::test]
async fn retry_after_beyond_the_cap_fails_without_sleeping() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/v4/competitions/PL/standings");
        then.status(429).header("Retry-After", "86400");
    });

    let err = tokio::time::timeout(
        Duration::from_secs(3),
        client(&server, None).fetch_standings(&code("PL")),
    )
    .await
    .expect("fetch returns before the retry-after elapses")
    .expect_err("rate limited");

    mock.assert_calls(1);
    assert!(matches!(
        err,
        UpstreamError::Unavailable {
            status: Some(429),
            ..
        }
    ));
}

#[tokio::test]
async fn slow_upstream_times_out_as_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/v4/competitions/SA/scorers");
        then.status(200)
            .delay(Duration::from_secs(3))
            .body(r#"{"competition":null,"season":null,"scorers":[]}"#);
    });
    let client = FootballDataClient::new(FootballDataConfig {
        timeout: Duration::from_millis(300),
        ..config(&server, None)
    })
    .expect("client");

    let started = Instant::now();
    let err = client
        .fetch_top_scorers(&code("SA"))
        .await
        .expect_err("timed out");

    assert!(started.elapsed() < Duration::from_secs(3));
    match err {
        UpstreamError::Unavailable { status, message, .. } => {
            assert_eq!(status, None);
            assert!(message.contains("timed out"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn summary_surfaces_rate_limit_without_retrying() {
    let server = MockServer::start();
    let competition = server.mock(|when, then| {
        when.method("GET").path("/v4/competitions/PL");
        then.status(429).header("Retry-After", "30");
    });
    let matches = server.mock(|when, then| {
        when.method("GET").path("/v4/matches");
        then.status(200).body(r#"{"matches":[]}"#);
    });

    let err = client(&server, None)
        .fetch_fixtures_summary(&code("PL"), date!(2026 - 03 - 14))
        .await
        .expect_err("rate limited");

    competition.assert_calls(1);
    matches.assert_calls(0);
    match err {
        UpstreamError::RateLimited { retry_after, .. } => {
            assert_eq!(retry_after, Some(Duration::from_secs(30)))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn summary_requests_a_week_of_matches() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/v4/competitions/SA");
        then.status(200).body(
            r#"{"name":"Serie A","code":"SA","emblem":null,
                "currentSeason":{"startDate":"2025-08-23","endDate":"2026-05-24"}}"#,
        );
    });
    let matches = server.mock(|when, then| {
        when.method("GET")
            .path("/v4/matches")
            .query_param("competitions", "SA")
            .query_param("dateFrom", "2026-03-14")
            .query_param("dateTo", "2026-03-21");
        then.status(200).body(
            r#"{"matches":[{
                "utcDate": "2026-03-14T17:00:00Z",
                "status": "TIMED",
                "venue": "San Siro",
                "competition": { "name": "Serie A", "code": "SA", "emblem": null },
                "homeTeam": { "name": "AC Milan", "crest": null },
                "awayTeam": { "name": null, "crest": null },
                "score": { "fullTime": { "home": null, "away": null } }
            }]}"#,
        );
    });

    let summary = client(&server, None)
        .fetch_fixtures_summary(&code("SA"), date!(2026 - 03 - 14))
        .await
        .expect("summary");

    matches.assert();
    assert_eq!(summary.competition_name, "Serie A");
    assert_eq!(summary.today.len(), 1);
    assert_eq!(summary.today[0].match_status, MatchStatus::Scheduled);
    assert_eq!(summary.today[0].away_team_name, UNDECIDED_TEAM);
    assert_eq!(summary.today[0].venue.as_deref(), Some("San Siro"));
}

#[tokio::test]
async fn todays_fixtures_only_keep_matches_on_the_requested_day() {
    let server = MockServer::start();
    let today = OffsetDateTime::now_utc().date();
    let tomorrow = today.next_day().expect("tomorrow");
    let body = format!(
        r#"{{"matches":[
            {{"utcDate":"{today}T15:00:00Z","status":"FINISHED","venue":null,
              "competition":{{"name":"Premier League","code":"PL","emblem":null}},
              "homeTeam":{{"name":"Arsenal FC","crest":null}},
              "awayTeam":{{"name":"Chelsea FC","crest":null}},
              "score":{{"fullTime":{{"home":2,"away":1}}}}}},
            {{"utcDate":"{tomorrow}T15:00:00Z","status":"SCHEDULED","venue":null,
              "competition":{{"name":"Premier League","code":"PL","emblem":null}},
              "homeTeam":{{"name":"Everton FC","crest":null}},
              "awayTeam":{{"name":"Liverpool FC","crest":null}},
              "score":null}}
        ]}}"#
    );
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/v4/matches")
            .query_param("dateFrom", today.to_string())
            .query_param("dateTo", today.to_string())
            .query_param("competitions", "PL,SA");
        then.status(200).body(body);
    });

    let groups = client(&server, None)
        .fetch_today_fixtures(today)
        .await
        .expect("fixtures");

    mock.assert();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].competition_code, "PL");
    assert_eq!(groups[0].matches.len(), 1);
    assert_eq!(groups[0].matches[0].match_status, MatchStatus::Finished);
    assert_eq!(groups[0].matches[0].home_score, Some(2));
}

#[tokio::test]
async fn missing_required_field_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/v4/competitions/PL/scorers");
        then.status(200).body(
            r#"{"competition":{"name":"Premier League","code":"PL","emblem":null},
                "season":null,
                "scorers":[{"player":{"name":"Erling Haaland"},"team":{"name":"Manchester City FC","crest":null}}]}"#,
        );
    });

    let err = client(&server, None)
        .fetch_top_scorers(&code("PL"))
        .await
        .expect_err("goals missing");

    assert!(matches!(err, UpstreamError::Decode { .. }));
}

#[tokio::test]
async fn server_errors_are_reported_as_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/v4/competitions/PL/standings");
        then.status(503).body("maintenance");
    });

    let err = client(&server, None)
        .fetch_standings(&code("PL"))
        .await
        .expect_err("unavailable");

    match err {
        UpstreamError::Unavailable { status, message, .. } => {
            assert_eq!(status, Some(503));
            assert!(message.contains("maintenance"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn user_agent_names_the_crate() {
    assert!(FootballDataClient::user_agent().starts_with("libero/"));
}
