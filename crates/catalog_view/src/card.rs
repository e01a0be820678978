use catalog_store::{Match, MatchStatus};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use crate::format::{format_date, format_match_time};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum CardAction {
    WatchLive,
    NotStarted,
    Highlights(String),
    None,
}

/// What one match row renders as. Missing joins become "TBD" / empty strings,
/// never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCard {
    pub id:          String,
    pub team_a:      String,
    pub team_a_flag: String,
    pub team_b:      String,
    pub team_b_flag: String,
    pub competition: String,
    /// "2 - 1" once finished or live with a score, otherwise "vs".
    pub center:      String,
    pub status_line: String,
    pub action:      CardAction,
}

impl MatchCard {
    pub fn project<Tz: TimeZone>(m: &Match, now: &DateTime<Tz>) -> Self
    where
        Tz::Offset: Display,
    {
        let flag = |team: &Option<catalog_store::Team>| team.as_ref().map(|t| t.flag.clone()).unwrap_or_default();

        let center = match m.score() {
            Some((a, b)) if m.status != MatchStatus::Upcoming => format!("{a} - {b}"),
            _ => "vs".to_string(),
        };

        let (status_line, action) = match m.status {
            MatchStatus::Live => ("Live Now!".to_string(), CardAction::WatchLive),
            MatchStatus::Upcoming => (format_match_time(m.kickoff_time, now), CardAction::NotStarted),
            MatchStatus::Finished => (
                format!("Final Score: {}", format_date(m.kickoff_time, &now.timezone())),
                m.highlights_locator()
                    .map(|url| CardAction::Highlights(url.to_string()))
                    .unwrap_or(CardAction::None),
            ),
        };

        Self {
            id:          m.id.clone(),
            team_a:      m.team_a_name().to_string(),
            team_a_flag: flag(&m.team_a),
            team_b:      m.team_b_name().to_string(),
            team_b_flag: flag(&m.team_b),
            competition: m.competition_name().unwrap_or_default().to_string(),
            center,
            status_line,
            action,
        }
    }

    /// One console line, as the board prints it.
    pub fn line(&self) -> String {
        format!(
            "{} {} {} {} {}  | {} | {}",
            self.team_a, self.team_a_flag, self.center, self.team_b_flag, self.team_b, self.competition, self.status_line
        )
    }
}
