//! Admin form parsing: raw string fields in, typed write payloads out.
//!
//! Fields arrive as the user typed them. Required fields are trimmed and must
//! be non-empty; optional ones become `None` when blank so updates clear the
//! column instead of storing "".

use catalog_store::{
    AdType, AdvertisementPayload, CompetitionPayload, LiveTvPayload, Match, MatchPayload, MatchStatus,
    TeamPayload,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;

use crate::error::FormError;

/// Popup delay used when the form leaves it empty.
pub const DEFAULT_AD_DELAY_SECS: u32 = 5;

const DATETIME_LOCAL: &str = "%Y-%m-%dT%H:%M";
const DATETIME_LOCAL_SECS: &str = "%Y-%m-%dT%H:%M:%S";

// ── Field helpers ────────────────────────────────────────────────────────────

fn required(field: &'static str, value: &str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::Required(field));
    }
    Ok(value.to_string())
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn optional_int(field: &'static str, value: &str) -> Result<Option<i32>, FormError> {
    let Some(value) = optional(value) else {
        return Ok(None);
    };
    value
        .parse::<i32>()
        .map(Some)
        .map_err(|_| FormError::InvalidNumber { field, value })
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// RFC 3339, or the `datetime-local` shape (`2026-06-11T19:00`) read as UTC.
pub fn parse_kickoff(value: &str) -> Result<DateTime<Utc>, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::Required("kickoff_time"));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, DATETIME_LOCAL)
        .or_else(|_| NaiveDateTime::parse_from_str(value, DATETIME_LOCAL_SECS))
        .map(|naive| naive.and_utc())
        .map_err(|_| FormError::InvalidKickoff(value.to_string()))
}

/// Field lookup for `from_fields`; missing keys read as empty.
fn field<'a>(fields: &'a HashMap<String, String>, key: &str) -> &'a str {
    fields.get(key).map(String::as_str).unwrap_or("")
}

// ── Matches ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchForm {
    pub team_a_id:      String,
    pub team_b_id:      String,
    pub competition_id: String,
    pub kickoff_time:   String,
    pub status:         String,
    pub score_team_a:   String,
    pub score_team_b:   String,
    pub stream_url:     String,
    pub highlights_url: String,
}

impl MatchForm {
    /// Edit-dialog prefill.
    pub fn from_match(m: &Match) -> Self {
        let score = |s: Option<i32>| s.map(|v| v.to_string()).unwrap_or_default();
        Self {
            team_a_id:      m.team_a_id.clone(),
            team_b_id:      m.team_b_id.clone(),
            competition_id: m.competition_id.clone(),
            kickoff_time:   m.kickoff_time.format(DATETIME_LOCAL).to_string(),
            status:         m.status.as_str().to_string(),
            score_team_a:   score(m.score_team_a),
            score_team_b:   score(m.score_team_b),
            stream_url:     m.stream_url.clone().unwrap_or_default(),
            highlights_url: m.highlights_url.clone().unwrap_or_default(),
        }
    }

    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        Self {
            team_a_id:      field(fields, "team_a_id").to_string(),
            team_b_id:      field(fields, "team_b_id").to_string(),
            competition_id: field(fields, "competition_id").to_string(),
            kickoff_time:   field(fields, "kickoff_time").to_string(),
            status:         field(fields, "status").to_string(),
            score_team_a:   field(fields, "score_team_a").to_string(),
            score_team_b:   field(fields, "score_team_b").to_string(),
            stream_url:     field(fields, "stream_url").to_string(),
            highlights_url: field(fields, "highlights_url").to_string(),
        }
    }

    pub fn parse(&self) -> Result<MatchPayload, FormError> {
        // new matches default to upcoming, as the create dialog does
        let status = match optional(&self.status) {
            Some(s) => s.parse::<MatchStatus>().map_err(FormError::InvalidChoice)?,
            None => MatchStatus::Upcoming,
        };
        Ok(MatchPayload {
            team_a_id:      required("team_a_id", &self.team_a_id)?,
            team_b_id:      required("team_b_id", &self.team_b_id)?,
            competition_id: required("competition_id", &self.competition_id)?,
            kickoff_time:   parse_kickoff(&self.kickoff_time)?,
            status,
            score_team_a:   optional_int("score_team_a", &self.score_team_a)?,
            score_team_b:   optional_int("score_team_b", &self.score_team_b)?,
            stream_url:     optional(&self.stream_url),
            highlights_url: optional(&self.highlights_url),
        })
    }
}

// ── Teams / competitions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamForm {
    pub name:    String,
    pub country: String,
    pub flag:    String,
    pub logo:    String,
}

impl TeamForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        Self {
            name:    field(fields, "name").to_string(),
            country: field(fields, "country").to_string(),
            flag:    field(fields, "flag").to_string(),
            logo:    field(fields, "logo").to_string(),
        }
    }

    pub fn parse(&self) -> Result<TeamPayload, FormError> {
        Ok(TeamPayload {
            name:    required("name", &self.name)?,
            country: required("country", &self.country)?,
            flag:    required("flag", &self.flag)?,
            logo:    optional(&self.logo),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompetitionForm {
    pub name: String,
    pub logo: String,
}

impl CompetitionForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        Self {
            name: field(fields, "name").to_string(),
            logo: field(fields, "logo").to_string(),
        }
    }

    pub fn parse(&self) -> Result<CompetitionPayload, FormError> {
        Ok(CompetitionPayload {
            name: required("name", &self.name)?,
            logo: optional(&self.logo),
        })
    }
}

// ── Live TV ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveTvForm {
    pub name:       String,
    pub category:   String,
    pub logo:       String,
    pub stream_url: String,
    pub is_premium: String,
    pub country:    String,
    pub language:   String,
}

impl LiveTvForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        Self {
            name:       field(fields, "name").to_string(),
            category:   field(fields, "category").to_string(),
            logo:       field(fields, "logo").to_string(),
            stream_url: field(fields, "stream_url").to_string(),
            is_premium: field(fields, "is_premium").to_string(),
            country:    field(fields, "country").to_string(),
            language:   field(fields, "language").to_string(),
        }
    }

    pub fn parse(&self) -> Result<LiveTvPayload, FormError> {
        Ok(LiveTvPayload {
            name:       required("name", &self.name)?,
            category:   required("category", &self.category)?,
            logo:       optional(&self.logo),
            stream_url: required("stream_url", &self.stream_url)?,
            is_premium: truthy(&self.is_premium),
            country:    optional(&self.country),
            language:   optional(&self.language),
        })
    }
}

// ── Advertisements ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct AdForm {
    pub name:          String,
    pub ad_type:       String,
    pub content:       String,
    pub target_page:   String,
    pub delay_seconds: String,
    pub is_active:     String,
    pub click_url:     String,
}

impl Default for AdForm {
    fn default() -> Self {
        Self {
            name:          String::new(),
            ad_type:       "popup".into(),
            content:       String::new(),
            target_page:   String::new(),
            delay_seconds: DEFAULT_AD_DELAY_SECS.to_string(),
            is_active:     "true".into(),
            click_url:     String::new(),
        }
    }
}

impl AdForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let or_default = |key: &str, fallback: String| {
            fields.get(key).cloned().unwrap_or(fallback)
        };
        Self {
            name:          field(fields, "name").to_string(),
            ad_type:       or_default("type", defaults.ad_type),
            content:       field(fields, "content").to_string(),
            target_page:   field(fields, "target_page").to_string(),
            delay_seconds: field(fields, "delay_seconds").to_string(),
            is_active:     or_default("is_active", defaults.is_active),
            click_url:     field(fields, "click_url").to_string(),
        }
    }

    pub fn parse(&self) -> Result<AdvertisementPayload, FormError> {
        let ad_type = self.ad_type.parse::<AdType>().map_err(FormError::InvalidChoice)?;
        let delay_seconds = match optional(&self.delay_seconds) {
            None => DEFAULT_AD_DELAY_SECS,
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| FormError::InvalidNumber { field: "delay_seconds", value })?,
        };
        Ok(AdvertisementPayload {
            name:          required("name", &self.name)?,
            ad_type,
            content:       required("content", &self.content)?,
            target_page:   optional(&self.target_page),
            delay_seconds: Some(delay_seconds),
            is_active:     truthy(&self.is_active),
            click_url:     optional(&self.click_url),
        })
    }
}
