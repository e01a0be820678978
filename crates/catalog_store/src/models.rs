//! Catalog records as the remote store returns them.
//!
//! The client holds read-mostly copies. Optional fields are tolerated
//! regardless of match status; nothing here enforces the status/field pairing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// PostgREST sends `null` for empty nullable columns; read it as the default.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

// ── Tables ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Matches,
    Teams,
    Competitions,
    LiveTvs,
    Advertisements,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Matches        => "matches",
            Table::Teams          => "teams",
            Table::Competitions   => "competitions",
            Table::LiveTvs        => "live_tvs",
            Table::Advertisements => "advertisements",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Teams / competitions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id:      String,
    pub name:    String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flag:    String,   // emoji glyph
    #[serde(default)]
    pub logo:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id:   String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

// ── Matches ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Live,
    Upcoming,
    Finished,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Live     => "live",
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Finished => "finished",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live"     => Ok(MatchStatus::Live),
            "upcoming" => Ok(MatchStatus::Upcoming),
            "finished" => Ok(MatchStatus::Finished),
            other      => Err(format!("unknown match status '{other}'")),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id:             String,
    pub team_a_id:      String,
    pub team_b_id:      String,
    pub competition_id: String,
    pub kickoff_time:   DateTime<Utc>,
    pub status:         MatchStatus,
    #[serde(default)]
    pub score_team_a:   Option<i32>,
    #[serde(default)]
    pub score_team_b:   Option<i32>,
    #[serde(default)]
    pub stream_url:     Option<String>,
    #[serde(default)]
    pub highlights_url: Option<String>,
    // Read-time joins, never written back
    #[serde(default, skip_serializing)]
    pub team_a:         Option<Team>,
    #[serde(default, skip_serializing)]
    pub team_b:         Option<Team>,
    #[serde(default, skip_serializing)]
    pub competition:    Option<Competition>,
}

impl Match {
    pub fn team_a_name(&self) -> &str {
        self.team_a.as_ref().map(|t| t.name.as_str()).unwrap_or("TBD")
    }

    pub fn team_b_name(&self) -> &str {
        self.team_b.as_ref().map(|t| t.name.as_str()).unwrap_or("TBD")
    }

    pub fn competition_name(&self) -> Option<&str> {
        self.competition.as_ref().map(|c| c.name.as_str())
    }

    pub fn title(&self) -> String {
        format!("{} vs {}", self.team_a_name(), self.team_b_name())
    }

    /// Stream locator if present and non-blank.
    pub fn stream_locator(&self) -> Option<&str> {
        non_blank(self.stream_url.as_deref())
    }

    pub fn highlights_locator(&self) -> Option<&str> {
        non_blank(self.highlights_url.as_deref())
    }

    /// Scores only mean something once the match has started.
    pub fn score(&self) -> Option<(i32, i32)> {
        if self.status == MatchStatus::Upcoming {
            return None;
        }
        match (self.score_team_a, self.score_team_b) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}

// ── Live TV ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveTv {
    pub id:         String,
    pub name:       String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category:   String,
    #[serde(default)]
    pub logo:       Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stream_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_premium: bool,
    #[serde(default)]
    pub country:    Option<String>,
    #[serde(default)]
    pub language:   Option<String>,
}

impl LiveTv {
    pub fn stream_locator(&self) -> Option<&str> {
        non_blank(Some(self.stream_url.as_str()))
    }

    /// "Sports • English" style subtitle; language wins over country.
    pub fn subtitle(&self) -> String {
        let region = self
            .language
            .as_deref()
            .or(self.country.as_deref())
            .unwrap_or("");
        format!("{} • {}", self.category, region)
    }
}

// ── Advertisements ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdType {
    Popup,
    Banner,
    Video,
    Interstitial,
}

impl FromStr for AdType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "popup"        => Ok(AdType::Popup),
            "banner"       => Ok(AdType::Banner),
            "video"        => Ok(AdType::Video),
            "interstitial" => Ok(AdType::Interstitial),
            other          => Err(format!("unknown ad type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub id:            String,
    pub name:          String,
    #[serde(rename = "type")]
    pub ad_type:       AdType,
    /// Raw markup, rendered unescaped by the host.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content:       String,
    #[serde(default)]
    pub target_page:   Option<String>,
    #[serde(default)]
    pub delay_seconds: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active:     bool,
    #[serde(default)]
    pub click_url:     Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub impressions:   i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clicks:        i64,
}

// ── Write payloads ───────────────────────────────────────────────────────────
// No id, no joins. `None` is sent as JSON null so updates clear the column.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPayload {
    pub team_a_id:      String,
    pub team_b_id:      String,
    pub competition_id: String,
    pub kickoff_time:   DateTime<Utc>,
    pub status:         MatchStatus,
    pub score_team_a:   Option<i32>,
    pub score_team_b:   Option<i32>,
    pub stream_url:     Option<String>,
    pub highlights_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPayload {
    pub name:    String,
    pub country: String,
    pub flag:    String,
    pub logo:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionPayload {
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveTvPayload {
    pub name:       String,
    pub category:   String,
    pub logo:       Option<String>,
    pub stream_url: String,
    pub is_premium: bool,
    pub country:    Option<String>,
    pub language:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvertisementPayload {
    pub name:          String,
    #[serde(rename = "type")]
    pub ad_type:       AdType,
    pub content:       String,
    pub target_page:   Option<String>,
    pub delay_seconds: Option<u32>,
    pub is_active:     bool,
    pub click_url:     Option<String>,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn match_decodes_with_joins_and_missing_optionals() {
        let row = json!({
            "id": "m1",
            "team_a_id": "t1",
            "team_b_id": "t2",
            "competition_id": "c1",
            "kickoff_time": "2026-06-11T19:00:00+00:00",
            "status": "live",
            "team_a": { "id": "t1", "name": "Argentina", "country": "AR", "flag": "🇦🇷" },
            "competition": { "id": "c1", "name": "World Cup" }
        });

        let m: Match = serde_json::from_value(row).unwrap();
        assert_eq!(m.status, MatchStatus::Live);
        assert_eq!(m.team_a_name(), "Argentina");
        assert_eq!(m.team_b_name(), "TBD");
        assert_eq!(m.competition_name(), Some("World Cup"));
        assert!(m.stream_locator().is_none());
        assert!(m.score().is_none());
    }

    #[test]
    fn blank_stream_url_is_not_a_locator() {
        let row = json!({
            "id": "m1", "team_a_id": "a", "team_b_id": "b", "competition_id": "c",
            "kickoff_time": "2026-06-11T19:00:00Z", "status": "live",
            "stream_url": "   "
        });
        let m: Match = serde_json::from_value(row).unwrap();
        assert_eq!(m.stream_locator(), None);
    }

    #[test]
    fn joins_are_not_serialized_back() {
        let row = json!({
            "id": "m1", "team_a_id": "a", "team_b_id": "b", "competition_id": "c",
            "kickoff_time": "2026-06-11T19:00:00Z", "status": "finished",
            "score_team_a": 2, "score_team_b": 1,
            "team_a": { "id": "a", "name": "A" }
        });
        let m: Match = serde_json::from_value(row).unwrap();
        assert_eq!(m.score(), Some((2, 1)));
        let back = serde_json::to_value(&m).unwrap();
        assert!(back.get("team_a").is_none());
    }

    #[test]
    fn advertisement_type_uses_wire_name() {
        let ad: Advertisement = serde_json::from_value(json!({
            "id": "ad1", "name": "Promo", "type": "popup", "content": "<b>hi</b>",
            "is_active": true
        }))
        .unwrap();
        assert_eq!(ad.ad_type, AdType::Popup);
        assert_eq!(ad.impressions, 0);
        assert_eq!("Banner".parse::<AdType>(), Ok(AdType::Banner));
    }

    #[test]
    fn null_columns_read_as_defaults() {
        let row = json!({
            "id": "m1", "team_a_id": "a", "team_b_id": "b", "competition_id": "c",
            "kickoff_time": "2026-06-11T19:00:00Z", "status": "upcoming",
            "team_a": { "id": "a", "name": "Kenya", "country": null, "flag": null, "logo": null }
        });
        let m: Match = serde_json::from_value(row).unwrap();
        let team = m.team_a.unwrap();
        assert_eq!(team.flag, "");
        assert_eq!(team.country, "");

        let tv: LiveTv = serde_json::from_value(json!({
            "id": "1", "name": "Sports One", "category": null, "stream_url": null, "is_premium": null
        }))
        .unwrap();
        assert_eq!(tv.stream_locator(), None);
        assert!(!tv.is_premium);

        let ad: Advertisement = serde_json::from_value(json!({
            "id": "ad1", "name": "Promo", "type": "banner", "content": null,
            "is_active": null, "impressions": null, "clicks": null
        }))
        .unwrap();
        assert_eq!(ad.content, "");
        assert_eq!((ad.impressions, ad.clicks), (0, 0));
    }

    #[test]
    fn channel_subtitle_prefers_language() {
        let tv = LiveTv {
            id: "1".into(),
            name: "Sports One".into(),
            category: "Sports".into(),
            logo: None,
            stream_url: "https://x/y.m3u8".into(),
            is_premium: false,
            country: Some("UK".into()),
            language: Some("English".into()),
        };
        assert_eq!(tv.subtitle(), "Sports • English");
    }
}
