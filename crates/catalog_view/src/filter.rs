use catalog_store::{LiveTv, Match, MatchStatus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTab {
    #[default]
    All,
    Live,
    Upcoming,
    Finished,
}

impl StatusTab {
    /// `/live`, `/upcoming`, `/finished`; every other route shows all.
    pub fn from_route(route: &str) -> Self {
        match route.trim_end_matches('/') {
            "/live"     => StatusTab::Live,
            "/upcoming" => StatusTab::Upcoming,
            "/finished" => StatusTab::Finished,
            _           => StatusTab::All,
        }
    }

    pub fn status(&self) -> Option<MatchStatus> {
        match self {
            StatusTab::All      => None,
            StatusTab::Live     => Some(MatchStatus::Live),
            StatusTab::Upcoming => Some(MatchStatus::Upcoming),
            StatusTab::Finished => Some(MatchStatus::Finished),
        }
    }

    pub fn admits(&self, status: MatchStatus) -> bool {
        self.status().map_or(true, |s| s == status)
    }
}

impl FromStr for StatusTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(StatusTab::All),
            other      => other.parse::<MatchStatus>().map(|status| match status {
                MatchStatus::Live     => StatusTab::Live,
                MatchStatus::Upcoming => StatusTab::Upcoming,
                MatchStatus::Finished => StatusTab::Finished,
            }),
        }
    }
}

// ── Matches ──────────────────────────────────────────────────────────────────

/// Conjunction of tab, free-text query and competition selector.
/// An empty query or `None` competition admits everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFilter {
    pub tab:         StatusTab,
    pub query:       String,
    pub competition: Option<String>,
}

impl MatchFilter {
    pub fn admits(&self, m: &Match) -> bool {
        self.tab.admits(m.status) && self.matches_query(m) && self.matches_competition(m)
    }

    fn matches_query(&self, m: &Match) -> bool {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let mut hay = [m.team_a.as_ref(), m.team_b.as_ref()]
            .into_iter()
            .flatten()
            .flat_map(|t| [t.name.as_str(), t.country.as_str()])
            .chain(m.competition_name());

        hay.any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_competition(&self, m: &Match) -> bool {
        match self.competition.as_deref() {
            None | Some("all") => true,
            Some(name)         => m.competition_name() == Some(name),
        }
    }
}

pub fn filter_matches<'a>(matches: &'a [Match], filter: &MatchFilter) -> Vec<&'a Match> {
    matches.iter().filter(|m| filter.admits(m)).collect()
}

/// Distinct competition names in first-seen order.
pub fn competitions_of(matches: &[Match]) -> Vec<String> {
    unique(matches.iter().filter_map(|m| m.competition_name()))
}

// ── Channels ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelFilter {
    pub query:    String,
    pub category: Option<String>,
}

impl ChannelFilter {
    pub fn admits(&self, tv: &LiveTv) -> bool {
        let category_ok = match self.category.as_deref() {
            None | Some("All") | Some("all") => true,
            Some(cat)                        => tv.category == cat,
        };
        if !category_ok {
            return false;
        }

        let needle = self.query.trim().to_lowercase();
        needle.is_empty()
            || [Some(tv.name.as_str()), tv.country.as_deref(), tv.language.as_deref()]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub fn filter_channels<'a>(channels: &'a [LiveTv], filter: &ChannelFilter) -> Vec<&'a LiveTv> {
    channels.iter().filter(|tv| filter.admits(tv)).collect()
}

pub fn categories_of(channels: &[LiveTv]) -> Vec<String> {
    unique(channels.iter().map(|tv| tv.category.as_str()).filter(|c| !c.is_empty()))
}

fn unique<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(id: &str, a: (&str, &str), b: (&str, &str), comp: &str, status: &str) -> Match {
        serde_json::from_value(json!({
            "id": id, "team_a_id": a.0, "team_b_id": b.0, "competition_id": comp,
            "kickoff_time": "2026-06-11T19:00:00Z", "status": status,
            "team_a": {"id": a.0, "name": a.0, "country": a.1},
            "team_b": {"id": b.0, "name": b.0, "country": b.1},
            "competition": {"id": comp, "name": comp},
        }))
        .unwrap()
    }

    fn catalog() -> Vec<Match> {
        vec![
            fixture("1", ("Argentina", "AR"), ("Brazil", "BR"), "World Cup", "live"),
            fixture("2", ("Mogadishu City", "Somalia"), ("Dekedda", "Somalia"), "Somali League", "upcoming"),
            fixture("3", ("France", "FR"), ("Spain", "ES"), "Nations League", "finished"),
        ]
    }

    fn ids(found: Vec<&Match>) -> Vec<&str> {
        found.into_iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let all = catalog();
        let f = MatchFilter { query: "arg".into(), ..Default::default() };
        assert_eq!(ids(filter_matches(&all, &f)), vec!["1"]);

        let f = MatchFilter { query: "LEAGUE".into(), ..Default::default() };
        assert_eq!(ids(filter_matches(&all, &f)), vec!["2", "3"]);
    }

    #[test]
    fn query_covers_team_country() {
        let all = catalog();
        let f = MatchFilter { query: "somal".into(), ..Default::default() };
        assert_eq!(ids(filter_matches(&all, &f)), vec!["2"]);
    }

    #[test]
    fn filters_are_a_conjunction() {
        let all = catalog();
        let f = MatchFilter {
            tab:         StatusTab::Finished,
            query:       "league".into(),
            competition: Some("Nations League".into()),
        };
        assert_eq!(ids(filter_matches(&all, &f)), vec!["3"]);

        let f = MatchFilter { tab: StatusTab::Live, query: "france".into(), competition: None };
        assert!(filter_matches(&all, &f).is_empty());
    }

    #[test]
    fn match_without_joins_only_passes_empty_query() {
        let bare: Match = serde_json::from_value(json!({
            "id": "x", "team_a_id": "a", "team_b_id": "b", "competition_id": "c",
            "kickoff_time": "2026-06-11T19:00:00Z", "status": "live"
        }))
        .unwrap();
        assert!(MatchFilter::default().admits(&bare));
        assert!(!MatchFilter { query: "tbd".into(), ..Default::default() }.admits(&bare));
    }

    #[test]
    fn route_maps_to_tab() {
        assert_eq!(StatusTab::from_route("/live"), StatusTab::Live);
        assert_eq!(StatusTab::from_route("/upcoming/"), StatusTab::Upcoming);
        assert_eq!(StatusTab::from_route("/finished"), StatusTab::Finished);
        assert_eq!(StatusTab::from_route("/matches"), StatusTab::All);
        assert_eq!("Live".parse::<StatusTab>(), Ok(StatusTab::Live));
        assert_eq!("".parse::<StatusTab>(), Ok(StatusTab::All));
    }

    #[test]
    fn competitions_are_unique_in_first_seen_order() {
        let mut all = catalog();
        all.push(fixture("4", ("Ghana", "GH"), ("Mali", "ML"), "World Cup", "upcoming"));
        assert_eq!(competitions_of(&all), vec!["World Cup", "Somali League", "Nations League"]);
    }

    #[test]
    fn channel_filter_by_category_and_language() {
        let tvs: Vec<LiveTv> = serde_json::from_value(json!([
            {"id": "1", "name": "Sports One", "category": "Sports", "stream_url": "a", "language": "Somali"},
            {"id": "2", "name": "News 24",    "category": "News",   "stream_url": "b", "country": "Kenya"},
            {"id": "3", "name": "Goal TV",    "category": "Sports", "stream_url": "c"},
        ]))
        .unwrap();

        assert_eq!(categories_of(&tvs), vec!["Sports", "News"]);

        let by_lang = ChannelFilter { query: "somali".into(), category: None };
        assert_eq!(filter_channels(&tvs, &by_lang).len(), 1);

        let sports = ChannelFilter { query: String::new(), category: Some("Sports".into()) };
        let names: Vec<_> = filter_channels(&tvs, &sports).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Sports One", "Goal TV"]);

        let kenya_sports = ChannelFilter { query: "kenya".into(), category: Some("Sports".into()) };
        assert!(filter_channels(&tvs, &kenya_sports).is_empty());
    }
}
