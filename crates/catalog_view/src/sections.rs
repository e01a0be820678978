use catalog_store::{Match, MatchStatus};
use serde::Serialize;

use crate::sort::compare_matches;

pub const HOME_SECTION_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, Serialize)]
pub struct HomeSections {
    pub live:     Vec<Match>,
    pub upcoming: Vec<Match>,
    pub finished: Vec<Match>,
}

impl HomeSections {
    pub fn is_empty(&self) -> bool {
        self.live.is_empty() && self.upcoming.is_empty() && self.finished.is_empty()
    }
}

/// Home page split: every live match, the next five upcoming, the five most
/// recently finished.
pub fn home_sections(matches: &[Match]) -> HomeSections {
    let mut sorted = matches.to_vec();
    sorted.sort_by(compare_matches);

    let mut sections = HomeSections::default();
    for m in sorted {
        match m.status {
            MatchStatus::Live => sections.live.push(m),
            MatchStatus::Upcoming if sections.upcoming.len() < HOME_SECTION_LIMIT => sections.upcoming.push(m),
            MatchStatus::Finished if sections.finished.len() < HOME_SECTION_LIMIT => sections.finished.push(m),
            _ => {}
        }
    }
    sections
}

/// Favorites page: fetched rows restricted to the favorite set, sorted.
/// Ids that no longer exist simply do not show up.
pub fn favorite_matches(matches: &[Match], favorite_ids: &[String]) -> Vec<Match> {
    let mut out: Vec<Match> = matches
        .iter()
        .filter(|m| favorite_ids.iter().any(|id| id == &m.id))
        .cloned()
        .collect();
    out.sort_by(compare_matches);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(id: &str, status: &str, day: u32) -> Match {
        serde_json::from_value(json!({
            "id": id, "team_a_id": "a", "team_b_id": "b", "competition_id": "c",
            "kickoff_time": format!("2026-06-{day:02}T18:00:00Z"), "status": status
        }))
        .unwrap()
    }

    #[test]
    fn sections_cap_upcoming_and_finished() {
        let mut all = vec![fixture("live-1", "live", 11), fixture("live-2", "live", 11)];
        for day in 1..=7 {
            all.push(fixture(&format!("fin-{day}"), "finished", day));
            all.push(fixture(&format!("up-{day}"), "upcoming", 12 + day));
        }

        let s = home_sections(&all);
        assert_eq!(s.live.len(), 2);
        assert_eq!(s.upcoming.len(), HOME_SECTION_LIMIT);
        assert_eq!(s.upcoming[0].id, "up-1");
        assert_eq!(s.finished.len(), HOME_SECTION_LIMIT);
        assert_eq!(s.finished[0].id, "fin-7");
        assert_eq!(s.finished[4].id, "fin-3");
    }

    #[test]
    fn favorites_skip_missing_ids() {
        let all = vec![fixture("a", "finished", 1), fixture("b", "live", 2), fixture("c", "upcoming", 20)];
        let favs = vec!["c".to_string(), "gone".to_string(), "b".to_string()];
        let ids: Vec<_> = favorite_matches(&all, &favs).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(home_sections(&[]).is_empty());
    }
}
