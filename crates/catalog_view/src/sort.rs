use catalog_store::{Match, MatchStatus};
use std::cmp::Ordering;

fn status_rank(status: MatchStatus) -> u8 {
    match status {
        MatchStatus::Live     => 0,
        MatchStatus::Upcoming => 1,
        MatchStatus::Finished => 2,
    }
}

/// Total order: live < upcoming < finished; upcoming soonest first, finished
/// most recent first, everything else by kickoff; id breaks remaining ties.
pub fn compare_matches(a: &Match, b: &Match) -> Ordering {
    status_rank(a.status)
        .cmp(&status_rank(b.status))
        .then_with(|| match a.status {
            MatchStatus::Finished => b.kickoff_time.cmp(&a.kickoff_time),
            _                     => a.kickoff_time.cmp(&b.kickoff_time),
        })
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_matches(matches: &mut [Match]) {
    matches.sort_by(compare_matches);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use serde_json::json;

    fn fixture(id: &str, status: &str, kickoff: &str) -> Match {
        serde_json::from_value(json!({
            "id": id, "team_a_id": "a", "team_b_id": "b", "competition_id": "c",
            "kickoff_time": kickoff, "status": status
        }))
        .unwrap()
    }

    fn catalog() -> Vec<Match> {
        vec![
            fixture("f-old",  "finished", "2026-06-01T18:00:00Z"),
            fixture("u-late", "upcoming", "2026-06-20T18:00:00Z"),
            fixture("l-2",    "live",     "2026-06-11T19:00:00Z"),
            fixture("f-new",  "finished", "2026-06-10T18:00:00Z"),
            fixture("u-soon", "upcoming", "2026-06-12T18:00:00Z"),
            fixture("l-1",    "live",     "2026-06-11T18:00:00Z"),
            fixture("u-tie-b","upcoming", "2026-06-15T18:00:00Z"),
            fixture("u-tie-a","upcoming", "2026-06-15T18:00:00Z"),
        ]
    }

    fn ids(matches: &[Match]) -> Vec<&str> {
        matches.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn live_then_upcoming_then_finished() {
        let mut all = catalog();
        sort_matches(&mut all);
        assert_eq!(
            ids(&all),
            vec!["l-1", "l-2", "u-soon", "u-tie-a", "u-tie-b", "u-late", "f-new", "f-old"]
        );
    }

    #[test]
    fn order_is_independent_of_input_permutation() {
        let mut expected = catalog();
        sort_matches(&mut expected);

        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let mut shuffled = catalog();
            shuffled.shuffle(&mut rng);
            sort_matches(&mut shuffled);
            assert_eq!(ids(&shuffled), ids(&expected));
        }
    }

    #[test]
    fn reversed_input_sorts_the_same() {
        let mut expected = catalog();
        sort_matches(&mut expected);
        let mut reversed = catalog();
        reversed.reverse();
        sort_matches(&mut reversed);
        assert_eq!(ids(&reversed), ids(&expected));
    }
}
