//! What the overlay shows for one fetch result. Pure; randomness is injected.

use catalog_store::{AdType, Advertisement, RemoteError};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

pub const FALLBACK_BANNER_ID: &str = "default-banner";
pub const FALLBACK_POPUP_ID: &str = "default-popup";
pub const FALLBACK_CLICK_URL: &str = "https://t.me/streamgoal";
pub const DEFAULT_POPUP_DELAY: Duration = Duration::from_secs(5);

/// Built-in slots are never counted remotely.
pub fn is_fallback(ad_id: &str) -> bool {
    ad_id == FALLBACK_BANNER_ID || ad_id == FALLBACK_POPUP_ID
}

pub fn fallback_banner() -> Advertisement {
    Advertisement {
        id:            FALLBACK_BANNER_ID.to_string(),
        name:          "Default Banner".to_string(),
        ad_type:       AdType::Banner,
        content:       r#"<div class="flex-1 text-center">🔥 Live Football - Free HD Streams - No Login Required!</div>"#
            .to_string(),
        target_page:   None,
        delay_seconds: None,
        is_active:     true,
        click_url:     None,
        impressions:   0,
        clicks:        0,
    }
}

pub fn fallback_popup() -> Advertisement {
    Advertisement {
        id:            FALLBACK_POPUP_ID.to_string(),
        name:          "Default Popup".to_string(),
        ad_type:       AdType::Popup,
        content:       concat!(
            r#"<div class="ad-content">"#,
            r#"<h3>Enjoying the Match?</h3>"#,
            r#"<p>Follow Us on Telegram for More Free Streams and Exclusive Content!</p>"#,
            r#"<button>Join Now</button>"#,
            r#"</div>"#,
        )
        .to_string(),
        target_page:   None,
        delay_seconds: Some(5),
        is_active:     true,
        click_url:     Some(FALLBACK_CLICK_URL.to_string()),
        impressions:   0,
        clicks:        0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledPopup {
    pub ad:    Advertisement,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPlan {
    /// Always present: the overlay is never blank.
    pub banner: Advertisement,
    pub popup:  Option<ScheduledPopup>,
}

/// - fetch failed        → fallback banner only
/// - no rows             → fallback banner + fallback popup
/// - rows                → first banner (or fallback), random popup if any
pub fn plan_overlay<R: Rng + ?Sized>(fetched: Result<Vec<Advertisement>, RemoteError>, rng: &mut R) -> OverlayPlan {
    let rows = match fetched {
        Ok(rows) => rows,
        Err(_) => return OverlayPlan { banner: fallback_banner(), popup: None },
    };

    let active: Vec<Advertisement> = rows.into_iter().filter(|ad| ad.is_active).collect();
    if active.is_empty() {
        return OverlayPlan { banner: fallback_banner(), popup: Some(schedule(fallback_popup())) };
    }

    let banner = active
        .iter()
        .find(|ad| ad.ad_type == AdType::Banner)
        .cloned()
        .unwrap_or_else(fallback_banner);

    let popups: Vec<&Advertisement> = active.iter().filter(|ad| ad.ad_type == AdType::Popup).collect();
    let popup = popups.choose(rng).map(|ad| schedule((*ad).clone()));

    OverlayPlan { banner, popup }
}

/// Unset or zero delay means the default five seconds.
fn schedule(ad: Advertisement) -> ScheduledPopup {
    let delay = match ad.delay_seconds {
        Some(secs) if secs > 0 => Duration::from_secs(u64::from(secs)),
        _ => DEFAULT_POPUP_DELAY,
    };
    ScheduledPopup { ad, delay }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn ad(id: &str, ad_type: &str, delay: Option<u32>) -> Advertisement {
        serde_json::from_value(json!({
            "id": id, "name": id, "type": ad_type, "content": "<b>x</b>",
            "is_active": true, "delay_seconds": delay, "click_url": format!("https://ads.example/{id}")
        }))
        .unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn zero_rows_show_fallback_banner_and_popup() {
        let plan = plan_overlay(Ok(vec![]), &mut rng());
        assert_eq!(plan.banner.id, FALLBACK_BANNER_ID);
        let popup = plan.popup.unwrap();
        assert_eq!(popup.ad.click_url.as_deref(), Some(FALLBACK_CLICK_URL));
        assert_eq!(popup.delay, DEFAULT_POPUP_DELAY);
    }

    #[test]
    fn fetch_failure_shows_fallback_banner_only() {
        let plan = plan_overlay(Err(RemoteError::other("offline")), &mut rng());
        assert_eq!(plan.banner.id, FALLBACK_BANNER_ID);
        assert!(plan.popup.is_none());
    }

    #[test]
    fn first_banner_wins() {
        let rows = vec![ad("p1", "popup", Some(3)), ad("b1", "banner", None), ad("b2", "banner", None)];
        let plan = plan_overlay(Ok(rows), &mut rng());
        assert_eq!(plan.banner.id, "b1");
        let popup = plan.popup.unwrap();
        assert_eq!(popup.ad.id, "p1");
        assert_eq!(popup.delay, Duration::from_secs(3));
    }

    #[test]
    fn popup_only_rows_keep_a_banner_on_screen() {
        let plan = plan_overlay(Ok(vec![ad("p1", "popup", Some(0))]), &mut rng());
        assert_eq!(plan.banner.id, FALLBACK_BANNER_ID);
        assert_eq!(plan.popup.unwrap().delay, DEFAULT_POPUP_DELAY);
    }

    #[test]
    fn popup_choice_stays_within_qualifying_set() {
        let rows = vec![ad("p1", "popup", None), ad("v1", "video", None), ad("p2", "popup", None)];
        let mut r = rng();
        for _ in 0..20 {
            let id = plan_overlay(Ok(rows.clone()), &mut r).popup.unwrap().ad.id;
            assert!(id == "p1" || id == "p2");
        }
        assert!(is_fallback("default-popup") && !is_fallback("p1"));
    }
}
