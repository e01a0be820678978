//! How a candidate locator is handed to the surface.
//!
//! `.m3u8` (path suffix, query ignored) → native HLS decoding in the surface.
//! Everything else is treated as an embeddable page, optionally wrapped in a
//! configured player page that receives the display metadata.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use url::Url;

use crate::locator::{embed_locator, StreamMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Hls,
    Embed,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Hls   => "hls",
            StrategyKind::Embed => "embed",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hls"   => Ok(StrategyKind::Hls),
            "embed" => Ok(StrategyKind::Embed),
            other   => Err(format!("unknown playback strategy '{other}'")),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait PlaybackStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether this strategy can play `locator` at all.
    fn accepts(&self, locator: &str) -> bool;

    /// What the surface is navigated to for `locator`.
    fn surface_src(&self, locator: &str, meta: &StreamMeta) -> String;
}

pub struct HlsStrategy;

impl PlaybackStrategy for HlsStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hls
    }

    fn accepts(&self, locator: &str) -> bool {
        is_hls_locator(locator)
    }

    fn surface_src(&self, locator: &str, _meta: &StreamMeta) -> String {
        locator.to_string()
    }
}

pub struct EmbedStrategy {
    pub player_page: Option<String>,
}

impl PlaybackStrategy for EmbedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Embed
    }

    fn accepts(&self, _locator: &str) -> bool {
        true
    }

    fn surface_src(&self, locator: &str, meta: &StreamMeta) -> String {
        let Some(page) = self.player_page.as_deref() else {
            return locator.to_string();
        };
        embed_locator(page, locator, meta).unwrap_or_else(|e| {
            warn!("player page {page:?} unusable ({e}), embedding locator directly");
            locator.to_string()
        })
    }
}

/// Ordered strategy table; the first strategy that accepts a locator wins.
pub struct StrategySet {
    strategies: Vec<Box<dyn PlaybackStrategy>>,
}

impl StrategySet {
    pub fn new(player_page: Option<String>) -> Self {
        Self {
            strategies: vec![Box::new(HlsStrategy), Box::new(EmbedStrategy { player_page })],
        }
    }

    pub fn select(&self, locator: &str) -> &dyn PlaybackStrategy {
        self.strategies
            .iter()
            .find(|s| s.accepts(locator))
            .map(|s| s.as_ref())
            .unwrap_or(&FALLBACK_EMBED)
    }
}

static FALLBACK_EMBED: EmbedStrategy = EmbedStrategy { player_page: None };

pub fn is_hls_locator(locator: &str) -> bool {
    let path = match Url::parse(locator) {
        Ok(url) => url.path().to_string(),
        Err(_)  => locator.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.to_ascii_lowercase().ends_with(".m3u8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn m3u8_suffix_selects_hls_ignoring_query() {
        assert!(is_hls_locator("https://cdn.example/live/master.m3u8"));
        assert!(is_hls_locator("https://cdn.example/live/MASTER.M3U8?token=abc"));
        assert!(is_hls_locator("/local/stream.m3u8#t=10"));
        assert!(!is_hls_locator("https://cdn.example/watch?file=a.m3u8"));
        assert!(!is_hls_locator("https://yow.riix.link/asal/musalsal/"));
    }

    #[test]
    fn set_picks_first_accepting_strategy() {
        let set = StrategySet::new(Some("https://player.example/embed".into()));
        assert_eq!(set.select("https://a.example/x.m3u8").kind(), StrategyKind::Hls);

        let embed = set.select("https://a.example/page");
        assert_eq!(embed.kind(), StrategyKind::Embed);
        let src = embed.surface_src("https://a.example/page", &StreamMeta::default());
        assert!(src.starts_with("https://player.example/embed?src=https%3A%2F%2Fa.example%2Fpage"));
    }

    #[test]
    fn hls_surface_gets_the_raw_locator() {
        let set = StrategySet::new(Some("https://player.example/embed".into()));
        let loc = "https://a.example/x.m3u8";
        assert_eq!(set.select(loc).surface_src(loc, &StreamMeta::default()), loc);
    }

    #[test]
    fn unusable_player_page_falls_back_to_direct_embed() {
        let s = EmbedStrategy { player_page: Some("::not a url".into()) };
        assert_eq!(s.surface_src("https://a.example/p", &StreamMeta::default()), "https://a.example/p");
        assert_eq!("hls".parse::<StrategyKind>(), Ok(StrategyKind::Hls));
    }
}
