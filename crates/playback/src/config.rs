use std::time::Duration;

use crate::locator::AlternateRules;

pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_AUTO_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Window for `videoPlaying` after every entry into Loading.
    pub watchdog:         Duration,
    /// Consecutive automatic source switches before waiting for the user.
    pub max_auto_retries: u32,
    /// Embed player page; `None` embeds locators directly.
    pub player_page:      Option<String>,
    pub alternates:       AlternateRules,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            watchdog:         DEFAULT_WATCHDOG,
            max_auto_retries: DEFAULT_MAX_AUTO_RETRIES,
            player_page:      None,
            alternates:       AlternateRules::default(),
        }
    }
}

impl PlayerConfig {
    /// STREAMGOAL_WATCHDOG_SECS, STREAMGOAL_MAX_AUTO_RETRIES,
    /// STREAMGOAL_PLAYER_PAGE, STREAMGOAL_ALT_SUBST, STREAMGOAL_ALT_TEMPLATE.
    pub fn from_env() -> Self {
        let watchdog_secs = std::env::var("STREAMGOAL_WATCHDOG_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_WATCHDOG);
        let max_auto_retries = std::env::var("STREAMGOAL_MAX_AUTO_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_AUTO_RETRIES);
        let player_page = std::env::var("STREAMGOAL_PLAYER_PAGE")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let alternates = AlternateRules::parse(
            std::env::var("STREAMGOAL_ALT_SUBST").ok().as_deref(),
            std::env::var("STREAMGOAL_ALT_TEMPLATE").ok().as_deref(),
        );

        Self { watchdog: watchdog_secs, max_auto_retries, player_page, alternates }
    }
}
