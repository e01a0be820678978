//! Playback state machine. Pure: inputs in, effects out, no clocks, no I/O.
//!
//!   Idle ──mount──▶ Loading ──videoPlaying──▶ Playing
//!                    │  ▲                        │
//!      watchdog /    │  │ refresh / switch /     │ videoError
//!      videoError    ▼  │ auto switch            ▼
//!                    Error ◀─────────────────────┘
//!
//!   Idle ──mount (no locator)──▶ Unavailable   (terminal)
//!
//! Every entry into Loading bumps `generation` and arms a watchdog tagged
//! with it. A watchdog whose generation is not current is ignored.

use serde::Serialize;
use std::time::Duration;

use crate::config::PlayerConfig;
use crate::locator::{cache_busted, CandidateList, StreamDescriptor};
use crate::signal::{HostCommand, SurfaceSignal};
use crate::strategy::{StrategyKind, StrategySet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Idle,
    Loading,
    Playing,
    Error,
    Unavailable,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Idle        => "idle",
            PlayerState::Loading     => "loading",
            PlayerState::Playing     => "playing",
            PlayerState::Error       => "error",
            PlayerState::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Mount,
    VideoPlaying,
    VideoError,
    Watchdog,
    Refresh,
    Switch,
    Select,
    AutoSwitch,
}

impl Cause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cause::Mount        => "mount",
            Cause::VideoPlaying => "video_playing",
            Cause::VideoError   => "video_error",
            Cause::Watchdog     => "watchdog",
            Cause::Refresh      => "refresh",
            Cause::Switch       => "switch",
            Cause::Select       => "select",
            Cause::AutoSwitch   => "auto_switch",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Mount,
    Signal(SurfaceSignal),
    WatchdogFired { generation: u64 },
    Refresh,
    SwitchSource,
    SelectSource(usize),
    ToggleMute,
    ToggleFullscreen,
    Unmount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Transition { from: PlayerState, to: PlayerState, cause: Cause },
    /// Replaces any pending watchdog.
    StartWatchdog { generation: u64, after: Duration },
    CancelWatchdog,
    Send(HostCommand),
    SetFullscreen(bool),
}

/// A candidate resolved against the strategy table at mount time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedSource {
    pub locator:  String,
    pub src:      String,
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub state:        PlayerState,
    pub locator:      Option<String>,
    pub strategy:     Option<StrategyKind>,
    pub source_index: usize,
    pub source_count: usize,
    pub muted:        bool,
    pub fullscreen:   bool,
    pub auto_retries: u32,
    pub message:      Option<&'static str>,
    pub can_refresh:  bool,
    pub can_switch:   bool,
}

pub const MSG_UNAVAILABLE: &str = "Stream not available";
pub const MSG_LOADING: &str = "Loading stream...";
pub const MSG_ERROR: &str = "Stream failed to load. Try again or switch source.";

pub struct PlayerMachine {
    state:            PlayerState,
    candidates:       Option<CandidateList>,
    sources:          Vec<PreparedSource>,
    watchdog:         Duration,
    max_auto_retries: u32,
    generation:       u64,
    auto_retries:     u32,
    muted:            bool,
    fullscreen:       bool,
    unmounted:        bool,
}

impl PlayerMachine {
    pub fn new(descriptor: &StreamDescriptor, config: &PlayerConfig) -> Self {
        let candidates = CandidateList::derive(descriptor.primary.as_deref(), &config.alternates);
        Self::with_candidates(candidates, descriptor, config)
    }

    pub fn with_candidates(
        candidates: Option<CandidateList>,
        descriptor: &StreamDescriptor,
        config: &PlayerConfig,
    ) -> Self {
        let strategies = StrategySet::new(config.player_page.clone());
        let sources = candidates
            .iter()
            .flat_map(|c| c.locators())
            .map(|locator| {
                let strategy = strategies.select(locator);
                PreparedSource {
                    locator:  locator.clone(),
                    src:      strategy.surface_src(locator, &descriptor.meta),
                    strategy: strategy.kind(),
                }
            })
            .collect();

        Self {
            state: PlayerState::Idle,
            candidates,
            sources,
            watchdog: config.watchdog,
            max_auto_retries: config.max_auto_retries,
            generation: 0,
            auto_retries: 0,
            muted: false,
            fullscreen: false,
            unmounted: false,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn current_source(&self) -> Option<&PreparedSource> {
        let index = self.candidates.as_ref()?.index();
        self.sources.get(index)
    }

    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        let mut fx = Vec::new();
        if self.unmounted {
            return fx;
        }

        match input {
            Input::Mount => self.mount(&mut fx),

            Input::Signal(SurfaceSignal::Playing) => {
                if matches!(self.state, PlayerState::Loading | PlayerState::Error) {
                    self.auto_retries = 0;
                    fx.push(Effect::CancelWatchdog);
                    self.transition(PlayerState::Playing, Cause::VideoPlaying, &mut fx);
                }
            }

            Input::Signal(SurfaceSignal::Error) => {
                if matches!(self.state, PlayerState::Loading | PlayerState::Playing) {
                    self.enter_error(Cause::VideoError, &mut fx);
                }
            }

            Input::WatchdogFired { generation } => {
                if generation == self.generation && self.state == PlayerState::Loading {
                    self.enter_error(Cause::Watchdog, &mut fx);
                }
            }

            Input::Refresh => {
                if self.is_active() {
                    self.auto_retries = 0;
                    fx.push(Effect::Send(HostCommand::Retry));
                    self.enter_loading(Cause::Refresh, true, &mut fx);
                }
            }

            Input::SwitchSource => {
                if self.is_active() {
                    self.auto_retries = 0;
                    self.switch_to(None, Cause::Switch, &mut fx);
                }
            }

            Input::SelectSource(index) => {
                if self.is_active() && index < self.sources.len() {
                    self.auto_retries = 0;
                    self.switch_to(Some(index), Cause::Select, &mut fx);
                }
            }

            Input::ToggleMute => {
                if self.is_active() {
                    self.muted = !self.muted;
                    fx.push(Effect::Send(HostCommand::ToggleMute));
                }
            }

            Input::ToggleFullscreen => {
                if self.is_active() {
                    self.fullscreen = !self.fullscreen;
                    fx.push(Effect::SetFullscreen(self.fullscreen));
                }
            }

            Input::Unmount => {
                self.unmounted = true;
                fx.push(Effect::CancelWatchdog);
            }
        }
        fx
    }

    pub fn view(&self) -> PlayerView {
        let current = self.current_source();
        let active = self.is_active();
        PlayerView {
            state:        self.state,
            locator:      current.map(|s| s.locator.clone()),
            strategy:     current.map(|s| s.strategy),
            source_index: self.candidates.as_ref().map_or(0, |c| c.index()),
            source_count: self.sources.len(),
            muted:        self.muted,
            fullscreen:   self.fullscreen,
            auto_retries: self.auto_retries,
            message: match self.state {
                PlayerState::Unavailable => Some(MSG_UNAVAILABLE),
                PlayerState::Loading     => Some(MSG_LOADING),
                PlayerState::Error       => Some(MSG_ERROR),
                PlayerState::Idle | PlayerState::Playing => None,
            },
            can_refresh: active,
            can_switch:  active,
        }
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Mounted with a surface: Loading, Playing or Error.
    fn is_active(&self) -> bool {
        matches!(self.state, PlayerState::Loading | PlayerState::Playing | PlayerState::Error)
    }

    fn mount(&mut self, fx: &mut Vec<Effect>) {
        if self.state != PlayerState::Idle {
            return;
        }
        if self.sources.is_empty() {
            self.transition(PlayerState::Unavailable, Cause::Mount, fx);
            fx.push(Effect::Send(HostCommand::Unavailable));
        } else {
            self.enter_loading(Cause::Mount, false, fx);
        }
    }

    fn transition(&mut self, to: PlayerState, cause: Cause, fx: &mut Vec<Effect>) {
        let from = self.state;
        self.state = to;
        fx.push(Effect::Transition { from, to, cause });
    }

    fn enter_loading(&mut self, cause: Cause, bust: bool, fx: &mut Vec<Effect>) {
        let Some(source) = self.current_source().cloned() else {
            return;
        };
        self.generation += 1;
        self.transition(PlayerState::Loading, cause, fx);

        let src = if bust {
            cache_busted(&source.src, &self.generation.to_string())
        } else {
            source.src
        };
        fx.push(Effect::Send(HostCommand::Load { src, strategy: source.strategy, muted: self.muted }));
        fx.push(Effect::StartWatchdog { generation: self.generation, after: self.watchdog });
    }

    fn enter_error(&mut self, cause: Cause, fx: &mut Vec<Effect>) {
        fx.push(Effect::CancelWatchdog);
        self.transition(PlayerState::Error, cause, fx);

        if self.sources.len() > 1 && self.auto_retries < self.max_auto_retries {
            self.auto_retries += 1;
            self.switch_to(None, Cause::AutoSwitch, fx);
        }
    }

    /// `None` advances (wrapping). Landing on the same candidate reloads it
    /// with a fresh cache-bust token.
    fn switch_to(&mut self, index: Option<usize>, cause: Cause, fx: &mut Vec<Effect>) {
        let Some(candidates) = self.candidates.as_mut() else {
            return;
        };
        let before = candidates.index();
        let after = match index {
            Some(i) => {
                candidates.select(i);
                candidates.index()
            }
            None => candidates.advance(),
        };
        fx.push(Effect::Send(HostCommand::SourceChange { index: after }));
        self.enter_loading(cause, before == after, fx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{AlternateRules, StreamKind, StreamMeta};

    fn descriptor(primary: Option<&str>) -> StreamDescriptor {
        StreamDescriptor {
            kind:    StreamKind::Match,
            id:      "m1".into(),
            primary: primary.map(str::to_string),
            meta:    StreamMeta::default(),
        }
    }

    fn machine(primary: Option<&str>) -> PlayerMachine {
        PlayerMachine::new(&descriptor(primary), &PlayerConfig::default())
    }

    fn multi(n: usize) -> PlayerMachine {
        let locators = (0..n).map(|i| format!("https://s{i}.example/live.m3u8")).collect();
        PlayerMachine::with_candidates(
            CandidateList::from_locators(locators),
            &descriptor(Some("https://s0.example/live.m3u8")),
            &PlayerConfig::default(),
        )
    }

    fn loads(fx: &[Effect]) -> Vec<String> {
        fx.iter()
            .filter_map(|e| match e {
                Effect::Send(HostCommand::Load { src, .. }) => Some(src.clone()),
                _ => None,
            })
            .collect()
    }

    fn transitions(fx: &[Effect]) -> Vec<(PlayerState, PlayerState, Cause)> {
        fx.iter()
            .filter_map(|e| match e {
                Effect::Transition { from, to, cause } => Some((*from, *to, *cause)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_locator_never_enters_loading() {
        for primary in [None, Some(""), Some("   ")] {
            let mut m = machine(primary);
            let fx = m.handle(Input::Mount);
            assert_eq!(m.state(), PlayerState::Unavailable);
            assert_eq!(transitions(&fx), vec![(PlayerState::Idle, PlayerState::Unavailable, Cause::Mount)]);
            assert!(loads(&fx).is_empty());
            assert!(fx.contains(&Effect::Send(HostCommand::Unavailable)));
            assert!(!fx.iter().any(|e| matches!(e, Effect::StartWatchdog { .. })));

            // nothing the user or surface does revives it
            for input in [Input::Refresh, Input::SwitchSource, Input::Signal(SurfaceSignal::Playing)] {
                assert!(m.handle(input).is_empty());
            }
            assert_eq!(m.view().message, Some(MSG_UNAVAILABLE));
        }
    }

    #[test]
    fn mount_loads_primary_and_arms_watchdog() {
        let mut m = machine(Some("https://a.example/x"));
        let fx = m.handle(Input::Mount);
        assert_eq!(m.state(), PlayerState::Loading);
        assert_eq!(loads(&fx), vec!["https://a.example/x"]);
        assert!(fx.contains(&Effect::StartWatchdog { generation: 1, after: Duration::from_secs(10) }));
        assert_eq!(m.view().strategy, Some(StrategyKind::Embed));
    }

    #[test]
    fn playing_cancels_watchdog_and_stale_timeout_is_ignored() {
        let mut m = machine(Some("https://a.example/x.m3u8"));
        m.handle(Input::Mount);
        let gen = m.generation();

        let fx = m.handle(Input::Signal(SurfaceSignal::Playing));
        assert_eq!(m.state(), PlayerState::Playing);
        assert!(fx.contains(&Effect::CancelWatchdog));

        assert!(m.handle(Input::WatchdogFired { generation: gen }).is_empty());
        assert_eq!(m.state(), PlayerState::Playing);
    }

    #[test]
    fn older_generation_watchdog_cannot_error_a_reload() {
        let mut m = machine(Some("https://a.example/x"));
        m.handle(Input::Mount);
        let first = m.generation();
        m.handle(Input::Refresh);
        assert!(m.generation() > first);

        assert!(m.handle(Input::WatchdogFired { generation: first }).is_empty());
        assert_eq!(m.state(), PlayerState::Loading);
    }

    #[test]
    fn single_locator_live_match_errors_after_watchdog() {
        let mut m = machine(Some("https://a.example/x"));
        m.handle(Input::Mount);
        assert_eq!(m.state(), PlayerState::Loading);

        let fx = m.handle(Input::WatchdogFired { generation: m.generation() });
        assert_eq!(m.state(), PlayerState::Error);
        // one candidate: no automatic switching
        assert_eq!(transitions(&fx), vec![(PlayerState::Loading, PlayerState::Error, Cause::Watchdog)]);

        let view = m.view();
        assert!(view.can_refresh);
        assert!(view.can_switch);
        assert_eq!(view.message, Some(MSG_ERROR));

        // switch with one candidate still reloads the same locator
        let fx = m.handle(Input::SwitchSource);
        assert_eq!(m.state(), PlayerState::Loading);
        assert_eq!(m.view().source_index, 0);
        assert!(fx.contains(&Effect::Send(HostCommand::SourceChange { index: 0 })));
        assert_eq!(loads(&fx), vec![format!("https://a.example/x?_t={}", m.generation())]);
    }

    #[test]
    fn n_switches_return_to_original_locator() {
        let mut m = multi(3);
        m.handle(Input::Mount);
        let original = m.view().locator;

        for _ in 0..3 {
            m.handle(Input::SwitchSource);
        }
        assert_eq!(m.view().locator, original);
        assert_eq!(m.view().source_index, 0);
    }

    #[test]
    fn switching_clears_error_and_restarts_watchdog() {
        let mut m = multi(2);
        m.handle(Input::Mount);
        m.handle(Input::Signal(SurfaceSignal::Playing));
        m.handle(Input::Signal(SurfaceSignal::Error));
        // auto switch already moved us back to Loading on source 1
        assert_eq!(m.state(), PlayerState::Loading);
        assert_eq!(m.view().source_index, 1);

        let fx = m.handle(Input::SwitchSource);
        assert_eq!(m.state(), PlayerState::Loading);
        assert!(fx.contains(&Effect::StartWatchdog { generation: m.generation(), after: Duration::from_secs(10) }));
        assert_eq!(m.view().auto_retries, 0);
    }

    #[test]
    fn automatic_switching_stops_after_cap() {
        let mut m = multi(2);
        m.handle(Input::Mount);

        for attempt in 1..=3 {
            let fx = m.handle(Input::WatchdogFired { generation: m.generation() });
            assert_eq!(m.state(), PlayerState::Loading, "attempt {attempt}");
            assert_eq!(transitions(&fx).last().map(|t| t.2), Some(Cause::AutoSwitch));
        }

        let fx = m.handle(Input::WatchdogFired { generation: m.generation() });
        assert_eq!(m.state(), PlayerState::Error);
        assert!(loads(&fx).is_empty());

        // user action resumes and resets the budget
        m.handle(Input::Refresh);
        assert_eq!(m.state(), PlayerState::Loading);
        assert_eq!(m.view().auto_retries, 0);
    }

    #[test]
    fn playing_resets_auto_retry_budget() {
        let mut m = multi(3);
        m.handle(Input::Mount);
        m.handle(Input::WatchdogFired { generation: m.generation() });
        assert_eq!(m.view().auto_retries, 1);
        m.handle(Input::Signal(SurfaceSignal::Playing));
        assert_eq!(m.view().auto_retries, 0);
    }

    #[test]
    fn mute_survives_source_switch() {
        let mut m = multi(2);
        m.handle(Input::Mount);
        let fx = m.handle(Input::ToggleMute);
        assert_eq!(fx, vec![Effect::Send(HostCommand::ToggleMute)]);
        assert_eq!(m.state(), PlayerState::Loading);

        let fx = m.handle(Input::SwitchSource);
        assert!(fx.iter().any(|e| matches!(e, Effect::Send(HostCommand::Load { muted: true, .. }))));
        assert!(m.is_muted());
    }

    #[test]
    fn refresh_reloads_same_locator_with_fresh_token() {
        let mut m = machine(Some("https://a.example/x?q=1"));
        m.handle(Input::Mount);
        m.handle(Input::Signal(SurfaceSignal::Playing));

        let fx = m.handle(Input::Refresh);
        assert_eq!(fx.first(), Some(&Effect::Send(HostCommand::Retry)));
        assert_eq!(loads(&fx), vec!["https://a.example/x?q=1&_t=2"]);

        let fx = m.handle(Input::Refresh);
        assert_eq!(loads(&fx), vec!["https://a.example/x?q=1&_t=3"]);
    }

    #[test]
    fn select_source_bounds_checked() {
        let mut m = multi(3);
        m.handle(Input::Mount);
        assert!(m.handle(Input::SelectSource(7)).is_empty());

        let fx = m.handle(Input::SelectSource(2));
        assert_eq!(loads(&fx), vec!["https://s2.example/live.m3u8"]);
        assert_eq!(transitions(&fx), vec![(PlayerState::Loading, PlayerState::Loading, Cause::Select)]);
    }

    #[test]
    fn fullscreen_does_not_touch_state() {
        let mut m = machine(Some("https://a.example/x"));
        m.handle(Input::Mount);
        assert_eq!(m.handle(Input::ToggleFullscreen), vec![Effect::SetFullscreen(true)]);
        assert_eq!(m.handle(Input::ToggleFullscreen), vec![Effect::SetFullscreen(false)]);
        assert_eq!(m.state(), PlayerState::Loading);
    }

    #[test]
    fn unmount_drops_everything_after() {
        let mut m = machine(Some("https://a.example/x"));
        m.handle(Input::Mount);
        let gen = m.generation();
        assert_eq!(m.handle(Input::Unmount), vec![Effect::CancelWatchdog]);
        assert!(m.handle(Input::WatchdogFired { generation: gen }).is_empty());
        assert!(m.handle(Input::Signal(SurfaceSignal::Playing)).is_empty());
        assert_eq!(m.state(), PlayerState::Loading);
    }

    #[test]
    fn alternates_from_config_feed_candidates() {
        let config = PlayerConfig {
            alternates: AlternateRules::parse(Some("cdn1=>cdn2"), None),
            ..Default::default()
        };
        let m = PlayerMachine::new(&descriptor(Some("https://cdn1.example/a.m3u8")), &config);
        assert_eq!(m.source_count(), 2);
    }
}
