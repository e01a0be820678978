//! StreamGoal — Playback
//!
//! Loading/playing/error controller for one embedded playback surface:
//!   - `locator`  → stream descriptor, mount-time candidate list, cache busting
//!   - `strategy` → native HLS vs generic embed, picked per locator
//!   - `signal`   → string-token contract with the surface
//!   - `machine`  → pure transition table (watchdog generations, auto-retry cap)
//!   - `session`  → tokio task driving the machine, watch-channel view
//!
//! The surface is reached through whatever transport the host chooses; the
//! session only produces `HostCommand`s and consumes `SurfaceSignal`s.

pub mod config;
pub mod locator;
pub mod machine;
pub mod session;
pub mod signal;
pub mod strategy;

pub use config::{PlayerConfig, DEFAULT_MAX_AUTO_RETRIES, DEFAULT_WATCHDOG};
pub use locator::{
    cache_busted, embed_locator, AlternateRules, CandidateList, StreamDescriptor, StreamKind, StreamMeta,
};
pub use machine::{Cause, Effect, Input, PlayerMachine, PlayerState, PlayerView, PreparedSource};
pub use session::{spawn_session, PlaybackSession};
pub use signal::{HostCommand, SurfaceMessage, SurfaceSignal};
pub use strategy::{EmbedStrategy, HlsStrategy, PlaybackStrategy, StrategyKind, StrategySet};
