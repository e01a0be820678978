/// StreamGoal — Logger
/// JSONL event stream (playback transitions, ad counters, remote writes)

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event types ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct PlaybackTransitionEvent {
    pub ts:        String,
    pub event:     &'static str,   // "PLAYBACK_TRANSITION"
    pub session:   String,
    pub from:      String,
    pub to:        String,
    pub cause:     String,         // "mount" | "video_playing" | "watchdog" | "refresh" | "switch" | "auto_switch" ...
    pub locator:   Option<String>,
    pub source_index: usize,
}

#[derive(Serialize, Debug)]
pub struct AdCounterEvent {
    pub ts:      String,
    pub event:   &'static str,     // "AD_COUNTER"
    pub ad_id:   String,
    pub counter: &'static str,     // "impression" | "click"
    pub route:   String,
    pub ok:      bool,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct RemoteWriteEvent {
    pub ts:      String,
    pub event:   &'static str,     // "REMOTE_WRITE"
    pub table:   String,
    pub op:      &'static str,     // "insert" | "update" | "delete"
    pub id:      Option<String>,
    pub ok:      bool,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct AdminLoginEvent {
    pub ts:    String,
    pub event: &'static str,       // "ADMIN_LOGIN"
    pub email: String,
    pub ok:    bool,
}

#[derive(Serialize, Debug)]
pub struct PlayerHostHeartbeatEvent {
    pub ts:          String,
    pub event:       &'static str, // "PLAYER_HOST_HEARTBEAT"
    pub connections: usize,
    pub sessions:    usize,
    pub playing:     usize,
    pub errored:     usize,
}
