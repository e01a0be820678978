//! StreamGoal — Client Storage
//!
//! Persistent key-value slots on the viewer's side: favorites, admin session,
//! first-visit flags. Each slot has a typed accessor; components receive the
//! store by injection (`Arc<dyn KeyValueStore>`).
//!
//! Contract: every read loads the whole backing value, every write replaces it.
//! Writers on one file are serialized by a sidecar lock, so two writers never
//! drop each other's slots; two writes to the same slot are last-write-wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const FAVORITES_KEY: &str = "streamgoal_favorites";
pub const ADMIN_SESSION_KEY: &str = "streamgoal_admin";
pub const WELCOME_SEEN_KEY: &str = "streamgoal_welcome_seen";
pub const PWA_DISMISSED_KEY: &str = "streamgoal_pwa_dismissed";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

// ── Backends ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryKv {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.slots.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots
            .lock()
            .map_err(|_| anyhow::anyhow!("kv mutex poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.slots
            .lock()
            .map_err(|_| anyhow::anyhow!("kv mutex poisoned"))?
            .remove(key);
        Ok(())
    }
}

/// One JSON object file: `{ "key": "string value", ... }`, plus a `.lock`
/// sidecar held for reads and for each whole read-modify-write.
pub struct FileKv {
    path: PathBuf,
}

impl FileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    fn open_lock(&self) -> Result<fd_lock::RwLock<File>> {
        let lock_path = self.sibling(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("open {:?}", lock_path))?;
        Ok(fd_lock::RwLock::new(file))
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("client storage {:?} unreadable, starting empty: {e}", self.path);
            BTreeMap::new()
        })
    }

    /// Caller holds the write lock. Readers see the old file or the new one,
    /// never a partial write.
    fn write_all(&self, slots: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(slots)?;
        let tmp = self.sibling(".tmp");
        {
            let mut file = File::create(&tmp).with_context(|| format!("create {:?}", tmp))?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path).with_context(|| format!("replace {:?}", self.path))?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut lock = self.open_lock()?;
        let _guard = lock.write().context("lock client storage")?;
        let mut slots = self.read_all();
        f(&mut slots);
        self.write_all(&slots)
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        let lock = match self.open_lock() {
            Ok(lock) => lock,
            Err(e) => {
                warn!("client storage lock unavailable, reading unlocked: {e:#}");
                return self.read_all().remove(key);
            }
        };
        let _guard = lock.read().ok();
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!(key, "kv set");
        self.modify(|slots| {
            slots.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        debug!(key, "kv remove");
        self.modify(|slots| {
            slots.remove(key);
        })
    }
}

// ── Favorites ────────────────────────────────────────────────────────────────

/// Set of favorite match ids, stored as a JSON array of strings.
#[derive(Clone)]
pub struct Favorites {
    store: Arc<dyn KeyValueStore>,
}

impl Favorites {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored order, duplicates dropped. Unparseable content reads as empty.
    pub fn ids(&self) -> Vec<String> {
        let Some(raw) = self.store.get(FAVORITES_KEY) else {
            return Vec::new();
        };
        let ids: Vec<String> = serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("favorites slot malformed, treating as empty: {e}");
            Vec::new()
        });

        let mut out: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }

    pub fn is_favorite(&self, match_id: &str) -> bool {
        self.ids().iter().any(|id| id == match_id)
    }

    /// Flips membership and returns the new state.
    pub fn toggle(&self, match_id: &str) -> Result<bool> {
        let mut ids = self.ids();
        let now_favorite = if let Some(pos) = ids.iter().position(|id| id == match_id) {
            ids.remove(pos);
            false
        } else {
            ids.push(match_id.to_string());
            true
        };
        self.store.set(FAVORITES_KEY, &serde_json::to_string(&ids)?)?;
        Ok(now_favorite)
    }
}

// ── Admin session ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSession {
    pub id:        String,
    pub email:     String,
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
}

#[derive(Clone)]
pub struct AdminSessionSlot {
    store: Arc<dyn KeyValueStore>,
}

impl AdminSessionSlot {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// A malformed session is cleared and reads as logged out.
    pub fn load(&self) -> Option<AdminSession> {
        let raw = self.store.get(ADMIN_SESSION_KEY)?;
        match serde_json::from_str::<AdminSession>(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("admin session malformed, clearing: {e}");
                let _ = self.store.remove(ADMIN_SESSION_KEY);
                None
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.load().map_or(false, |s| s.logged_in)
    }

    pub fn save(&self, session: &AdminSession) -> Result<()> {
        self.store.set(ADMIN_SESSION_KEY, &serde_json::to_string(session)?)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(ADMIN_SESSION_KEY)
    }
}

// ── Flags ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Flag {
    store: Arc<dyn KeyValueStore>,
    key:   &'static str,
}

impl Flag {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self { store, key }
    }

    pub fn welcome_seen(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, WELCOME_SEEN_KEY)
    }

    pub fn pwa_dismissed(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, PWA_DISMISSED_KEY)
    }

    pub fn is_set(&self) -> bool {
        self.store.get(self.key).as_deref() == Some("true")
    }

    pub fn set(&self) -> Result<()> {
        self.store.set(self.key, "true")
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(self.key)
    }
}
