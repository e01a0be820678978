//! Admin login against a single configured credential pair.
//!
//! This is a gate, not security: no hashing, no lockout, no rate limit.
//! Success writes the session slot; failure writes nothing.

use client_storage::{AdminSession, AdminSessionSlot};
use logger::{now_iso, AdminLoginEvent, EventLogger};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AdminError;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@streamgoal.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email:    String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            email:    DEFAULT_ADMIN_EMAIL.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl Credentials {
    /// STREAMGOAL_ADMIN_EMAIL / STREAMGOAL_ADMIN_PASSWORD, each falling back
    /// to the built-in default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            email: std::env::var("STREAMGOAL_ADMIN_EMAIL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.email),
            password: std::env::var("STREAMGOAL_ADMIN_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.password),
        }
    }

    fn accepts(&self, email: &str, password: &str) -> bool {
        email.trim().eq_ignore_ascii_case(self.email.trim()) && password == self.password
    }
}

pub struct AdminAuth {
    credentials: Credentials,
    slot:        AdminSessionSlot,
    event_log:   Option<Arc<EventLogger>>,
}

impl AdminAuth {
    pub fn new(credentials: Credentials, slot: AdminSessionSlot, event_log: Option<Arc<EventLogger>>) -> Self {
        Self { credentials, slot, event_log }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AdminSession, AdminError> {
        let ok = self.credentials.accepts(email, password);
        self.log_attempt(email, ok);

        if !ok {
            warn!(email = email.trim(), "admin login rejected");
            return Err(AdminError::InvalidCredentials);
        }

        let session = AdminSession {
            id:        uuid::Uuid::new_v4().to_string(),
            email:     self.credentials.email.clone(),
            logged_in: true,
        };
        self.slot.save(&session)?;
        info!(email = %session.email, "admin logged in");
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), AdminError> {
        self.slot.clear()?;
        info!("admin logged out");
        Ok(())
    }

    pub fn current(&self) -> Option<AdminSession> {
        self.slot.load().filter(|s| s.logged_in)
    }

    pub fn require(&self) -> Result<AdminSession, AdminError> {
        self.current().ok_or(AdminError::NotLoggedIn)
    }

    fn log_attempt(&self, email: &str, ok: bool) {
        let Some(log) = &self.event_log else {
            return;
        };
        let event = AdminLoginEvent {
            ts:    now_iso(),
            event: "ADMIN_LOGIN",
            email: email.trim().to_string(),
            ok,
        };
        if let Err(e) = log.log(&event) {
            warn!("event log write failed: {e}");
        }
    }
}
