//! Admin CRUD pages.
//!
//! Every write checks the admin session, sends the parsed payload through
//! `CatalogApi`, and on success re-reads the affected list so the caller
//! always shows canonical rows. The caller gets a toast-style notification
//! either way; nothing here panics or retries.

use catalog_store::{
    Advertisement, CatalogApi, Competition, LiveTv, Match, MatchStatus, RemoteResult, RemoteStore, Table,
    Team,
};
use logger::{now_iso, EventLogger, RemoteWriteEvent};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::AdminAuth;
use crate::error::{AdminError, FormError};
use crate::forms::{AdForm, CompetitionForm, LiveTvForm, MatchForm, TeamForm};

// ── Notifications ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title:       String,
    pub description: String,
    pub variant:     Variant,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self { title: "Success".into(), description: description.into(), variant: Variant::Default }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self { title: "Error".into(), description: description.into(), variant: Variant::Destructive }
    }

    pub fn is_error(&self) -> bool {
        self.variant == Variant::Destructive
    }
}

/// Result of one admin write: the toast, plus the re-fetched list when the
/// write went through and the re-read did too.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub notification: Notification,
    pub rows:         Option<Vec<T>>,
}

#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    pub teams:        Vec<Team>,
    pub competitions: Vec<Competition>,
}

// ── Entities ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Entity {
    table: Table,
    label: &'static str,
    noun:  &'static str,
}

const MATCH:       Entity = Entity { table: Table::Matches,        label: "Match",         noun: "match" };
const TEAM:        Entity = Entity { table: Table::Teams,          label: "Team",          noun: "team" };
const COMPETITION: Entity = Entity { table: Table::Competitions,   label: "Competition",   noun: "competition" };
const CHANNEL:     Entity = Entity { table: Table::LiveTvs,        label: "Channel",       noun: "channel" };
const AD:          Entity = Entity { table: Table::Advertisements, label: "Advertisement", noun: "advertisement" };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Insert,
    Update,
    Delete,
}

impl Op {
    fn as_str(&self) -> &'static str {
        match self {
            Op::Insert => "insert",
            Op::Update => "update",
            Op::Delete => "delete",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            Op::Insert => "created",
            Op::Update => "updated",
            Op::Delete => "deleted",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Op::Delete => "delete",
            _ => "save",
        }
    }
}

// ── Console ──────────────────────────────────────────────────────────────────

pub struct AdminConsole<S> {
    api:       Arc<CatalogApi<S>>,
    auth:      AdminAuth,
    event_log: Option<Arc<EventLogger>>,
}

impl<S: RemoteStore> AdminConsole<S> {
    pub fn new(api: Arc<CatalogApi<S>>, auth: AdminAuth, event_log: Option<Arc<EventLogger>>) -> Self {
        Self { api, auth, event_log }
    }

    pub fn auth(&self) -> &AdminAuth {
        &self.auth
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Newest kickoff first, optionally one status tab.
    pub async fn list_matches(&self, status: Option<MatchStatus>) -> Result<Vec<Match>, AdminError> {
        self.auth.require()?;
        Ok(self.api.admin_matches(status).await?)
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>, AdminError> {
        self.auth.require()?;
        Ok(self.api.teams().await?)
    }

    pub async fn list_competitions(&self) -> Result<Vec<Competition>, AdminError> {
        self.auth.require()?;
        Ok(self.api.competitions().await?)
    }

    pub async fn list_live_tvs(&self) -> Result<Vec<LiveTv>, AdminError> {
        self.auth.require()?;
        Ok(self.api.live_tvs().await?)
    }

    pub async fn list_advertisements(&self) -> Result<Vec<Advertisement>, AdminError> {
        self.auth.require()?;
        Ok(self.api.advertisements().await?)
    }

    /// Select options for the match dialog.
    pub async fn form_options(&self) -> Result<FormOptions, AdminError> {
        self.auth.require()?;
        Ok(FormOptions {
            teams:        self.api.teams().await?,
            competitions: self.api.competitions().await?,
        })
    }

    // ── Writes ───────────────────────────────────────────────────────────────

    /// `id = None` creates, `Some` updates that row.
    pub async fn save_match(&self, id: Option<&str>, form: &MatchForm) -> Outcome<Match> {
        let note = self.save(MATCH, id, form.parse()).await;
        self.finish(note, self.api.admin_matches(None)).await
    }

    pub async fn delete_match(&self, id: &str) -> Outcome<Match> {
        let note = self.delete(MATCH, id).await;
        self.finish(note, self.api.admin_matches(None)).await
    }

    pub async fn save_team(&self, id: Option<&str>, form: &TeamForm) -> Outcome<Team> {
        let note = self.save(TEAM, id, form.parse()).await;
        self.finish(note, self.api.teams()).await
    }

    pub async fn delete_team(&self, id: &str) -> Outcome<Team> {
        let note = self.delete(TEAM, id).await;
        self.finish(note, self.api.teams()).await
    }

    pub async fn save_competition(&self, id: Option<&str>, form: &CompetitionForm) -> Outcome<Competition> {
        let note = self.save(COMPETITION, id, form.parse()).await;
        self.finish(note, self.api.competitions()).await
    }

    pub async fn delete_competition(&self, id: &str) -> Outcome<Competition> {
        let note = self.delete(COMPETITION, id).await;
        self.finish(note, self.api.competitions()).await
    }

    pub async fn save_live_tv(&self, id: Option<&str>, form: &LiveTvForm) -> Outcome<LiveTv> {
        let note = self.save(CHANNEL, id, form.parse()).await;
        self.finish(note, self.api.live_tvs()).await
    }

    pub async fn delete_live_tv(&self, id: &str) -> Outcome<LiveTv> {
        let note = self.delete(CHANNEL, id).await;
        self.finish(note, self.api.live_tvs()).await
    }

    pub async fn save_advertisement(&self, id: Option<&str>, form: &AdForm) -> Outcome<Advertisement> {
        let note = self.save(AD, id, form.parse()).await;
        self.finish(note, self.api.advertisements()).await
    }

    pub async fn delete_advertisement(&self, id: &str) -> Outcome<Advertisement> {
        let note = self.delete(AD, id).await;
        self.finish(note, self.api.advertisements()).await
    }

    // ── Internals ────────────────────────────────────────────────────────────

    async fn save<P: Serialize>(
        &self,
        entity: Entity,
        id: Option<&str>,
        payload: Result<P, FormError>,
    ) -> Notification {
        let op = if id.is_some() { Op::Update } else { Op::Insert };
        let result = async {
            self.auth.require()?;
            let payload = payload?;
            let written = match id {
                Some(id) => self.api.update(entity.table, id, &payload).await.map(|_| Some(id.to_string())),
                None => self.api.insert(entity.table, &payload).await.map(|row| row_id(&row)),
            };
            self.log_write(entity, op, id, &written);
            Ok::<_, AdminError>(written?)
        }
        .await;
        notify(entity, op, result.map(|_| ()))
    }

    async fn delete(&self, entity: Entity, id: &str) -> Notification {
        let result = async {
            self.auth.require()?;
            let written = self.api.remove(entity.table, id).await.map(|_| Some(id.to_string()));
            self.log_write(entity, Op::Delete, Some(id), &written);
            written?;
            Ok::<_, AdminError>(())
        }
        .await;
        notify(entity, Op::Delete, result)
    }

    async fn finish<T>(&self, notification: Notification, refetch: impl Future<Output = RemoteResult<Vec<T>>>) -> Outcome<T> {
        if notification.is_error() {
            return Outcome { notification, rows: None };
        }
        let rows = match refetch.await {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!("re-fetch after admin write failed: {}", e.message());
                None
            }
        };
        Outcome { notification, rows }
    }

    fn log_write(&self, entity: Entity, op: Op, id: Option<&str>, result: &RemoteResult<Option<String>>) {
        match result {
            Ok(written) => info!(
                table = %entity.table, op = op.as_str(), id = written.as_deref().unwrap_or("?"),
                "admin write ok"
            ),
            Err(e) => warn!(table = %entity.table, op = op.as_str(), "admin write failed: {}", e.message()),
        }

        let Some(log) = &self.event_log else {
            return;
        };
        let event = RemoteWriteEvent {
            ts:      now_iso(),
            event:   "REMOTE_WRITE",
            table:   entity.table.to_string(),
            op:      op.as_str(),
            id:      match result {
                Ok(written) => written.clone(),
                Err(_) => id.map(str::to_string),
            },
            ok:      result.is_ok(),
            message: match result {
                Ok(_) => String::new(),
                Err(e) => e.message(),
            },
        };
        if let Err(e) = log.log(&event) {
            warn!("event log write failed: {e}");
        }
    }
}

fn notify(entity: Entity, op: Op, result: Result<(), AdminError>) -> Notification {
    match result {
        Ok(()) => Notification::success(format!("{} {} successfully", entity.label, op.past_tense())),
        Err(e) => Notification::error(format!("Failed to {} {}: {e}", op.verb(), entity.noun)),
    }
}

/// Inserted row id; PostgREST may hand back the row or a one-row array.
fn row_id(row: &Value) -> Option<String> {
    let row = match row {
        Value::Array(rows) => rows.first()?,
        other => other,
    };
    row.get("id").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD};
    use catalog_store::MemoryStore;
    use client_storage::{AdminSessionSlot, KeyValueStore, MemoryKv};

    fn console() -> (AdminConsole<Arc<MemoryStore>>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::demo());
        let api = Arc::new(CatalogApi::new(store.clone()));
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
        let auth = AdminAuth::new(Credentials::default(), AdminSessionSlot::new(kv), None);
        (AdminConsole::new(api, auth, None), store)
    }

    fn logged_in() -> (AdminConsole<Arc<MemoryStore>>, Arc<MemoryStore>) {
        let (console, store) = console();
        console.auth().login(DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD).unwrap();
        (console, store)
    }

    fn team_form(name: &str) -> TeamForm {
        TeamForm { name: name.into(), country: name.into(), flag: "🏳".into(), logo: String::new() }
    }

    #[tokio::test]
    async fn writes_require_login_and_touch_nothing() {
        let (console, store) = console();
        let before = store.rows(Table::Teams).await.len();

        let outcome = console.save_team(None, &team_form("Kenya")).await;
        assert!(outcome.notification.is_error());
        assert_eq!(outcome.notification.description, "Failed to save team: Admin login required");
        assert!(outcome.rows.is_none());
        assert_eq!(store.rows(Table::Teams).await.len(), before);

        assert!(matches!(console.list_matches(None).await, Err(AdminError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn create_then_update_then_delete_team() {
        let (console, _store) = logged_in();

        let created = console.save_team(None, &team_form("Kenya")).await;
        assert_eq!(created.notification, Notification::success("Team created successfully"));
        let rows = created.rows.unwrap();
        let kenya = rows.iter().find(|t| t.name == "Kenya").unwrap().clone();

        let updated = console.save_team(Some(&kenya.id), &team_form("Kenya Harambee")).await;
        assert_eq!(updated.notification.description, "Team updated successfully");
        assert!(updated.rows.unwrap().iter().any(|t| t.name == "Kenya Harambee"));

        let deleted = console.delete_team(&kenya.id).await;
        assert_eq!(deleted.notification.description, "Team deleted successfully");
        assert!(!deleted.rows.unwrap().iter().any(|t| t.id == kenya.id));
    }

    #[tokio::test]
    async fn form_errors_surface_as_destructive_notification() {
        let (console, store) = logged_in();
        let before = store.rows(Table::Matches).await.len();

        let form = MatchForm { team_a_id: "team-arg".into(), ..Default::default() };
        let outcome = console.save_match(None, &form).await;
        assert_eq!(outcome.notification.title, "Error");
        assert_eq!(outcome.notification.variant, Variant::Destructive);
        assert_eq!(outcome.notification.description, "Failed to save match: team_b_id is required");
        assert_eq!(store.rows(Table::Matches).await.len(), before);
    }

    #[tokio::test]
    async fn remote_failures_are_reported_not_raised() {
        let (console, store) = logged_in();
        let outcome = console.delete_competition("comp-missing").await;
        assert!(outcome.notification.description.starts_with("Failed to delete competition:"));

        store.set_offline(true);
        let outcome = console.save_competition(None, &CompetitionForm { name: "Euro".into(), logo: String::new() }).await;
        assert!(outcome.notification.is_error());
    }

    #[tokio::test]
    async fn created_match_shows_up_in_admin_list() {
        let (console, _store) = logged_in();
        let form = MatchForm {
            team_a_id:      "team-som".into(),
            team_b_id:      "team-fra".into(),
            competition_id: "comp-fr".into(),
            kickoff_time:   "2030-01-01T12:00".into(),
            ..Default::default()
        };
        let outcome = console.save_match(None, &form).await;
        assert_eq!(outcome.notification.description, "Match created successfully");

        let upcoming = console.list_matches(Some(MatchStatus::Upcoming)).await.unwrap();
        assert!(upcoming.iter().any(|m| m.team_a_id == "team-som" && m.competition_id == "comp-fr"));

        let options = console.form_options().await.unwrap();
        assert_eq!(options.teams.len(), 4);
        assert_eq!(options.competitions.len(), 2);
    }

    #[tokio::test]
    async fn writes_are_logged_as_events() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(EventLogger::new(dir.path()));
        let store = Arc::new(MemoryStore::demo());
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
        let auth = AdminAuth::new(Credentials::default(), AdminSessionSlot::new(kv), None);
        let console = AdminConsole::new(Arc::new(CatalogApi::new(store)), auth, Some(log));
        console.auth().login(DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD).unwrap();

        console.delete_live_tv("tv-1").await;
        console.delete_live_tv("tv-1").await;

        let written: String = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| std::fs::read_to_string(e.unwrap().path()).unwrap())
            .collect();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"ok\":true") && lines[0].contains("\"live_tvs\""));
        assert!(lines[1].contains("\"ok\":false"));
    }
}
