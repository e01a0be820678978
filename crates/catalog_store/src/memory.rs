//! In-process store with the same query semantics as the hosted one.
//!
//! Used for offline runs (no SUPABASE_URL) and as the test double for every
//! crate above this one. `set_offline(true)` makes every call fail, which is
//! how fetch-failure paths are exercised.

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

use crate::{Query, RemoteError, RemoteResult, RemoteStore, Table};

#[derive(Default)]
pub struct MemoryStore {
    tables:  RwLock<HashMap<Table, Vec<Value>>>,
    offline: AtomicBool,
    rpc_log: Mutex<Vec<(String, Value)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, table: Table, rows: Vec<Value>) -> Self {
        self.tables.get_mut().entry(table).or_default().extend(rows);
        self
    }

    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.tables.read().await.get(&table).cloned().unwrap_or_default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn rpc_calls(&self) -> Vec<(String, Value)> {
        self.rpc_log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn check_online(&self) -> RemoteResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status:  503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }

    /// Small catalog relative to "now": one live, two upcoming, two finished
    /// matches and a handful of HLS channels. No advertisements, so the
    /// overlay falls back to its built-in slots.
    pub fn demo() -> Self {
        let now = Utc::now();
        let ts = |offset_min: i64| (now + Duration::minutes(offset_min)).to_rfc3339();

        let argentina = json!({"id": "team-arg", "name": "Argentina", "country": "Argentina", "flag": "🇦🇷"});
        let brazil    = json!({"id": "team-bra", "name": "Brazil",    "country": "Brazil",    "flag": "🇧🇷"});
        let france    = json!({"id": "team-fra", "name": "France",    "country": "France",    "flag": "🇫🇷"});
        let somalia   = json!({"id": "team-som", "name": "Somalia",   "country": "Somalia",   "flag": "🇸🇴"});
        let world_cup = json!({"id": "comp-wc",  "name": "World Cup"});
        let friendly  = json!({"id": "comp-fr",  "name": "International Friendly"});

        let fixture = |id: &str, a: &Value, b: &Value, comp: &Value, kickoff: String, status: &str, extra: Value| {
            let mut row = json!({
                "id": id,
                "team_a_id": a["id"], "team_b_id": b["id"], "competition_id": comp["id"],
                "kickoff_time": kickoff,
                "status": status,
                "team_a": a, "team_b": b, "competition": comp,
            });
            if let (Some(obj), Value::Object(extra)) = (row.as_object_mut(), extra) {
                obj.extend(extra);
            }
            row
        };

        let matches = vec![
            fixture("match-1", &argentina, &brazil, &world_cup, ts(-30), "live", json!({
                "score_team_a": 1, "score_team_b": 0,
                "stream_url": "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
            })),
            fixture("match-2", &france, &somalia, &friendly, ts(120), "upcoming", json!({})),
            fixture("match-3", &brazil, &france, &world_cup, ts(60 * 26), "upcoming", json!({})),
            fixture("match-4", &somalia, &argentina, &friendly, ts(-60 * 24), "finished", json!({
                "score_team_a": 0, "score_team_b": 3,
                "highlights_url": "https://example.com/highlights/match-4",
            })),
            fixture("match-5", &france, &brazil, &world_cup, ts(-60 * 48), "finished", json!({
                "score_team_a": 2, "score_team_b": 2,
            })),
        ];

        let channels = vec![
            json!({"id": "tv-1", "name": "Asal Drama", "category": "Entertainment", "country": "Somalia",
                   "stream_url": "https://yow.riix.link/asal/musalsal/", "is_premium": false}),
            json!({"id": "tv-2", "name": "Sports Channel", "category": "Sports", "country": "International",
                   "language": "English",
                   "stream_url": "https://cph-p2p-msl.akamaized.net/hls/live/2000341/test/master.m3u8",
                   "is_premium": false}),
            json!({"id": "tv-3", "name": "News Network", "category": "News", "country": "USA",
                   "stream_url": "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8", "is_premium": true}),
            json!({"id": "tv-4", "name": "Movie Channel", "category": "Movies", "country": "International",
                   "stream_url": "https://d2zihajmogu5jn.cloudfront.net/bipbop-advanced/bipbop_16x9_variant.m3u8",
                   "is_premium": false}),
        ];

        Self::new()
            .with_rows(Table::Teams, vec![argentina, brazil, france, somalia])
            .with_rows(Table::Competitions, vec![world_cup, friendly])
            .with_rows(Table::Matches, matches)
            .with_rows(Table::LiveTvs, channels)
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

impl RemoteStore for MemoryStore {
    async fn select(&self, table: Table, query: &Query) -> RemoteResult<Vec<Value>> {
        self.check_online()?;
        let tables = self.tables.read().await;
        let rows = tables.get(&table).map(Vec::as_slice).unwrap_or_default();
        Ok(query.apply(rows))
    }

    async fn insert(&self, table: Table, payload: Value) -> RemoteResult<Value> {
        self.check_online()?;
        let Value::Object(mut obj) = payload else {
            return Err(RemoteError::Status { status: 400, message: "payload must be an object".to_string() });
        };
        obj.entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));

        let row = Value::Object(obj);
        self.tables.write().await.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: &str, payload: Value) -> RemoteResult<()> {
        self.check_online()?;
        let Value::Object(changes) = payload else {
            return Err(RemoteError::Status { status: 400, message: "payload must be an object".to_string() });
        };

        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .ok_or_else(|| RemoteError::NotFound { table: table.to_string(), id: id.to_string() })?;

        if let Some(obj) = row.as_object_mut() {
            obj.extend(changes);
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        self.check_online()?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));
        if rows.len() == before {
            return Err(RemoteError::NotFound { table: table.to_string(), id: id.to_string() });
        }
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> RemoteResult<Value> {
        self.check_online()?;
        if let Ok(mut log) = self.rpc_log.lock() {
            log.push((function.to_string(), args.clone()));
        }

        let column = match function {
            "increment_ad_impression" => "impressions",
            "increment_ad_click"      => "clicks",
            other => {
                return Err(RemoteError::Status { status: 404, message: format!("function {other} not found") });
            }
        };

        let ad_id = args.get("ad_id").and_then(Value::as_str).unwrap_or_default().to_string();
        let mut tables = self.tables.write().await;
        if let Some(row) = tables
            .get_mut(&Table::Advertisements)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(ad_id.as_str())))
        {
            let next = row.get(column).and_then(Value::as_i64).unwrap_or(0) + 1;
            row[column] = Value::from(next);
        }
        Ok(Value::Null)
    }
}
