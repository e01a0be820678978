//! Typed catalog operations on top of any `RemoteStore`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::*;
use crate::{Filter, Query, RemoteResult, RemoteStore};

/// Match rows with their display joins attached.
pub const MATCH_SELECT: &str = "*, \
    team_a:team_a_id(id, name, country, flag, logo), \
    team_b:team_b_id(id, name, country, flag, logo), \
    competition:competition_id(id, name, logo)";

pub struct CatalogApi<S> {
    store: S,
}

impl<S: RemoteStore> CatalogApi<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Generic ──────────────────────────────────────────────────────────────

    pub async fn list<T: DeserializeOwned>(&self, table: Table, query: &Query) -> RemoteResult<Vec<T>> {
        let rows = self.store.select(table, query).await?;
        Ok(decode_rows(table, rows))
    }

    pub async fn get_by_id<T: DeserializeOwned>(&self, table: Table, select: &str, id: &str) -> RemoteResult<Option<T>> {
        let query = Query::new().select(select).eq("id", id).limit(1);
        Ok(self.list(table, &query).await?.into_iter().next())
    }

    pub async fn insert<P: Serialize>(&self, table: Table, payload: &P) -> RemoteResult<Value> {
        self.store.insert(table, serde_json::to_value(payload)?).await
    }

    pub async fn update<P: Serialize>(&self, table: Table, id: &str, payload: &P) -> RemoteResult<()> {
        self.store.update(table, id, serde_json::to_value(payload)?).await
    }

    pub async fn remove(&self, table: Table, id: &str) -> RemoteResult<()> {
        self.store.delete(table, id).await
    }

    // ── Matches ──────────────────────────────────────────────────────────────

    pub async fn matches(&self) -> RemoteResult<Vec<Match>> {
        let query = Query::new().select(MATCH_SELECT).order("kickoff_time", true);
        self.list(Table::Matches, &query).await
    }

    pub async fn matches_by_status(
        &self,
        status: MatchStatus,
        ascending: bool,
        limit: Option<usize>,
    ) -> RemoteResult<Vec<Match>> {
        let mut query = Query::new()
            .select(MATCH_SELECT)
            .eq("status", status.as_str())
            .order("kickoff_time", ascending);
        query.limit = limit;
        self.list(Table::Matches, &query).await
    }

    /// Favorites page fetch. An empty id set never hits the network.
    pub async fn matches_by_ids(&self, ids: &[String]) -> RemoteResult<Vec<Match>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .select(MATCH_SELECT)
            .filter(Filter::is_in("id", ids))
            .order("kickoff_time", true);
        self.list(Table::Matches, &query).await
    }

    pub async fn match_by_id(&self, id: &str) -> RemoteResult<Option<Match>> {
        self.get_by_id(Table::Matches, MATCH_SELECT, id).await
    }

    /// Admin list: newest first, optional status tab.
    pub async fn admin_matches(&self, status: Option<MatchStatus>) -> RemoteResult<Vec<Match>> {
        let mut query = Query::new().select(MATCH_SELECT).order("kickoff_time", false);
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        self.list(Table::Matches, &query).await
    }

    // ── Teams / competitions ─────────────────────────────────────────────────

    pub async fn teams(&self) -> RemoteResult<Vec<Team>> {
        self.list(Table::Teams, &Query::new().order("name", true)).await
    }

    pub async fn competitions(&self) -> RemoteResult<Vec<Competition>> {
        self.list(Table::Competitions, &Query::new().order("name", true)).await
    }

    // ── Live TV ──────────────────────────────────────────────────────────────

    pub async fn live_tvs(&self) -> RemoteResult<Vec<LiveTv>> {
        self.list(Table::LiveTvs, &Query::new().order("name", true)).await
    }

    pub async fn live_tv_by_id(&self, id: &str) -> RemoteResult<Option<LiveTv>> {
        self.get_by_id(Table::LiveTvs, "*", id).await
    }

    // ── Advertisements ───────────────────────────────────────────────────────

    pub async fn advertisements(&self) -> RemoteResult<Vec<Advertisement>> {
        let query = Query::new().order("name", true);
        self.list(Table::Advertisements, &query).await
    }

    /// Active ads targeted at `route` or at every page (null target).
    pub async fn active_ads_for_route(&self, route: &str) -> RemoteResult<Vec<Advertisement>> {
        let query = Query::new()
            .eq("is_active", true)
            .filter(Filter::Or(vec![
                Filter::eq("target_page", route),
                Filter::is_null("target_page"),
            ]));
        self.list(Table::Advertisements, &query).await
    }

    pub async fn increment_ad_impression(&self, ad_id: &str) -> RemoteResult<()> {
        self.store.rpc("increment_ad_impression", json!({ "ad_id": ad_id })).await?;
        Ok(())
    }

    pub async fn increment_ad_click(&self, ad_id: &str) -> RemoteResult<()> {
        self.store.rpc("increment_ad_click", json!({ "ad_id": ad_id })).await?;
        Ok(())
    }
}

/// Rows that do not decode are skipped, not fatal.
fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> Vec<T> {
    let total = rows.len();
    let decoded: Vec<T> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(table = %table, "skipping malformed row: {e}");
                None
            }
        })
        .collect();
    debug!(table = %table, total, decoded = decoded.len(), "rows decoded");
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn api() -> CatalogApi<MemoryStore> {
        CatalogApi::new(MemoryStore::demo())
    }

    #[tokio::test]
    async fn matches_come_back_with_joins_in_kickoff_order() {
        let matches = api().matches().await.unwrap();
        assert_eq!(matches.len(), 5);
        assert!(matches.windows(2).all(|w| w[0].kickoff_time <= w[1].kickoff_time));
        assert!(matches.iter().all(|m| m.team_a.is_some() && m.competition.is_some()));
    }

    #[tokio::test]
    async fn status_query_limits_and_orders() {
        let finished = api().matches_by_status(MatchStatus::Finished, false, Some(1)).await.unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].id, "match-4");
    }

    #[tokio::test]
    async fn favorites_fetch_by_ids() {
        let api = api();
        assert!(api.matches_by_ids(&[]).await.unwrap().is_empty());
        let ids = vec!["match-2".to_string(), "match-5".to_string(), "gone".to_string()];
        let found = api.matches_by_ids(&ids).await.unwrap();
        let mut found_ids: Vec<_> = found.iter().map(|m| m.id.as_str()).collect();
        found_ids.sort();
        assert_eq!(found_ids, vec!["match-2", "match-5"]);
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped() {
        let store = MemoryStore::new().with_rows(
            Table::LiveTvs,
            vec![
                json!({"id": "1", "name": "Good", "category": "Sports", "stream_url": "https://a/b.m3u8"}),
                json!({"id": 2}),
            ],
        );
        let tvs = CatalogApi::new(store).live_tvs().await.unwrap();
        assert_eq!(tvs.len(), 1);
        assert_eq!(tvs[0].name, "Good");
    }

    #[tokio::test]
    async fn route_ads_include_global_and_skip_inactive() {
        let store = MemoryStore::new().with_rows(
            Table::Advertisements,
            vec![
                json!({"id": "a", "name": "global", "type": "banner", "is_active": true, "target_page": null}),
                json!({"id": "b", "name": "live",   "type": "popup",  "is_active": true, "target_page": "/live"}),
                json!({"id": "c", "name": "tv",     "type": "banner", "is_active": true, "target_page": "/tv"}),
                json!({"id": "d", "name": "off",    "type": "banner", "is_active": false}),
            ],
        );
        let ads = CatalogApi::new(store).active_ads_for_route("/live").await.unwrap();
        let ids: Vec<_> = ads.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn write_then_refetch_sees_canonical_row() {
        let api = api();
        let payload = CompetitionPayload { name: "Copa América".into(), logo: None };
        let created = api.insert(Table::Competitions, &payload).await.unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        api.update(Table::Competitions, &id, &CompetitionPayload { name: "Copa".into(), logo: None })
            .await
            .unwrap();
        let comps = api.competitions().await.unwrap();
        assert!(comps.iter().any(|c| c.id == id && c.name == "Copa"));

        api.remove(Table::Competitions, &id).await.unwrap();
        assert!(api.competitions().await.unwrap().iter().all(|c| c.id != id));
    }
}
