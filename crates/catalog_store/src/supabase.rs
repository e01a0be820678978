//! PostgREST client for the hosted catalog.
//!
//! Endpoints:
//!   {url}/rest/v1/{table}      select / insert / update / delete
//!   {url}/rest/v1/rpc/{fn}     counter increments

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::debug;

use crate::{Query, RemoteError, RemoteResult, RemoteStore, Table};

pub struct SupabaseStore {
    client:   reqwest::Client,
    base_url: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, anon_key: &str) -> RemoteResult<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(anon_key)
            .map_err(|e| RemoteError::other(format!("invalid anon key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {anon_key}"))
            .map_err(|e| RemoteError::other(format!("invalid anon key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        // Transport defaults only: no timeout policy, no retries
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }
}

/// Non-2xx → `RemoteError::Status` with the PostgREST `message` when present.
async fn ensure_success(resp: reqwest::Response) -> RemoteResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect());

    Err(RemoteError::Status { status: status.as_u16(), message })
}

fn parse_body(raw: &str) -> RemoteResult<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(raw)?)
}

impl RemoteStore for SupabaseStore {
    async fn select(&self, table: Table, query: &Query) -> RemoteResult<Vec<Value>> {
        let params = query.to_params();
        debug!(table = %table, ?params, "select");

        let resp = self.client
            .get(self.rest_url(table.name()))
            .query(&params)
            .header("Accept", "application/json")
            .send()
            .await?;

        let raw = ensure_success(resp).await?.text().await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn insert(&self, table: Table, payload: Value) -> RemoteResult<Value> {
        debug!(table = %table, "insert");

        let resp = self.client
            .post(self.rest_url(table.name()))
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;

        let raw = ensure_success(resp).await?.text().await?;
        // Representation comes back as a one-element array
        Ok(match parse_body(&raw)? {
            Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            other => other,
        })
    }

    async fn update(&self, table: Table, id: &str, payload: Value) -> RemoteResult<()> {
        debug!(table = %table, id, "update");

        let resp = self.client
            .patch(self.rest_url(table.name()))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(&payload)
            .send()
            .await?;

        ensure_success(resp).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        debug!(table = %table, id, "delete");

        let resp = self.client
            .delete(self.rest_url(table.name()))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;

        ensure_success(resp).await?;
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> RemoteResult<Value> {
        debug!(function, "rpc");

        let resp = self.client
            .post(self.rest_url(&format!("rpc/{function}")))
            .json(&args)
            .send()
            .await?;

        let raw = ensure_success(resp).await?.text().await?;
        parse_body(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = SupabaseStore::new("https://demo.supabase.co/", "anon").unwrap();
        assert_eq!(store.rest_url("matches"), "https://demo.supabase.co/rest/v1/matches");
        assert_eq!(
            store.rest_url("rpc/increment_ad_click"),
            "https://demo.supabase.co/rest/v1/rpc/increment_ad_click"
        );
    }

    #[test]
    fn anon_key_with_newline_is_rejected() {
        assert!(SupabaseStore::new("https://demo.supabase.co", "bad\nkey").is_err());
    }

    #[test]
    fn empty_rpc_body_is_null() {
        assert_eq!(parse_body("  ").unwrap(), Value::Null);
        assert_eq!(parse_body("3").unwrap(), Value::from(3));
    }
}
