//! admin-cli — catalog administration from the terminal
//!
//! The admin session lives in the same client storage file as the viewer's
//! favorites, so `login` once and the following commands reuse it.
//!
//! Usage:
//!   admin-cli login <email> <password>
//!   admin-cli logout | whoami
//!   admin-cli list <matches|teams|competitions|channels|ads> [live|upcoming|finished]
//!   admin-cli save <match|team|competition|channel|ad> [id=<id>] field=value ...
//!   admin-cli delete <match|team|competition|channel|ad> <id>
//!
//! Example:
//!   admin-cli save match team_a_id=team-arg team_b_id=team-bra competition_id=comp-wc \
//!       kickoff_time=2026-06-11T19:00 status=upcoming

use admin_console::{
    AdForm, AdminAuth, AdminConsole, CompetitionForm, Credentials, LiveTvForm, MatchForm, Notification, Outcome,
    TeamForm,
};
use anyhow::{bail, Context, Result};
use catalog_store::{Backend, CatalogApi, MatchStatus};
use catalog_view::{format_date, format_relative_time};
use client_storage::{AdminSessionSlot, FileKv, KeyValueStore};
use dotenv::dotenv;
use logger::EventLogger;
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

fn usage() -> &'static str {
    "usage: admin-cli <login|logout|whoami|list|save|delete> ..."
}

/// `<command> <entity> rest..` → (entity, rest). A missing entity is a usage error.
fn entity_args(args: &[String]) -> Result<(&str, &[String])> {
    match args.get(1).map(String::as_str) {
        Some(entity) if !entity.trim().is_empty() => Ok((entity, args.get(2..).unwrap_or_default())),
        _ => bail!(usage()),
    }
}

fn parse_fields(args: &[String]) -> Result<(Option<String>, HashMap<String, String>)> {
    let mut id = None;
    let mut fields = HashMap::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .with_context(|| format!("expected field=value, got '{arg}'"))?;
        if key == "id" {
            id = Some(value.to_string()).filter(|v| !v.trim().is_empty());
        } else {
            fields.insert(key.to_string(), value.to_string());
        }
    }
    Ok((id, fields))
}

fn report<T>(outcome: Outcome<T>, describe: impl Fn(&T) -> String) -> Result<()> {
    print_notification(&outcome.notification);
    if let Some(rows) = outcome.rows {
        for row in &rows {
            println!("  {}", describe(row));
        }
    }
    if outcome.notification.is_error() {
        bail!("{}", outcome.notification.description);
    }
    Ok(())
}

fn print_notification(n: &Notification) {
    println!("[{}] {}", n.title, n.description);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(usage());
    };

    let storage_path = std::env::var("STREAMGOAL_STORAGE_PATH").unwrap_or_else(|_| "data/client_storage.json".to_string());
    let log_dir = std::env::var("STREAMGOAL_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let event_log = Arc::new(EventLogger::new(log_dir));

    let kv: Arc<dyn KeyValueStore> = Arc::new(FileKv::new(storage_path));
    let auth = AdminAuth::new(Credentials::from_env(), AdminSessionSlot::new(kv), Some(event_log.clone()));

    match command.as_str() {
        "login" => {
            let (Some(email), Some(password)) = (args.get(1), args.get(2)) else {
                bail!("usage: admin-cli login <email> <password>");
            };
            let session = auth.login(email, password)?;
            print_notification(&Notification::success(format!("Logged in as {}", session.email)));
            return Ok(());
        }
        "logout" => {
            auth.logout()?;
            print_notification(&Notification::success("Logged out"));
            return Ok(());
        }
        "whoami" => {
            match auth.current() {
                Some(s) => println!("{} (session {})", s.email, s.id),
                None => println!("not logged in"),
            }
            return Ok(());
        }
        _ => {}
    }

    let backend = Backend::connect(
        std::env::var("SUPABASE_URL").ok().as_deref(),
        std::env::var("SUPABASE_ANON_KEY").ok().as_deref(),
    )
    .context("remote store setup failed")?;
    let console = AdminConsole::new(Arc::new(CatalogApi::new(backend)), auth, Some(event_log));

    let (entity, rest) = entity_args(&args)?;
    match (command.as_str(), entity) {
        ("list", "matches") => {
            let status = rest
                .first()
                .map(|s| s.parse::<MatchStatus>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let now = chrono::Utc::now();
            for m in console.list_matches(status).await? {
                println!(
                    "{}  {} ({})  [{}] {} {}",
                    m.id,
                    format_date(m.kickoff_time, &chrono::Utc),
                    format_relative_time(m.kickoff_time, now),
                    m.status,
                    m.title(),
                    m.score().map(|(a, b)| format!("{a}-{b}")).unwrap_or_default()
                );
            }
        }
        ("list", "teams") => {
            for t in console.list_teams().await? {
                println!("{}  {} {} ({})", t.id, t.flag, t.name, t.country);
            }
        }
        ("list", "competitions") => {
            for c in console.list_competitions().await? {
                println!("{}  {}", c.id, c.name);
            }
        }
        ("list", "channels") => {
            for tv in console.list_live_tvs().await? {
                println!("{}  {} [{}] {}", tv.id, tv.name, tv.category, tv.stream_url);
            }
        }
        ("list", "ads") => {
            for ad in console.list_advertisements().await? {
                println!(
                    "{}  {} {:?} active={} target={} impressions={} clicks={}",
                    ad.id,
                    ad.name,
                    ad.ad_type,
                    ad.is_active,
                    ad.target_page.as_deref().unwrap_or("*"),
                    ad.impressions,
                    ad.clicks
                );
            }
        }

        ("save", kind) => {
            let (id, fields) = parse_fields(rest)?;
            let id = id.as_deref();
            match kind {
                "match" => {
                    // partial edits start from the stored row
                    let mut form = match id {
                        Some(id) => console
                            .list_matches(None)
                            .await?
                            .iter()
                            .find(|m| m.id == id)
                            .map(MatchForm::from_match)
                            .with_context(|| format!("match {id} not found"))?,
                        None => MatchForm::default(),
                    };
                    let given = MatchForm::from_fields(&fields);
                    for (key, slot, value) in [
                        ("team_a_id", &mut form.team_a_id, given.team_a_id),
                        ("team_b_id", &mut form.team_b_id, given.team_b_id),
                        ("competition_id", &mut form.competition_id, given.competition_id),
                        ("kickoff_time", &mut form.kickoff_time, given.kickoff_time),
                        ("status", &mut form.status, given.status),
                        ("score_team_a", &mut form.score_team_a, given.score_team_a),
                        ("score_team_b", &mut form.score_team_b, given.score_team_b),
                        ("stream_url", &mut form.stream_url, given.stream_url),
                        ("highlights_url", &mut form.highlights_url, given.highlights_url),
                    ] {
                        if fields.contains_key(key) {
                            *slot = value;
                        }
                    }
                    report(console.save_match(id, &form).await, |m| format!("{}  {}", m.id, m.title()))?;
                }
                "team" => report(
                    console.save_team(id, &TeamForm::from_fields(&fields)).await,
                    |t| format!("{}  {}", t.id, t.name),
                )?,
                "competition" => report(
                    console.save_competition(id, &CompetitionForm::from_fields(&fields)).await,
                    |c| format!("{}  {}", c.id, c.name),
                )?,
                "channel" => report(
                    console.save_live_tv(id, &LiveTvForm::from_fields(&fields)).await,
                    |tv| format!("{}  {}", tv.id, tv.name),
                )?,
                "ad" => report(
                    console.save_advertisement(id, &AdForm::from_fields(&fields)).await,
                    |ad| format!("{}  {}", ad.id, ad.name),
                )?,
                other => bail!("unknown entity '{other}'"),
            }
        }

        ("delete", kind) => {
            let Some(id) = rest.first() else {
                bail!("usage: admin-cli delete <entity> <id>");
            };
            match kind {
                "match"       => report(console.delete_match(id).await, |m| format!("{}  {}", m.id, m.title()))?,
                "team"        => report(console.delete_team(id).await, |t| format!("{}  {}", t.id, t.name))?,
                "competition" => report(console.delete_competition(id).await, |c| format!("{}  {}", c.id, c.name))?,
                "channel"     => report(console.delete_live_tv(id).await, |tv| format!("{}  {}", tv.id, tv.name))?,
                "ad"          => report(console.delete_advertisement(id).await, |ad| format!("{}  {}", ad.id, ad.name))?,
                other         => bail!("unknown entity '{other}'"),
            }
        }

        _ => bail!(usage()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_entity_is_a_usage_error() {
        for raw in [args(&["save"]), args(&["delete"]), args(&["list", " "])] {
            let err = entity_args(&raw).unwrap_err();
            assert!(err.to_string().starts_with("usage: admin-cli"));
        }
    }

    #[test]
    fn entity_without_fields_yields_empty_rest() {
        let a = args(&["save", "team"]);
        let (entity, rest) = entity_args(&a).unwrap();
        assert_eq!(entity, "team");
        assert!(rest.is_empty());
        assert_eq!(parse_fields(rest).unwrap(), (None, HashMap::new()));
    }

    #[test]
    fn fields_split_out_the_id() {
        let a = args(&["save", "team", "id=team-ken", "name=Kenya", "flag=🇰🇪"]);
        let (_, rest) = entity_args(&a).unwrap();
        let (id, fields) = parse_fields(rest).unwrap();
        assert_eq!(id.as_deref(), Some("team-ken"));
        assert_eq!(fields.get("name").map(String::as_str), Some("Kenya"));
        assert!(!fields.contains_key("id"));
        assert!(parse_fields(&args(&["name"])).is_err());
    }
}
