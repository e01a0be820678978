/// StreamGoal — Match Board
///
/// Console rendering of the catalog:
///   1. Polls matches (and channels on /live-tv) every STREAMGOAL_POLL_SECS
///   2. Applies the route's tab, the free-text query and favorites
///   3. Prints one line per card, live first
///   4. Keeps the route's ad overlay mounted and shows its banner
///
/// Without SUPABASE_URL / SUPABASE_ANON_KEY it runs on the built-in demo catalog.
///
/// Run:
///   cargo run --bin match-board
///   STREAMGOAL_ROUTE=/favorites STREAMGOAL_TOGGLE_FAVORITE=match-1 cargo run --bin match-board

use ad_overlay::spawn_overlay;
use anyhow::{Context, Result};
use catalog_store::{Backend, CatalogApi, Match};
use catalog_view::{
    favorite_matches, filter_channels, filter_matches, home_sections, sort_matches, ChannelFilter, MatchCard,
    MatchFilter, StatusTab,
};
use client_storage::{Favorites, FileKv, Flag, KeyValueStore};
use dotenv::dotenv;
use logger::EventLogger;
use std::env;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Poll interval while at least one match is live.
const LIVE_POLL_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let poll_secs = env::var("STREAMGOAL_POLL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(15);
    let route = env::var("STREAMGOAL_ROUTE").unwrap_or_else(|_| "/".to_string());
    let query = env::var("STREAMGOAL_QUERY").unwrap_or_default();
    let tab = match env::var("STREAMGOAL_TAB") {
        Ok(t) => t.parse::<StatusTab>().unwrap_or_else(|e| {
            warn!("STREAMGOAL_TAB ignored: {e}");
            StatusTab::from_route(&route)
        }),
        Err(_) => StatusTab::from_route(&route),
    };
    let storage_path = env::var("STREAMGOAL_STORAGE_PATH").unwrap_or_else(|_| "data/client_storage.json".to_string());
    let log_dir = env::var("STREAMGOAL_LOG_DIR").unwrap_or_else(|_| "logs".to_string());

    let backend = Backend::connect(
        env::var("SUPABASE_URL").ok().as_deref(),
        env::var("SUPABASE_ANON_KEY").ok().as_deref(),
    )
    .context("remote store setup failed")?;

    info!("=== StreamGoal Match Board ===");
    info!("Store: {} | route: {route} | tab: {tab:?} | poll: {poll_secs}s", backend.label());
    info!("Storage: {storage_path} | logs: {log_dir}/");

    let event_log = Arc::new(EventLogger::new(&log_dir));
    let api = Arc::new(CatalogApi::new(backend));

    let kv: Arc<dyn KeyValueStore> = Arc::new(FileKv::new(&storage_path));
    let favorites = Favorites::new(kv.clone());

    let welcome = Flag::welcome_seen(kv.clone());
    if !welcome.is_set() {
        info!("Welcome to StreamGoal! Live football, upcoming fixtures and highlights in one place.");
        if let Err(e) = welcome.set() {
            warn!("welcome flag not persisted: {e}");
        }
    }

    if let Ok(id) = env::var("STREAMGOAL_TOGGLE_FAVORITE") {
        match favorites.toggle(id.trim()) {
            Ok(true)  => info!("⭐ {id} added to favorites ({} total)", favorites.len()),
            Ok(false) => info!("☆ {id} removed from favorites ({} total)", favorites.len()),
            Err(e)    => warn!("favorite toggle failed: {e:#}"),
        }
    }

    let overlay = spawn_overlay(api.clone(), &route, Some(event_log.clone()));
    let filter = MatchFilter { tab, query: query.clone(), competition: env::var("STREAMGOAL_COMPETITION").ok() };

    loop {
        let any_live = if route.trim_end_matches('/') == "/live-tv" {
            render_channels(&api, &query).await;
            false
        } else {
            match api.matches().await {
                Ok(mut matches) => {
                    sort_matches(&mut matches);
                    render_matches(&route, &matches, &filter, &favorites);
                    matches.iter().any(|m| m.status == catalog_store::MatchStatus::Live)
                }
                Err(e) => {
                    warn!("Failed to load matches: {}", e.message());
                    false
                }
            }
        };

        if let Some(banner) = overlay.view().banner {
            info!("[ad] {} → {}", banner.name, banner.click_url.as_deref().unwrap_or("-"));
        }

        let interval = if any_live { LIVE_POLL_SECS.min(poll_secs) } else { poll_secs };

        tokio::select! {
            _ = sleep(Duration::from_secs(interval)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    overlay.unmount().await;
    Ok(())
}

fn render_matches(route: &str, matches: &[Match], filter: &MatchFilter, favorites: &Favorites) {
    let now = chrono::Local::now();
    let print = |title: &str, rows: &[Match]| {
        info!("── {title} ({}) ──", rows.len());
        for m in rows {
            let star = if favorites.is_favorite(&m.id) { "★" } else { " " };
            info!("{star} {}", MatchCard::project(m, &now).line());
        }
    };

    match route.trim_end_matches('/') {
        "" => {
            let sections = home_sections(matches);
            if sections.is_empty() {
                info!("No matches scheduled");
                return;
            }
            print("Live Now", &sections.live);
            print("Upcoming", &sections.upcoming);
            print("Finished", &sections.finished);
        }
        "/favorites" => {
            let ids = favorites.ids();
            if ids.is_empty() {
                info!("No favorites yet");
                return;
            }
            print("Favorites", &favorite_matches(matches, &ids));
        }
        _ => {
            let shown: Vec<Match> = filter_matches(matches, filter).into_iter().cloned().collect();
            print("Matches", &shown);
        }
    }
}

async fn render_channels(api: &CatalogApi<Backend>, query: &str) {
    let channels = match api.live_tvs().await {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to load channels: {}", e.message());
            return;
        }
    };
    let filter = ChannelFilter { query: query.to_string(), category: env::var("STREAMGOAL_CATEGORY").ok() };
    let shown = filter_channels(&channels, &filter);
    info!("── Live TV ({}) ──", shown.len());
    for tv in shown {
        let premium = if tv.is_premium { " [premium]" } else { "" };
        info!("📺 {} · {}{premium}", tv.name, tv.subtitle());
    }
}
