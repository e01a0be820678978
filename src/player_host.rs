//! player-host — WS host for embedded playback surfaces
//!
//! Each surface connects to `ws://{PLAYER_HOST_BIND}/play/{match|channel}/{id}`.
//! The host looks the stream up, mounts a playback session for it and then
//! relays: session commands go out as text frames (`load` JSON or a bare
//! control token), surface text comes back in as `videoPlaying` / `videoError`.
//! Closing the socket unmounts the session. A stream with no locator gets one
//! `unavailable` frame and a close.
//!
//! HTTP side (PLAYER_HTTP_BIND): GET /health, GET /state,
//! POST /sessions/{n}/{refresh|switch|mute|fullscreen|select/{i}}.
//!
//! Run:
//!   PLAYER_HOST_BIND=0.0.0.0:8090 cargo run --bin player-host

use anyhow::{anyhow, bail, Context, Result};
use catalog_store::{Backend, CatalogApi};
use futures_util::{SinkExt, StreamExt};
use logger::{now_iso, EventLogger, PlayerHostHeartbeatEvent};
use playback::machine::MSG_UNAVAILABLE;
use playback::{spawn_session, HostCommand, Input, PlaybackSession, PlayerConfig, PlayerState, PlayerView, StreamDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{accept_hdr_async, tungstenite::Message};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const HEARTBEAT_EVERY: Duration = Duration::from_secs(10);

// ── Shared state ─────────────────────────────────────────────────────────────

struct SessionEntry {
    peer:    SocketAddr,
    session: Arc<PlaybackSession>,
}

#[derive(Clone)]
struct PlayerHostState {
    sessions:    Arc<RwLock<BTreeMap<u64, SessionEntry>>>,
    connections: Arc<RwLock<usize>>,
    next_id:     Arc<AtomicU64>,
}

impl PlayerHostState {
    fn new() -> Self {
        Self {
            sessions:    Arc::new(RwLock::new(BTreeMap::new())),
            connections: Arc::new(RwLock::new(0)),
            next_id:     Arc::new(AtomicU64::new(1)),
        }
    }

    async fn register(&self, peer: SocketAddr, session: Arc<PlaybackSession>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.write().await.insert(id, SessionEntry { peer, session });
        id
    }

    async fn session(&self, id: u64) -> Option<Arc<PlaybackSession>> {
        self.sessions.read().await.get(&id).map(|e| e.session.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
struct HttpSessionItem {
    id:    u64,
    peer:  String,
    label: String,
    view:  PlayerView,
}

#[derive(Debug, Clone, Serialize)]
struct HttpStateResponse {
    ts:          String,
    connections: usize,
    sessions:    Vec<HttpSessionItem>,
}

async fn build_state_snapshot(state: &PlayerHostState) -> HttpStateResponse {
    let connections = *state.connections.read().await;
    let sessions = state
        .sessions
        .read()
        .await
        .iter()
        .map(|(id, e)| HttpSessionItem {
            id:    *id,
            peer:  e.peer.to_string(),
            label: e.session.label().to_string(),
            view:  e.session.view(),
        })
        .collect();
    HttpStateResponse { ts: now_iso(), connections, sessions }
}

// ── HTTP ─────────────────────────────────────────────────────────────────────

/// `/sessions/{n}/{action}` → control input for that session.
async fn session_control(state: &PlayerHostState, path: &str) -> Result<String> {
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    let (id, action) = match parts.as_slice() {
        ["sessions", id, rest @ ..] if !rest.is_empty() => (id.parse::<u64>().context("bad session id")?, rest),
        _ => bail!("unknown route"),
    };
    let session = state.session(id).await.ok_or_else(|| anyhow!("no session {id}"))?;

    match action {
        ["refresh"]    => session.refresh().await?,
        ["switch"]     => session.switch_source().await?,
        ["mute"]       => session.toggle_mute().await?,
        ["fullscreen"] => session.toggle_fullscreen().await?,
        ["select", i]  => session.select_source(i.parse::<usize>().context("bad source index")?).await?,
        _ => bail!("unknown action"),
    }
    Ok(format!("{} {}", session.label(), action.join("/")))
}

async fn handle_http_connection(mut stream: TcpStream, state: PlayerHostState) -> Result<()> {
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await.context("http read")?;
    if n == 0 {
        return Ok(());
    }

    let req = String::from_utf8_lossy(&buf[..n]);
    let first_line = req.lines().next().unwrap_or_default();
    let mut parts = first_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");

    let (status_line, content_type, body) = match (method, path) {
        ("GET", "/health") => ("HTTP/1.1 200 OK", "text/plain; charset=utf-8", "ok".to_string()),
        ("GET", "/state") => {
            let snap = build_state_snapshot(&state).await;
            let json = serde_json::to_string_pretty(&snap).unwrap_or_else(|_| "{}".to_string());
            ("HTTP/1.1 200 OK", "application/json; charset=utf-8", json)
        }
        ("POST", p) if p.starts_with("/sessions/") => match session_control(&state, p).await {
            Ok(done) => ("HTTP/1.1 200 OK", "text/plain; charset=utf-8", done),
            Err(e) => ("HTTP/1.1 404 Not Found", "text/plain; charset=utf-8", e.to_string()),
        },
        _ => ("HTTP/1.1 404 Not Found", "text/plain; charset=utf-8", "not found".to_string()),
    };

    let resp = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(resp.as_bytes()).await.context("http write")?;
    Ok(())
}

async fn start_http_server(state: PlayerHostState, bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind).await.context("http bind")?;
    info!("player-host http listening on http://{} (GET /health, /state; POST /sessions/..)", bind);

    loop {
        let (stream, peer) = listener.accept().await.context("http accept")?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_http_connection(stream, state).await {
                debug!("http handler err {}: {}", peer, e);
            }
        });
    }
}

// ── WebSocket ────────────────────────────────────────────────────────────────

async fn resolve_descriptor(api: &CatalogApi<Backend>, path: &str) -> Result<StreamDescriptor> {
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    match parts.as_slice() {
        ["play", "match", id] => api
            .match_by_id(id)
            .await
            .map_err(|e| anyhow!(e.message()))?
            .map(|m| StreamDescriptor::for_match(&m))
            .ok_or_else(|| anyhow!("match {id} not found")),
        ["play", "channel", id] => api
            .live_tv_by_id(id)
            .await
            .map_err(|e| anyhow!(e.message()))?
            .map(|tv| StreamDescriptor::for_channel(&tv))
            .ok_or_else(|| anyhow!("channel {id} not found")),
        _ => bail!("expected /play/match/{{id}} or /play/channel/{{id}}, got {path}"),
    }
}

async fn handle_socket(
    peer: SocketAddr,
    stream: TcpStream,
    state: PlayerHostState,
    api: Arc<CatalogApi<Backend>>,
    config: Arc<PlayerConfig>,
    logger: Arc<EventLogger>,
) -> Result<()> {
    let mut path = String::new();
    let ws_stream = accept_hdr_async(stream, |req: &Request, resp: Response| {
        path = req.uri().path().to_string();
        Ok(resp)
    })
    .await
    .context("WS handshake failed")?;

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    let descriptor = match resolve_descriptor(&api, &path).await {
        Ok(d) => d,
        Err(e) => {
            warn!("WS {} rejected: {e}", peer);
            let _ = ws_sink.send(Message::Close(None)).await;
            return Ok(());
        }
    };

    {
        let mut c = state.connections.write().await;
        *c += 1;
    }

    let (session, mut commands) = spawn_session(&descriptor, &config, Some(logger));
    let session = Arc::new(session);
    let id = state.register(peer, session.clone()).await;
    info!("WS surface connected: {} → session {} ({})", peer, id, session.label());

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                if let Err(e) = ws_sink.send(Message::Text(cmd.encode().into())).await {
                    warn!("WS send err to {}: {}", peer, e);
                    break;
                }
                if cmd == HostCommand::Unavailable {
                    info!("session {} has no stream, closing {}", id, peer);
                    let frame = CloseFrame { code: CloseCode::Normal, reason: MSG_UNAVAILABLE.to_string().into() };
                    let _ = ws_sink.send(Message::Close(Some(frame))).await;
                    break;
                }
            }
            msg = ws_stream.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!("WS recv err from {}: {}", peer, e);
                        break;
                    }
                    None => break,
                };
                match msg {
                    Message::Text(txt) => {
                        if let Err(e) = session.surface_text(&txt.to_string()).await {
                            warn!("session {} gone: {e}", id);
                            break;
                        }
                    }
                    Message::Ping(payload) => {
                        let _ = ws_sink.send(Message::Pong(payload)).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    info!("WS surface disconnected: {} (session {})", peer, id);
    state.sessions.write().await.remove(&id);
    match Arc::try_unwrap(session) {
        Ok(session) => session.unmount().await,
        // an HTTP handler still holds it; the task ends on this input anyway
        Err(session) => {
            let _ = session.send(Input::Unmount).await;
        }
    }
    {
        let mut c = state.connections.write().await;
        *c = c.saturating_sub(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bind = std::env::var("PLAYER_HOST_BIND").unwrap_or_else(|_| "0.0.0.0:8090".to_string());
    let addr: SocketAddr = bind.parse().context("Invalid PLAYER_HOST_BIND")?;
    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    info!("player-host listening on ws://{}/play/{{match|channel}}/{{id}}", addr);

    let backend = Backend::connect(
        std::env::var("SUPABASE_URL").ok().as_deref(),
        std::env::var("SUPABASE_ANON_KEY").ok().as_deref(),
    )
    .context("remote store setup failed")?;
    info!("player-host store: {}", backend.label());

    let config = Arc::new(PlayerConfig::from_env());
    info!(
        "watchdog {}s, max auto-retries {}, player page {}",
        config.watchdog.as_secs(),
        config.max_auto_retries,
        config.player_page.as_deref().unwrap_or("-")
    );

    let api = Arc::new(CatalogApi::new(backend));
    let log_dir = std::env::var("STREAMGOAL_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let logger = Arc::new(EventLogger::new(log_dir));
    let state = PlayerHostState::new();

    {
        let http_bind = std::env::var("PLAYER_HTTP_BIND").unwrap_or_else(|_| "127.0.0.1:8091".to_string());
        let http_addr: SocketAddr = http_bind.parse().context("Invalid PLAYER_HTTP_BIND")?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = start_http_server(state, http_addr).await {
                warn!("http server stopped: {e}");
            }
        });
    }

    // Heartbeat summary
    {
        let state = state.clone();
        let logger = Arc::clone(&logger);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(HEARTBEAT_EVERY).await;
                let connections = *state.connections.read().await;
                let views: Vec<PlayerView> =
                    state.sessions.read().await.values().map(|e| e.session.view()).collect();
                let count = |s: PlayerState| views.iter().filter(|v| v.state == s).count();

                let hb = PlayerHostHeartbeatEvent {
                    ts: now_iso(),
                    event: "PLAYER_HOST_HEARTBEAT",
                    connections,
                    sessions: views.len(),
                    playing: count(PlayerState::Playing),
                    errored: count(PlayerState::Error),
                };
                info!(
                    "heartbeat: connections={} sessions={} playing={} errored={}",
                    hb.connections, hb.sessions, hb.playing, hb.errored
                );
                if let Err(e) = logger.log(&hb) {
                    warn!("event log write failed: {e}");
                }
            }
        });
    }

    loop {
        let (stream, peer) = listener.accept().await.context("accept failed")?;
        let state = state.clone();
        let api = api.clone();
        let config = config.clone();
        let logger = Arc::clone(&logger);
        tokio::spawn(async move {
            if let Err(e) = handle_socket(peer, stream, state, api, config, logger).await {
                warn!("WS handler error {}: {}", peer, e);
            }
        });
    }
}
