//! surface-sim — scripted embedded surface for player-host
//!
//! Connects like a real player page would and answers every `load` frame
//! according to SURFACE_MODE:
//!   play        → videoPlaying
//!   error       → videoError
//!   silent      → nothing (lets the host watchdog fire)
//!   fail-first  → videoError for the first SURFACE_FAILS loads, then videoPlaying
//!
//! Run:
//!   SURFACE_MODE=fail-first SURFACE_FAILS=2 cargo run --bin surface-sim

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use playback::{HostCommand, SurfaceMessage, SurfaceSignal};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Debug, Clone, Copy)]
enum Mode {
    Play,
    Error,
    Silent,
    FailFirst(u32),
}

impl Mode {
    fn from_env() -> Result<Self> {
        let fails = std::env::var("SURFACE_FAILS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);
        let mode = std::env::var("SURFACE_MODE").unwrap_or_else(|_| "play".to_string());
        Ok(match mode.trim() {
            "play"       => Mode::Play,
            "error"      => Mode::Error,
            "silent"     => Mode::Silent,
            "fail-first" => Mode::FailFirst(fails),
            other        => bail!("unknown SURFACE_MODE '{other}'"),
        })
    }

    fn answer(&self, loads_seen: u32) -> Option<SurfaceSignal> {
        match self {
            Mode::Play   => Some(SurfaceSignal::Playing),
            Mode::Error  => Some(SurfaceSignal::Error),
            Mode::Silent => None,
            Mode::FailFirst(n) if loads_seen <= *n => Some(SurfaceSignal::Error),
            Mode::FailFirst(_) => Some(SurfaceSignal::Playing),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let url = std::env::var("PLAYER_HOST_URL")
        .unwrap_or_else(|_| "ws://127.0.0.1:8090/play/match/match-1".to_string());
    let mode = Mode::from_env()?;
    let reply_delay = Duration::from_millis(
        std::env::var("SURFACE_REPLY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500),
    );

    let (ws, _resp) = connect_async(&url)
        .await
        .with_context(|| format!("connect to {url}"))?;
    let (mut sink, mut stream) = ws.split();
    println!("connected to {url} (mode {mode:?})");

    let mut loads_seen = 0u32;
    let mut muted = false;

    while let Some(msg) = stream.next().await {
        let text = match msg.context("ws recv")? {
            Message::Text(t) => t.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };

        match SurfaceMessage::decode(&text) {
            Some(SurfaceMessage::Command(HostCommand::Load { src, strategy, muted: m })) => {
                loads_seen += 1;
                muted = m;
                println!("load #{loads_seen} [{strategy}] {src} (muted={muted})");

                if let Some(signal) = mode.answer(loads_seen) {
                    tokio::time::sleep(reply_delay).await;
                    let reply = SurfaceMessage::Signal(signal).encode();
                    sink.send(Message::Text(reply.clone().into())).await?;
                    println!("  → {reply}");
                }
            }
            Some(SurfaceMessage::Command(HostCommand::ToggleMute)) => {
                muted = !muted;
                println!("mute toggled (muted={muted})");
            }
            Some(SurfaceMessage::Command(HostCommand::Unavailable)) => println!("host reports: stream not available"),
            Some(SurfaceMessage::Command(cmd)) => println!("control: {cmd:?}"),
            // surfaces never receive signals; anything else is outside the contract
            Some(SurfaceMessage::Signal(_)) | None => println!("ignored frame: {text}"),
        }
    }

    println!("host closed the connection after {loads_seen} loads");
    let _ = sink.send(Message::Close(None)).await;
    Ok(())
}
