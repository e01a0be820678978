//! Async owner of one `PlayerMachine`.
//!
//! One tokio task per mounted player. Inputs (user actions, surface signals,
//! watchdog firings) arrive over an mpsc channel; the task applies effects:
//! commands go out on the surface channel, the watchdog is a spawned sleep
//! that is aborted whenever the machine says so, and every state change is
//! published on a `watch` channel and logged.

use anyhow::{anyhow, Result};
use logger::{now_iso, EventLogger, PlaybackTransitionEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::locator::StreamDescriptor;
use crate::machine::{Effect, Input, PlayerMachine, PlayerState, PlayerView};
use crate::signal::{HostCommand, SurfaceSignal};

const INPUT_BUFFER: usize = 64;

pub struct PlaybackSession {
    label:  String,
    inputs: mpsc::Sender<Input>,
    view:   watch::Receiver<PlayerView>,
    task:   JoinHandle<()>,
}

/// Mounts the player: spawns its task and immediately starts loading.
/// The returned receiver yields commands for the embedded surface.
pub fn spawn_session(
    descriptor: &StreamDescriptor,
    config: &PlayerConfig,
    event_log: Option<Arc<EventLogger>>,
) -> (PlaybackSession, mpsc::UnboundedReceiver<HostCommand>) {
    let machine = PlayerMachine::new(descriptor, config);
    let label = descriptor.label();

    let (in_tx, in_rx) = mpsc::channel::<Input>(INPUT_BUFFER);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<HostCommand>();
    let (view_tx, view_rx) = watch::channel(machine.view());

    let runner = SessionRunner {
        machine,
        label: label.clone(),
        weak_inputs: in_tx.downgrade(),
        out: out_tx,
        view: view_tx,
        event_log,
        watchdog: None,
    };
    let task = tokio::spawn(runner.run(in_rx));

    (PlaybackSession { label, inputs: in_tx, view: view_rx, task }, out_rx)
}

impl PlaybackSession {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn view(&self) -> PlayerView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerView> {
        self.view.clone()
    }

    pub async fn send(&self, input: Input) -> Result<()> {
        self.inputs
            .send(input)
            .await
            .map_err(|_| anyhow!("playback session {} is closed", self.label))
    }

    pub async fn signal(&self, signal: SurfaceSignal) -> Result<()> {
        self.send(Input::Signal(signal)).await
    }

    /// Raw text from the surface. Returns false for messages that are not
    /// part of the contract; those are dropped.
    pub async fn surface_text(&self, text: &str) -> Result<bool> {
        match SurfaceSignal::decode(text) {
            Some(signal) => self.signal(signal).await.map(|_| true),
            None => {
                debug!(session = %self.label, "ignoring surface message {text:?}");
                Ok(false)
            }
        }
    }

    pub async fn refresh(&self) -> Result<()> {
        self.send(Input::Refresh).await
    }

    pub async fn switch_source(&self) -> Result<()> {
        self.send(Input::SwitchSource).await
    }

    pub async fn select_source(&self, index: usize) -> Result<()> {
        self.send(Input::SelectSource(index)).await
    }

    pub async fn toggle_mute(&self) -> Result<()> {
        self.send(Input::ToggleMute).await
    }

    pub async fn toggle_fullscreen(&self) -> Result<()> {
        self.send(Input::ToggleFullscreen).await
    }

    /// Cancels the watchdog and waits for the task to finish. Anything the
    /// surface sends afterwards is discarded.
    pub async fn unmount(self) {
        let _ = self.inputs.send(Input::Unmount).await;
        if let Err(e) = self.task.await {
            warn!(session = %self.label, "playback task ended abnormally: {e}");
        }
    }
}

struct SessionRunner {
    machine:     PlayerMachine,
    label:       String,
    weak_inputs: mpsc::WeakSender<Input>,
    out:         mpsc::UnboundedSender<HostCommand>,
    view:        watch::Sender<PlayerView>,
    event_log:   Option<Arc<EventLogger>>,
    watchdog:    Option<JoinHandle<()>>,
}

impl SessionRunner {
    async fn run(mut self, mut inputs: mpsc::Receiver<Input>) {
        self.step(Input::Mount);

        while let Some(input) = inputs.recv().await {
            self.step(input);
            if self.machine.is_unmounted() {
                break;
            }
        }

        // every handle dropped without an explicit unmount
        if !self.machine.is_unmounted() {
            self.step(Input::Unmount);
        }
        self.cancel_watchdog();
        debug!(session = %self.label, "playback task finished");
    }

    fn step(&mut self, input: Input) {
        let effects = self.machine.handle(input);
        if effects.is_empty() {
            return;
        }
        for effect in effects {
            self.apply(effect);
        }
        self.view.send_replace(self.machine.view());
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Transition { from, to, cause } => {
                let source = self.machine.current_source();
                let locator = source.map(|s| s.locator.clone());
                let source_index = self.machine.view().source_index;

                match to {
                    PlayerState::Error => warn!(
                        session = %self.label, from = from.as_str(), cause = cause.as_str(),
                        "playback error"
                    ),
                    _ => info!(
                        session = %self.label, from = from.as_str(), to = to.as_str(),
                        cause = cause.as_str(), source_index, "playback transition"
                    ),
                }

                if let Some(log) = &self.event_log {
                    let event = PlaybackTransitionEvent {
                        ts:      now_iso(),
                        event:   "PLAYBACK_TRANSITION",
                        session: self.label.clone(),
                        from:    from.as_str().to_string(),
                        to:      to.as_str().to_string(),
                        cause:   cause.as_str().to_string(),
                        locator,
                        source_index,
                    };
                    if let Err(e) = log.log(&event) {
                        warn!("event log write failed: {e}");
                    }
                }
            }

            Effect::StartWatchdog { generation, after } => {
                self.cancel_watchdog();
                // weak: a pending watchdog must not keep the session alive
                let weak = self.weak_inputs.clone();
                self.watchdog = Some(tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    if let Some(tx) = weak.upgrade() {
                        let _ = tx.send(Input::WatchdogFired { generation }).await;
                    }
                }));
            }

            Effect::CancelWatchdog => self.cancel_watchdog(),

            Effect::Send(cmd) => {
                if self.out.send(cmd).is_err() {
                    debug!(session = %self.label, "surface link gone, command dropped");
                }
            }

            Effect::SetFullscreen(on) => {
                debug!(session = %self.label, fullscreen = on, "fullscreen toggled");
            }
        }
    }

    fn cancel_watchdog(&mut self) {
        if let Some(handle) = self.watchdog.take() {
            handle.abort();
        }
    }
}
