use catalog_store::{Advertisement, CatalogApi, RemoteStore};
use logger::{now_iso, AdCounterEvent, EventLogger};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::plan::{is_fallback, plan_overlay};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdSlot {
    Banner,
    Popup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counter {
    Impression,
    Click,
}

impl Counter {
    fn as_str(&self) -> &'static str {
        match self {
            Counter::Impression => "impression",
            Counter::Click      => "click",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayView {
    pub route:         String,
    /// False until the fetch settled (rows, empty or failed).
    pub loaded:        bool,
    pub banner:        Option<Advertisement>,
    /// Set once the reveal timer fired, cleared on close or click.
    pub popup:         Option<Advertisement>,
    pub popup_pending: bool,
}

enum OverlayInput {
    Click(AdSlot, oneshot::Sender<Option<String>>),
    Close(AdSlot),
    Unmount,
}

pub struct AdOverlay {
    route:  String,
    inputs: mpsc::Sender<OverlayInput>,
    view:   watch::Receiver<OverlayView>,
    task:   JoinHandle<()>,
}

/// Mounts the overlay for `route`: fetches, shows the banner, schedules the
/// popup reveal.
pub fn spawn_overlay<S>(api: Arc<CatalogApi<S>>, route: &str, event_log: Option<Arc<EventLogger>>) -> AdOverlay
where
    S: RemoteStore + 'static,
{
    let (in_tx, in_rx) = mpsc::channel(16);
    let (view_tx, view_rx) = watch::channel(OverlayView { route: route.to_string(), ..Default::default() });

    let runner = OverlayRunner { api, route: route.to_string(), view: view_tx, event_log };
    let task = tokio::spawn(runner.run(in_rx));

    AdOverlay { route: route.to_string(), inputs: in_tx, view: view_rx, task }
}

impl AdOverlay {
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn view(&self) -> OverlayView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OverlayView> {
        self.view.clone()
    }

    /// Records the click and returns the URL to open, if the slot is showing
    /// an ad with one. Clicking the popup also dismisses it.
    pub async fn click(&self, slot: AdSlot) -> Option<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inputs.send(OverlayInput::Click(slot, reply_tx)).await.ok()?;
        reply_rx.await.ok().flatten()
    }

    pub async fn close(&self, slot: AdSlot) {
        let _ = self.inputs.send(OverlayInput::Close(slot)).await;
    }

    /// Aborts an in-flight fetch and a pending reveal. Late results are dropped.
    pub async fn unmount(self) {
        let _ = self.inputs.send(OverlayInput::Unmount).await;
        if let Err(e) = self.task.await {
            warn!(route = %self.route, "overlay task ended abnormally: {e}");
        }
    }
}

struct OverlayRunner<S> {
    api:       Arc<CatalogApi<S>>,
    route:     String,
    view:      watch::Sender<OverlayView>,
    event_log: Option<Arc<EventLogger>>,
}

impl<S: RemoteStore + 'static> OverlayRunner<S> {
    async fn run(self, mut inputs: mpsc::Receiver<OverlayInput>) {
        // ── Fetch, abandoned on unmount ──────────────────────────────────────
        let fetch = self.api.active_ads_for_route(&self.route);
        tokio::pin!(fetch);

        let fetched = loop {
            tokio::select! {
                res = &mut fetch => break res,
                input = inputs.recv() => match input {
                    None | Some(OverlayInput::Unmount) => {
                        debug!(route = %self.route, "overlay unmounted before ads arrived");
                        return;
                    }
                    Some(OverlayInput::Click(_, reply)) => { let _ = reply.send(None); }
                    Some(OverlayInput::Close(_)) => {}
                },
            }
        };

        if let Err(e) = &fetched {
            warn!(route = %self.route, "ad fetch failed, showing fallback banner: {}", e.message());
        }
        let plan = plan_overlay(fetched, &mut rand::thread_rng());

        info!(
            route = %self.route,
            banner = %plan.banner.id,
            popup = plan.popup.as_ref().map(|p| p.ad.id.as_str()).unwrap_or("-"),
            "overlay planned"
        );
        self.count(&plan.banner.id, Counter::Impression);

        let mut pending = plan.popup.map(|p| (p.ad, Instant::now() + p.delay));
        self.view.send_modify(|v| {
            v.loaded = true;
            v.banner = Some(plan.banner);
            v.popup_pending = pending.is_some();
        });

        // ── Mounted ──────────────────────────────────────────────────────────
        loop {
            let deadline = pending.as_ref().map(|p| p.1).unwrap_or_else(Instant::now);
            tokio::select! {
                _ = sleep_until(deadline), if pending.is_some() => {
                    if let Some((ad, _)) = pending.take() {
                        debug!(route = %self.route, ad = %ad.id, "popup revealed");
                        self.count(&ad.id, Counter::Impression);
                        self.view.send_modify(|v| {
                            v.popup = Some(ad);
                            v.popup_pending = false;
                        });
                    }
                }
                input = inputs.recv() => match input {
                    None | Some(OverlayInput::Unmount) => break,
                    Some(OverlayInput::Click(slot, reply)) => {
                        let _ = reply.send(self.click(slot));
                    }
                    Some(OverlayInput::Close(slot)) => {
                        self.view.send_modify(|v| match slot {
                            AdSlot::Banner => v.banner = None,
                            AdSlot::Popup  => v.popup = None,
                        });
                    }
                },
            }
        }
        debug!(route = %self.route, "overlay unmounted");
    }

    fn click(&self, slot: AdSlot) -> Option<String> {
        let ad = {
            let view = self.view.borrow();
            match slot {
                AdSlot::Banner => view.banner.clone(),
                AdSlot::Popup  => view.popup.clone(),
            }
        }?;

        self.count(&ad.id, Counter::Click);
        if slot == AdSlot::Popup {
            self.view.send_modify(|v| v.popup = None);
        }
        ad.click_url.filter(|u| !u.trim().is_empty())
    }

    /// Fire-and-forget counter RPC. Failures are logged, never surfaced.
    fn count(&self, ad_id: &str, counter: Counter) {
        if is_fallback(ad_id) {
            return;
        }

        let api = self.api.clone();
        let ad_id = ad_id.to_string();
        let route = self.route.clone();
        let event_log = self.event_log.clone();

        tokio::spawn(async move {
            let res = match counter {
                Counter::Impression => api.increment_ad_impression(&ad_id).await,
                Counter::Click      => api.increment_ad_click(&ad_id).await,
            };
            let (ok, message) = match &res {
                Ok(())  => (true, String::new()),
                Err(e) => {
                    warn!(ad = %ad_id, counter = counter.as_str(), "ad counter failed: {}", e.message());
                    (false, e.message())
                }
            };

            if let Some(log) = event_log {
                let event = AdCounterEvent {
                    ts: now_iso(),
                    event: "AD_COUNTER",
                    ad_id,
                    counter: counter.as_str(),
                    route,
                    ok,
                    message,
                };
                if let Err(e) = log.log(&event) {
                    warn!("event log write failed: {e}");
                }
            }
        });
    }
}
