//! StreamGoal — Ad Overlay
//!
//! Per-route banner + delayed popup. The overlay is never blank: an empty or
//! failed fetch falls back to built-in slots, which are never counted.

pub mod overlay;
pub mod plan;

pub use overlay::{spawn_overlay, AdOverlay, AdSlot, OverlayView};
pub use plan::{
    fallback_banner, fallback_popup, is_fallback, plan_overlay, OverlayPlan, ScheduledPopup, DEFAULT_POPUP_DELAY,
    FALLBACK_BANNER_ID, FALLBACK_CLICK_URL, FALLBACK_POPUP_ID,
};
