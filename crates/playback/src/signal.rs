//! Wire contract with the embedded playback surface.
//!
//! Surface → host: the bare string tokens `videoPlaying` / `videoError`.
//! Host → surface: `toggleMute`, `retry`, `{"type":"sourceChange","index":N}`,
//! the `{"type":"load",...}` navigation frame that replaces setting an
//! iframe `src`, and `{"type":"unavailable","message":...}` when there is
//! nothing to play. Token spelling must not change; existing player pages
//! match on it literally.

use serde_json::{json, Value};

use crate::machine::MSG_UNAVAILABLE;
use crate::strategy::StrategyKind;

pub const TOKEN_PLAYING: &str = "videoPlaying";
pub const TOKEN_ERROR: &str = "videoError";
pub const TOKEN_TOGGLE_MUTE: &str = "toggleMute";
pub const TOKEN_RETRY: &str = "retry";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceSignal {
    Playing,
    Error,
}

impl SurfaceSignal {
    pub fn token(&self) -> &'static str {
        match self {
            SurfaceSignal::Playing => TOKEN_PLAYING,
            SurfaceSignal::Error   => TOKEN_ERROR,
        }
    }

    /// Accepts the raw token or its JSON string encoding. Anything else is
    /// not ours and is dropped.
    pub fn decode(text: &str) -> Option<Self> {
        match token_of(text)?.as_str() {
            TOKEN_PLAYING => Some(SurfaceSignal::Playing),
            TOKEN_ERROR   => Some(SurfaceSignal::Error),
            _             => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    ToggleMute,
    Retry,
    SourceChange { index: usize },
    Load { src: String, strategy: StrategyKind, muted: bool },
    /// Terminal: the surface shows a static message and gets nothing else.
    Unavailable,
}

impl HostCommand {
    pub fn encode(&self) -> String {
        match self {
            HostCommand::ToggleMute => TOKEN_TOGGLE_MUTE.to_string(),
            HostCommand::Retry      => TOKEN_RETRY.to_string(),
            HostCommand::SourceChange { index } => format!(r#"{{"type":"sourceChange","index":{index}}}"#),
            HostCommand::Load { src, strategy, muted } => json!({
                "type": "load",
                "src": src,
                "strategy": strategy.as_str(),
                "muted": muted,
            })
            .to_string(),
            HostCommand::Unavailable => json!({ "type": "unavailable", "message": MSG_UNAVAILABLE }).to_string(),
        }
    }

    /// Surface-side decoding, used by test surfaces.
    pub fn decode(text: &str) -> Option<Self> {
        if let Some(token) = token_of(text) {
            return match token.as_str() {
                TOKEN_TOGGLE_MUTE => Some(HostCommand::ToggleMute),
                TOKEN_RETRY       => Some(HostCommand::Retry),
                _                 => None,
            };
        }

        let value: Value = serde_json::from_str(text.trim()).ok()?;
        match value.get("type")?.as_str()? {
            "sourceChange" => Some(HostCommand::SourceChange {
                index: usize::try_from(value.get("index")?.as_u64()?).ok()?,
            }),
            "load" => Some(HostCommand::Load {
                src:      value.get("src")?.as_str()?.to_string(),
                strategy: value.get("strategy")?.as_str()?.parse().ok()?,
                muted:    value.get("muted").and_then(Value::as_bool).unwrap_or(false),
            }),
            "unavailable" => Some(HostCommand::Unavailable),
            _ => None,
        }
    }
}

/// Every message that crosses the surface boundary, either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceMessage {
    Signal(SurfaceSignal),
    Command(HostCommand),
}

impl SurfaceMessage {
    pub fn decode(text: &str) -> Option<Self> {
        SurfaceSignal::decode(text)
            .map(SurfaceMessage::Signal)
            .or_else(|| HostCommand::decode(text).map(SurfaceMessage::Command))
    }

    pub fn encode(&self) -> String {
        match self {
            SurfaceMessage::Signal(s)  => s.token().to_string(),
            SurfaceMessage::Command(c) => c.encode(),
        }
    }
}

/// `videoPlaying` or `"videoPlaying"` → `videoPlaying`. Objects and other
/// JSON values yield `None`.
fn token_of(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('"') {
        return serde_json::from_str::<String>(trimmed).ok();
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_tokens_raw_and_json_encoded() {
        assert_eq!(SurfaceSignal::decode("videoPlaying"), Some(SurfaceSignal::Playing));
        assert_eq!(SurfaceSignal::decode("\"videoError\""), Some(SurfaceSignal::Error));
        assert_eq!(SurfaceSignal::decode(" videoPlaying\n"), Some(SurfaceSignal::Playing));
    }

    #[test]
    fn unknown_messages_are_ignored() {
        assert_eq!(SurfaceSignal::decode("videoplaying"), None);
        assert_eq!(SurfaceSignal::decode("{\"type\":\"videoPlaying\"}"), None);
        assert_eq!(SurfaceSignal::decode(""), None);
        assert_eq!(SurfaceMessage::decode("[1,2]"), None);
        assert_eq!(HostCommand::decode("{\"type\":\"sourceChange\",\"index\":-1}"), None);
    }

    #[test]
    fn host_commands_encode_exactly() {
        assert_eq!(HostCommand::ToggleMute.encode(), "toggleMute");
        assert_eq!(HostCommand::Retry.encode(), "retry");
        assert_eq!(
            HostCommand::SourceChange { index: 2 }.encode(),
            r#"{"type":"sourceChange","index":2}"#
        );
        assert_eq!(
            serde_json::from_str::<Value>(&HostCommand::Unavailable.encode()).unwrap(),
            json!({ "type": "unavailable", "message": "Stream not available" })
        );
    }

    #[test]
    fn load_frame_decodes_on_the_surface_side() {
        let cmd = HostCommand::Load {
            src:      "https://a.example/x".into(),
            strategy: StrategyKind::Embed,
            muted:    true,
        };
        assert_eq!(HostCommand::decode(&cmd.encode()), Some(cmd.clone()));
        assert_eq!(
            SurfaceMessage::decode(&cmd.encode()),
            Some(SurfaceMessage::Command(cmd))
        );
        assert_eq!(
            SurfaceMessage::decode("videoError").map(|m| m.encode()),
            Some("videoError".to_string())
        );
    }
}
