//! Live reload message protocol.
//!
//! JSON over WebSocket, server to browser:
//!
//! - `{"type":"connected","version":"0.3.0"}` on handshake
//! - `{"type":"reload"}` full page reload
//! - `{"type":"css","target":"css/main.css","content":"..."}` replace one stylesheet

use serde::{Deserialize, Serialize};

use super::ReloadSignal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload
    Reload,

    /// Stylesheet update, applied without reloading
    Css {
        /// Stylesheet href relative to the served root
        target: String,
        /// New CSS content
        content: String,
    },

    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },
}

impl ReloadMessage {
    /// Create a connected message
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string
    #[cfg(test)]
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

impl From<&ReloadSignal> for ReloadMessage {
    fn from(signal: &ReloadSignal) -> Self {
        match signal {
            ReloadSignal::FullReload => Self::Reload,
            ReloadSignal::StyleInject { href, content } => Self::Css {
                target: href.clone(),
                content: content.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_json() {
        assert_eq!(ReloadMessage::Reload.to_json(), r#"{"type":"reload"}"#);
    }

    #[test]
    fn test_css_json() {
        let msg = ReloadMessage::from(&ReloadSignal::StyleInject {
            href: "css/main.css".into(),
            content: "a{color:red}\n".into(),
        });
        assert_eq!(
            msg.to_json(),
            r#"{"type":"css","target":"css/main.css","content":"a{color:red}\n"}"#
        );
        assert_eq!(ReloadMessage::from_json(&msg.to_json()), Some(msg));
    }

    #[test]
    fn test_connected_carries_version() {
        let json = ReloadMessage::connected().to_json();
        assert!(json.starts_with(r#"{"type":"connected","version":""#));
        assert!(json.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_unknown_message_rejected() {
        assert_eq!(ReloadMessage::from_json(r#"{"type":"patch"}"#), None);
        assert_eq!(ReloadMessage::from_json("not json"), None);
    }
}
