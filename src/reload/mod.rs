//! Live reload.
//!
//! - `signal` - what a rebuild asks of the browser, and the sink trait
//! - `message` - JSON wire format
//! - `hub` - connected clients and broadcast
//! - `server` - WebSocket listener

mod hub;
mod message;
mod server;
mod signal;

pub use hub::LiveReload;
pub use message::ReloadMessage;
#[cfg(test)]
pub use signal::RecordingSink;
pub use signal::{ReloadSignal, ReloadSink};

/// URL the dev server serves the client script from.
pub const CLIENT_PATH: &str = "/__kiln/livereload.js";

const CLIENT_JS: &str = include_str!("client.js");

/// Browser client, connecting back to the WebSocket on `port`.
pub fn client_js(port: u16) -> String {
    CLIENT_JS.replace("__RELOAD_PORT__", &port.to_string())
}

/// `<script>` tag loading the client.
pub fn client_tag() -> String {
    format!(r#"<script src="{CLIENT_PATH}"></script>"#)
}
