//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! debounce_ms = 300    # quiet period before a change triggers a rebuild
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConfigDiagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.debounce_ms > 10_000 {
            diag.error_with_hint(
                "watch.debounce_ms",
                format!("{}ms is longer than 10 seconds", self.debounce_ms),
                "rebuilds would appear stuck; try 100-1000",
            );
        }
    }
}
