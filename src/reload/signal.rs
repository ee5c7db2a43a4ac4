//! What the watcher tells the browser.

/// Outcome of a rebuild, as seen by connected browsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadSignal {
    /// Reload every page.
    FullReload,
    /// Swap one stylesheet in place.
    StyleInject { href: String, content: String },
}

/// Receiver of reload signals.
///
/// Implemented by the live reload hub. The watcher only sees this trait.
pub trait ReloadSink: Send + Sync {
    fn reload_all(&self);

    fn push_style(&self, href: &str, content: &str);

    fn send(&self, signal: &ReloadSignal) {
        match signal {
            ReloadSignal::FullReload => self.reload_all(),
            ReloadSignal::StyleInject { href, content } => self.push_style(href, content),
        }
    }
}

/// Sink that records every signal, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    signals: parking_lot::Mutex<Vec<ReloadSignal>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn signals(&self) -> Vec<ReloadSignal> {
        self.signals.lock().clone()
    }

    pub fn full_reloads(&self) -> usize {
        self.signals
            .lock()
            .iter()
            .filter(|s| matches!(s, ReloadSignal::FullReload))
            .count()
    }

    pub fn style_injects(&self) -> Vec<String> {
        self.signals
            .lock()
            .iter()
            .filter_map(|s| match s {
                ReloadSignal::StyleInject { href, .. } => Some(href.clone()),
                ReloadSignal::FullReload => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl ReloadSink for RecordingSink {
    fn reload_all(&self) {
        self.signals.lock().push(ReloadSignal::FullReload);
    }

    fn push_style(&self, href: &str, content: &str) {
        self.signals.lock().push(ReloadSignal::StyleInject {
            href: href.to_string(),
            content: content.to_string(),
        });
    }
}
