//! Watch orchestrator.
//!
//! Watches every source directory and re-runs the steps bound to the
//! category of each changed file, then tells the browser.
//!
//! ```text
//! notify ──► bridge thread ──► Debouncer ──► route by glob ──► category worker ──► steps ──► ReloadSink
//!                                                                (one per category)
//! ```
//!
//! All changes of one category in one debounce window trigger one chain run.
//! Each category has its own worker task, so runs of the same category never
//! overlap while different categories proceed concurrently. Step errors are
//! reported and the watcher keeps going.

mod binding;
mod debouncer;
mod types;
mod watch_roots;


pub use binding::{BindingTable, WatchBinding};
pub use types::{Category, ChangeKind, ReloadAction};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use crate::config::KilnConfig;
use crate::logger::{status_error, status_success, status_warning};
use crate::reload::{ReloadSignal, ReloadSink};
use crate::step::StepReport;
use crate::utils::plural_count;
use crate::{debug, log};
use debouncer::Debouncer;
use watch_roots::WatchRoots;

/// How often the event loop checks for shutdown and missing watch roots.
const MAINTENANCE_INTERVAL: Duration = Duration::from_millis(100);

pub struct WatchOrchestrator {
    root: PathBuf,
    roots: Vec<PathBuf>,
    table: BindingTable,
    sink: Arc<dyn ReloadSink>,
    debounce: Duration,
}

impl WatchOrchestrator {
    pub fn new(config: &KilnConfig, sink: Arc<dyn ReloadSink>) -> Result<Self> {
        let layout = config.layout();
        Ok(Self {
            root: config.root.clone(),
            roots: layout.sources().map(|(_, p)| p.to_path_buf()).collect(),
            table: BindingTable::from_config(config)?,
            sink,
            debounce: config.watch.debounce(),
        })
    }

    /// Group changed paths by the binding they match, in table order.
    ///
    /// Paths that match no binding are dropped.
    pub fn route(
        &self,
        changes: &FxHashMap<PathBuf, ChangeKind>,
    ) -> Vec<(Arc<WatchBinding>, Vec<PathBuf>)> {
        let mut routed: Vec<(Arc<WatchBinding>, Vec<PathBuf>)> = Vec::new();

        for (path, kind) in changes {
            let rel = binding::to_slash(path.strip_prefix(&self.root).unwrap_or(path));
            let Some(binding) = self.table.find(&rel) else {
                debug!("watch"; "ignored {}: {}", kind.label(), rel);
                continue;
            };
            debug!("watch"; "{} {}: {}", binding.category, kind.label(), rel);

            match routed.iter_mut().find(|(b, _)| b.category == binding.category) {
                Some((_, paths)) => paths.push(path.clone()),
                None => routed.push((Arc::clone(binding), vec![path.clone()])),
            }
        }

        routed.sort_by_key(|(b, _)| b.category);
        for (_, paths) in &mut routed {
            paths.sort();
        }
        routed
    }

    /// Route and run every affected chain on the current thread.
    ///
    /// Returns the signals sent, in order.
    #[cfg(test)]
    pub fn handle_changes(&self, changes: &FxHashMap<PathBuf, ChangeKind>) -> Vec<ReloadSignal> {
        self.route(changes)
            .into_iter()
            .flat_map(|(binding, paths)| run_chain(&binding, &paths, self.sink.as_ref()))
            .collect()
    }

    /// Watch until `shutdown` fires.
    pub async fn run(self, shutdown: Receiver<()>) -> Result<()> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .context("failed to create file watcher")?;

        let mut roots = WatchRoots::new(self.roots.clone());
        roots
            .attach_existing(&mut watcher)
            .context("failed to watch source directories")?;
        debug!("watch"; "watching {} directories", roots.attached_count());

        let (event_tx, mut event_rx) = mpsc::channel::<notify::Event>(64);
        std::thread::Builder::new()
            .name("kiln-notify".into())
            .spawn(move || {
                while let Ok(result) = notify_rx.recv() {
                    match result {
                        Ok(event) => {
                            if event_tx.blocking_send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => log!("watch"; "notify error: {}", e),
                    }
                }
            })?;

        let workers = self.spawn_workers();
        let mut debouncer = Debouncer::new(self.debounce);
        let mut maintenance = tokio::time::interval(MAINTENANCE_INTERVAL);

        loop {
            tokio::select! {
                biased;
                Some(event) = event_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if let Some(changes) = debouncer.take_if_ready() {
                        for (binding, paths) in self.route(&changes) {
                            if let Some(tx) = workers.get(&binding.category) {
                                let _ = tx.send(paths);
                            }
                        }
                    }
                }
                _ = maintenance.tick() => {
                    if shutdown.try_recv().is_ok() || crate::core::is_shutdown() {
                        debug!("watch"; "shutdown signal received");
                        break;
                    }
                    roots.maintain(&mut watcher);
                }
            }
        }

        Ok(())
    }

    /// One worker task per binding; each serializes its own chain runs.
    fn spawn_workers(&self) -> FxHashMap<Category, mpsc::UnboundedSender<Vec<PathBuf>>> {
        let mut workers = FxHashMap::default();

        for binding in self.table.bindings() {
            let (tx, mut rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();
            let category = binding.category;
            let binding = Arc::clone(binding);
            let sink = Arc::clone(&self.sink);

            tokio::spawn(async move {
                while let Some(mut paths) = rx.recv().await {
                    // Fold triggers that queued up while the last run was busy.
                    while let Ok(more) = rx.try_recv() {
                        paths.extend(more);
                    }
                    paths.sort();
                    paths.dedup();

                    let binding = Arc::clone(&binding);
                    let sink = Arc::clone(&sink);
                    let result = tokio::task::spawn_blocking(move || {
                        run_chain(&binding, &paths, sink.as_ref());
                    })
                    .await;
                    if let Err(e) = result {
                        log!("error"; "watch worker panicked: {}", e);
                    }
                }
            });

            workers.insert(category, tx);
        }

        workers
    }
}

/// Run a binding's steps in order, then apply its reload action.
///
/// Returns the signals sent to `sink`. A failing step stops the chain and
/// sends nothing.
pub fn run_chain(
    binding: &WatchBinding,
    changed: &[PathBuf],
    sink: &dyn ReloadSink,
) -> Vec<ReloadSignal> {
    let mut report = StepReport::default();

    for step in &binding.steps {
        match step.run() {
            Ok(step_report) => report.merge(step_report),
            Err(e) => {
                let err = anyhow::Error::from(e);
                status_error(
                    &format!("{} rebuild failed", binding.category),
                    &format!("{err:#}"),
                );
                return Vec::new();
            }
        }
    }

    let signals: Vec<ReloadSignal> = match binding.action {
        ReloadAction::FullReload => vec![ReloadSignal::FullReload],
        ReloadAction::StyleInject => report
            .styles
            .into_iter()
            .map(|style| ReloadSignal::StyleInject {
                href: style.href,
                content: style.content,
            })
            .collect(),
    };

    for signal in &signals {
        sink.send(signal);
    }

    let summary = format!(
        "{}: {}",
        binding.category,
        describe_changes(changed).unwrap_or_else(|| plural_count(report.written.len(), "file"))
    );
    if report.failures > 0 {
        status_warning(&format!(
            "{summary} ({} failed)",
            plural_count(report.failures, "file")
        ));
    } else {
        status_success(&summary);
    }

    signals
}

/// Short description of what changed, e.g. `main.scss` or `3 files`.
fn describe_changes(changed: &[PathBuf]) -> Option<String> {
    match changed {
        [] => None,
        [single] => single
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        many => Some(plural_count(many.len(), "file")),
    }
}

/// Source directories that are watched, for the startup log.
pub fn describe_roots<'a>(root: &Path, roots: impl Iterator<Item = &'a Path>) -> String {
    roots
        .map(|p| binding::to_slash(p.strip_prefix(root).unwrap_or(p)))
        .collect::<Vec<_>>()
        .join(", ")
}
