//! Commands composed from the build steps.
//!
//! ```text
//! clean   Clean
//! build   Clean → (Markup ∥ Style ∥ Image)
//! dev     build → DevServer + LiveReload → WatchOrchestrator (until Ctrl+C)
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use crossbeam::channel::Sender;

use crate::config::KilnConfig;
use crate::log;
use crate::reload::LiveReload;
use crate::serve::DevServer;
use crate::step::{
    BuildError, BuildStep, CleanStep, ImageStep, MarkupStep, StepReport, StyleStep, ensure_source,
};
use crate::utils::plural_count;
use crate::watch::{self, WatchOrchestrator};

/// Delete the destination root.
pub fn clean(config: &KilnConfig) -> Result<StepReport> {
    let layout = config.layout();
    let report = CleanStep::new(&layout.dest_root).run()?;

    if report.removed.is_empty() {
        crate::debug!("clean"; "{} does not exist", config.root_relative(&layout.dest_root).display());
    } else {
        log!(
            "clean";
            "removed {} ({})",
            config.root_relative(&layout.dest_root).display(),
            plural_count(report.removed.len(), "path")
        );
    }
    Ok(report)
}

/// Clean, then run every enabled step once.
///
/// Missing sources, clean failures, markup failures and write failures abort
/// the build. Stylesheets or images that fail to compile are logged and
/// skipped.
pub fn build(config: &KilnConfig) -> Result<StepReport> {
    let layout = config.layout();
    for (category, dir) in layout.sources() {
        ensure_source(category, dir)?;
    }

    let started = Instant::now();
    let mut report = clean(config)?;

    let markup = MarkupStep::new(&layout);
    let style = StyleStep::new(&layout, &config.styles);
    let images = ImageStep::new(&layout, &config.images);

    let (markup_result, (style_result, image_result)) = rayon::join(
        || run_step(&markup),
        || {
            rayon::join(
                || run_step(&style),
                || images.as_ref().map(|step| run_step(step)),
            )
        },
    );

    report.merge(markup_result?);
    report.merge(style_result?);
    if let Some(image_result) = image_result {
        report.merge(image_result?);
    }

    log!(
        "build";
        "{} written in {:.2?}",
        plural_count(report.written.len(), "file"),
        started.elapsed()
    );
    if report.failures > 0 {
        log!("warning"; "{} skipped, see errors above", plural_count(report.failures, "file"));
    }
    Ok(report)
}

/// Build, serve the output and rebuild on change until interrupted.
pub fn dev(config: &KilnConfig) -> Result<()> {
    build(config)?;

    let session = DevSession::start(config)?;
    crate::core::register_server(session.server.handle(), session.shutdown.clone());
    session.run()
}

/// Bound server, live reload hub and running watcher of one `dev` run.
struct DevSession {
    server: DevServer,
    reload_port: u16,
    shutdown: Sender<()>,
    watcher: JoinHandle<Result<()>>,
}

impl DevSession {
    /// Bind both listeners and start watching. Expects a finished build.
    fn start(config: &KilnConfig) -> Result<Self> {
        let layout = config.layout();
        let hub = LiveReload::bind(config.serve.interface, config.serve.reload_port)?;
        let server = DevServer::bind(&config.serve, &layout.dest_root, Arc::clone(&hub))?;
        log!("serve"; "http://{}", server.addr());

        let reload_port = hub.port();
        let orchestrator = WatchOrchestrator::new(config, hub)?;
        log!(
            "watch";
            "watching {}",
            watch::describe_roots(&config.root, layout.sources().map(|(_, dir)| dir))
        );

        let (shutdown, shutdown_rx) = crossbeam::channel::bounded(1);
        let watcher = std::thread::Builder::new()
            .name("kiln-watch".into())
            .spawn(move || -> Result<()> {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .thread_name("kiln-watch-worker")
                    .enable_all()
                    .build()
                    .context("failed to start watch runtime")?;
                let result = runtime.block_on(orchestrator.run(shutdown_rx));
                if let Err(e) = &result {
                    log!("error"; "watcher stopped: {:#}", e);
                }
                result
            })
            .context("failed to spawn watcher thread")?;

        Ok(Self {
            server,
            reload_port,
            shutdown,
            watcher,
        })
    }

    /// Serve until the server is unblocked, then stop the watcher.
    fn run(self) -> Result<()> {
        let served = self.server.run();
        let _ = self.shutdown.try_send(());

        let watched = self
            .watcher
            .join()
            .map_err(|_| anyhow!("watcher thread panicked"))?;
        served.and(watched)
    }
}

fn run_step(step: &dyn BuildStep) -> Result<StepReport, BuildError> {
    let started = Instant::now();
    let report = step.run()?;
    crate::debug!(
        step.name();
        "{} in {:.2?}",
        plural_count(report.written.len(), "file"),
        started.elapsed()
    );
    Ok(report)
}
