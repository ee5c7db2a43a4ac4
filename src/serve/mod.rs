//! Development server with live reload support.
//!
//! Serves the destination root over HTTP. HTML responses get the live
//! reload client injected; the client connects to the [`LiveReload`] hub.

mod lifecycle;
mod path;
mod response;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_http::{Request, Server};

use crate::config::ServeConfig;
use crate::reload::{self, LiveReload};
use crate::{debug, log};

/// Bound HTTP server, ready to accept requests.
pub struct DevServer {
    server: Arc<Server>,
    addr: SocketAddr,
    root: PathBuf,
    reload: Arc<LiveReload>,
}

impl DevServer {
    /// Bind the HTTP listener without starting the request loop.
    pub fn bind(config: &ServeConfig, root: &Path, reload: Arc<LiveReload>) -> Result<Self> {
        let (server, addr) = lifecycle::bind_with_retry(config.interface, config.port)?;

        Ok(Self {
            server: Arc::new(server),
            addr,
            root: root.to_path_buf(),
            reload,
        })
    }

    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle used to unblock the request loop on shutdown.
    pub fn handle(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Run the request loop until the server is unblocked.
    pub fn run(self) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .thread_name(|i| format!("kiln-http-{i}"))
            .build()
            .context("failed to create request thread pool")?;

        let root = Arc::new(self.root);
        let reload_port = self.reload.port();

        for request in self.server.incoming_requests() {
            let root = Arc::clone(&root);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &root, reload_port) {
                    log!("serve"; "request error: {e}");
                }
            });
        }

        debug!("serve"; "request loop stopped");
        Ok(())
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, root: &Path, reload_port: u16) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let url = request.url().to_string();
    debug!("serve"; "{} {}", request.method(), url);

    if path::normalize_url(&url) == reload::CLIENT_PATH.trim_start_matches('/') {
        return response::respond_client_js(request, reload_port);
    }

    match path::resolve_path(&url, root) {
        Some(file) => response::respond_file(request, &file),
        None => response::respond_not_found(request, root),
    }
}
