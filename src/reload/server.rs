//! WebSocket listener for live reload clients.

use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use anyhow::Result;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Bind the listener, trying the next ports when `base_port` is taken.
pub fn bind(interface: IpAddr, base_port: u16) -> Result<(TcpListener, u16)> {
    let (listener, port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    if base_port != 0 && port != base_port {
        crate::log!("reload"; "port {} in use, using {} instead", base_port, port);
    }
    Ok((listener, port))
}

/// Accept connections on a background thread, handing each stream to
/// `on_client`.
pub fn spawn_acceptor<F>(listener: TcpListener, on_client: F) -> Result<()>
where
    F: Fn(TcpStream) + Send + 'static,
{
    listener.set_nonblocking(true)?;

    thread::Builder::new()
        .name("kiln-reload-accept".into())
        .spawn(move || {
            while !crate::core::is_shutdown() {
                match listener.accept() {
                    Ok((stream, addr)) => {
                        crate::debug!("reload"; "client connected: {}", addr);
                        // Set blocking for the handshake
                        let _ = stream.set_nonblocking(false);
                        on_client(stream);
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(100));
                    }
                    Err(e) => {
                        crate::log!("reload"; "accept error: {}", e);
                        thread::sleep(Duration::from_millis(100));
                    }
                }
            }
        })?;

    Ok(())
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
