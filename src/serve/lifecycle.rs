//! Server binding.

use anyhow::Result;
use std::net::{IpAddr, SocketAddr};
use tiny_http::Server;

use crate::log;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
///
/// Port `0` lets the OS pick; the returned address carries the real port.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let bound = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, bound));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn test_ephemeral_port_reports_real_port() {
        let (_server, addr) = bind_with_retry(LOCALHOST, 0).unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn test_busy_port_retries() {
        let (_held, held_addr) = bind_with_retry(LOCALHOST, 0).unwrap();
        let (_server, addr) = bind_with_retry(LOCALHOST, held_addr.port()).unwrap();
        assert!(addr.port() > held_addr.port());
    }
}
