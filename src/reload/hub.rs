//! Live reload hub.
//!
//! Owns the connected WebSocket clients and fans reload messages out to
//! them. One hub is created per dev session and handed to whoever needs to
//! signal the browser.
//!
//! ```text
//! acceptor thread ──handshake──► clients ◄──poll── reader thread (drops closed)
//!                                   ▲
//! watcher ── ReloadSink ── broadcast┘
//! ```

use std::io;
use std::net::{IpAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::{ReloadMessage, ReloadSignal, ReloadSink, server};
use crate::{debug, log};

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

pub struct LiveReload {
    clients: Clients,
    port: u16,
}

impl LiveReload {
    /// Bind the WebSocket listener and start accepting clients.
    pub fn bind(interface: IpAddr, base_port: u16) -> Result<Arc<Self>> {
        let (listener, port) = server::bind(interface, base_port)?;
        let clients: Clients = Arc::new(Mutex::new(Vec::new()));

        let accepted = Arc::clone(&clients);
        server::spawn_acceptor(listener, move |stream| add_client(&accepted, stream))?;

        let polled = Arc::clone(&clients);
        thread::Builder::new()
            .name("kiln-reload-read".into())
            .spawn(move || client_reader_loop(polled))?;

        debug!("reload"; "ws://{}:{}", interface, port);
        Ok(Arc::new(Self { clients, port }))
    }

    /// Port the WebSocket listener is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    #[cfg(test)]
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Send a message to all connected clients, dropping dead ones.
    pub fn broadcast(&self, msg: &ReloadMessage) {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            debug!("reload"; "no clients connected");
            return;
        }

        let text = msg.to_json();
        clients.retain_mut(|ws| match ws.send(Message::Text(text.clone().into())) {
            Ok(()) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => true,
            Err(e) => {
                debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        debug!("reload"; "broadcast to {} clients", clients.len());
    }
}

impl ReloadSink for LiveReload {
    fn reload_all(&self) {
        self.send(&ReloadSignal::FullReload);
    }

    fn push_style(&self, href: &str, content: &str) {
        self.send(&ReloadSignal::StyleInject {
            href: href.to_string(),
            content: content.to_string(),
        });
    }

    fn send(&self, signal: &ReloadSignal) {
        self.broadcast(&ReloadMessage::from(signal));
    }
}

fn add_client(clients: &Clients, stream: TcpStream) {
    match tungstenite::accept(stream) {
        Ok(mut ws) => {
            let connected = ReloadMessage::connected();
            if let Err(e) = ws.send(Message::Text(connected.to_json().into())) {
                log!("reload"; "failed to send connected message: {}", e);
                return;
            }
            // Non-blocking from here on, for polling reads
            let _ = ws.get_ref().set_nonblocking(true);

            let mut clients = clients.lock();
            clients.push(ws);
            debug!("reload"; "client registered (total: {})", clients.len());
        }
        Err(e) => log!("reload"; "handshake failed: {}", e),
    }
}

/// Poll clients for close frames and errors.
fn client_reader_loop(clients: Clients) {
    while !crate::core::is_shutdown() {
        thread::sleep(Duration::from_millis(100));

        clients.lock().retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => true,
            Err(_) => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpStream};
    use std::time::Instant;

    fn wait_for(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn connect(port: u16) -> WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>> {
        let (ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
        ws
    }

    fn read_message(ws: &mut WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>>) -> ReloadMessage {
        loop {
            if let Message::Text(text) = ws.read().unwrap() {
                return ReloadMessage::from_json(text.as_str()).unwrap();
            }
        }
    }

    #[test]
    fn test_client_receives_connected_then_broadcasts() {
        let hub = LiveReload::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        let mut ws = connect(hub.port());

        assert!(matches!(read_message(&mut ws), ReloadMessage::Connected { .. }));
        wait_for(|| hub.client_count() == 1);

        hub.push_style("css/main.css", "a{color:red}");
        hub.reload_all();

        assert_eq!(
            read_message(&mut ws),
            ReloadMessage::Css {
                target: "css/main.css".into(),
                content: "a{color:red}".into(),
            }
        );
        assert_eq!(read_message(&mut ws), ReloadMessage::Reload);

        // The watcher only holds the trait object.
        let sink: Arc<dyn ReloadSink> = hub.clone();
        sink.send(&ReloadSignal::FullReload);
        assert_eq!(read_message(&mut ws), ReloadMessage::Reload);
    }

    #[test]
    fn test_closed_client_is_dropped() {
        let hub = LiveReload::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        let mut ws = connect(hub.port());
        read_message(&mut ws);
        wait_for(|| hub.client_count() == 1);

        ws.close(None).unwrap();
        let _ = ws.flush();
        wait_for(|| hub.client_count() == 0);

        // Broadcasting with nobody listening is a no-op
        hub.reload_all();
    }
}
