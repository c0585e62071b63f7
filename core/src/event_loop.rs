//! The event loop
//!
//! One task owns the listener and the [`Server`]. Accepts and connection
//! events are handled strictly one at a time, so each input line's effects
//! are complete before anything else is looked at.

use crate::connection::{self, Event};
use crate::{Config, Error, Result, Server};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Capacity of the channel carrying reader events to the loop
const EVENT_QUEUE: usize = 1024;

/// Listener plus protocol engine
pub struct EventLoop {
    listener: TcpListener,
    server: Server,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
}

impl EventLoop {
    /// Bind the listening socket. Port 0 picks an ephemeral port.
    pub async fn bind(config: Config) -> Result<Self> {
        let address = config.listen_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| Error::Bind {
                address: address.clone(),
                source,
            })?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        Ok(Self {
            listener,
            server: Server::new(config),
            events_tx,
            events_rx,
        })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Serve forever
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes, then close every session
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.admit(stream, addr),
                    Err(e) => tracing::warn!("Failed to accept connection: {}", e),
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }

        self.server.close_all("Server shutting down");
        Ok(())
    }

    fn admit(&mut self, stream: TcpStream, addr: SocketAddr) {
        let client_id = Uuid::new_v4();
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY for {}: {}", addr, e);
        }
        let (read_half, write_half) = stream.into_split();

        let limits = &self.server.config().connection;
        let chunk_size = limits.read_chunk_size;
        let stall_timeout = Duration::from_secs(limits.write_timeout_secs);
        let (outbox, outbox_rx) = mpsc::channel(limits.sendq_lines);
        tokio::spawn(connection::write_loop(
            client_id,
            write_half,
            outbox_rx,
            stall_timeout,
        ));

        if self.server.accept(client_id, addr, outbox).is_err() {
            return;
        }

        let reader = tokio::spawn(connection::read_loop(
            client_id,
            read_half,
            self.events_tx.clone(),
            chunk_size,
        ));
        self.server.attach_reader(&client_id, reader.abort_handle());
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Received(client_id, data) => self.server.receive(client_id, &data),
            Event::Closed(client_id) => self.server.disconnect(client_id),
        }
    }
}
