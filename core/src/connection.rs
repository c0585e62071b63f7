//! Per-socket reader and writer tasks
//!
//! Each accepted socket is split in two. The reader forwards raw chunks to
//! the event loop; the writer drains the session's outbox. Neither touches
//! protocol state.

use crate::session::ClientId;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::tcp::{OwnedReadHalf, OwnedWriteHalf},
    sync::mpsc,
    time,
};

/// Something that happened on a connection, for the event loop
#[derive(Debug)]
pub enum Event {
    /// Bytes arrived
    Received(ClientId, Bytes),
    /// The peer closed the connection or reading failed
    Closed(ClientId),
}

/// Read until EOF or error, forwarding chunks of at most `chunk_size` bytes
pub async fn read_loop(
    client_id: ClientId,
    mut reader: OwnedReadHalf,
    events: mpsc::Sender<Event>,
    chunk_size: usize,
) {
    let mut buf = vec![0u8; chunk_size];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::debug!("Client {} closed the connection", client_id);
                break;
            }
            Ok(n) => {
                let chunk = Bytes::copy_from_slice(&buf[..n]);
                if events.send(Event::Received(client_id, chunk)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::debug!("Error reading from client {}: {}", client_id, e);
                break;
            }
        }
    }
    let _ = events.send(Event::Closed(client_id)).await;
}

/// Write queued lines in order until the outbox is closed, then shut the socket.
///
/// `write_all` resumes after short writes, so a line is never cut off. A write
/// that makes no progress for `stall_timeout` ends the task, which releases the
/// socket even when the peer never reads again.
pub async fn write_loop(
    client_id: ClientId,
    mut writer: OwnedWriteHalf,
    mut outbox: mpsc::Receiver<Arc<str>>,
    stall_timeout: Duration,
) {
    while let Some(line) = outbox.recv().await {
        match time::timeout(stall_timeout, writer.write_all(line.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!("Error writing to client {}: {}", client_id, e);
                return;
            }
            Err(_) => {
                tracing::warn!(
                    "Client {} has not read for {:?}, dropping its socket",
                    client_id,
                    stall_timeout
                );
                return;
            }
        }
    }
    let _ = time::timeout(stall_timeout, writer.shutdown()).await;
}
