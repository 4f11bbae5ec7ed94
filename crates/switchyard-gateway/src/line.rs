//! # Line-Protocol TCP Adapter
//!
//! Every accepted connection becomes one registered peer:
//!
//! ```text
//! server → client   ::+::identity; SWITCHYARD-…-7
//! client → server   ::connect;SWITCHYARD-…-7->chat
//! server → client   chat;
//! client → server   chat;hello
//! server → client   chat; hello
//! ```
//!
//! A line longer than the configured limit, EOF or an I/O error ends the
//! connection and unregisters the peer, which broadcasts `::gone`.

use crate::domain::error::GatewayError;
use crate::protocol;
use futures::{SinkExt, StreamExt};
use shared_bus::FabricHandle;
use shared_types::{paths, Identity, Peer, Source};
use std::net::SocketAddr;
use std::sync::Arc;
use switchyard_telemetry::metric_inc;
use switchyard_telemetry::metrics::GATEWAY_REQUESTS;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

/// The fabric side of one connection. Updates are queued to the
/// connection's writer task, so delivery never blocks the worker.
pub struct LinePeer {
    outbound: mpsc::UnboundedSender<String>,
}

impl LinePeer {
    #[must_use]
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> Self {
        Self { outbound }
    }
}

impl Peer for LinePeer {
    fn update(&self, _source: &Source, path: &str, message: &str) {
        // Writer gone means the connection is closing; unregister follows
        let _ = self.outbound.send(protocol::format_line(path, message));
    }
}

/// Accept connections until `shutdown` changes.
pub async fn serve(
    listener: TcpListener,
    fabric: FabricHandle,
    max_line_length: usize,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), GatewayError> {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    tokio::spawn(handle_connection(stream, addr, fabric.clone(), max_line_length));
                }
                Err(e) => warn!(error = %e, "Failed to accept line connection"),
            },
        }
    }
    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    fabric: FabricHandle,
    max_line_length: usize,
) {
    metric_inc!(GATEWAY_REQUESTS, &["line"]);
    let (reader, writer) = stream.into_split();
    let (outbound, queued) = mpsc::unbounded_channel();

    let identity = match fabric.register(Arc::new(LinePeer::new(outbound.clone()))).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(peer = %addr, error = %e, "Fabric unavailable, dropping connection");
            return;
        }
    };
    info!(peer = %addr, identity = %identity, "Line connection registered");

    let _ = outbound.send(protocol::format_line(paths::IDENTITY, identity.as_str()));
    drop(outbound);
    tokio::spawn(write_lines(writer, queued, identity.clone()));

    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(max_line_length));
    while let Some(next) = lines.next().await {
        match next {
            Ok(line) => {
                let Some((path, message)) = protocol::parse_line(&line) else {
                    continue;
                };
                if fabric
                    .update(Source::Peer(identity.clone()), path, message)
                    .is_err()
                {
                    break;
                }
            }
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!(identity = %identity, limit = max_line_length, "Line too long, closing");
                break;
            }
            Err(LinesCodecError::Io(e)) => {
                debug!(identity = %identity, error = %e, "Line connection read failed");
                break;
            }
        }
    }

    info!(identity = %identity, "Line connection closed");
    let _ = fabric.unregister(identity);
}

/// Drain queued lines to the socket. Ends once the peer is unregistered
/// and dropped by the fabric, or the socket fails.
async fn write_lines(
    writer: OwnedWriteHalf,
    mut queued: mpsc::UnboundedReceiver<String>,
    identity: Identity,
) {
    let mut sink = FramedWrite::new(writer, LinesCodec::new());
    while let Some(line) = queued.recv().await {
        if let Err(e) = sink.send(line).await {
            debug!(identity = %identity, error = %e, "Line connection write failed");
            break;
        }
    }
}
