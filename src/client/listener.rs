//! Per-interface receive loop
//!
//! One listener task per enabled interface. The task owns the receive
//! side of the transport and feeds decoded announcements into the shared
//! registry. Malformed datagrams and transient receive failures are
//! reported and skipped; the loop only ends on shutdown.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{broadcast, watch};

use crate::error::Error;
use crate::registry::SessionRegistry;
use crate::sap::constants::{MAX_DATAGRAM_SIZE, PAYLOAD_TYPE_SDP};
use crate::sap::packet::{MessageType, SapPacket};
use crate::sdp::{ParseOptions, SessionDescription};

use super::interface::NetworkInterface;
use super::transport::Transport;

/// Pause after a receive failure so a persistent socket error does not
/// spin the loop.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Receive loop state for one interface
pub(super) struct InterfaceListener<T: Transport> {
    pub(super) interface: NetworkInterface,
    pub(super) transport: Arc<T>,
    pub(super) registry: Arc<SessionRegistry>,
    pub(super) errors_tx: broadcast::Sender<Error>,
    pub(super) shutdown_rx: watch::Receiver<bool>,
}

impl<T: Transport> InterfaceListener<T> {
    /// Run until shutdown is signalled
    pub(super) async fn run(mut self) {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        tracing::debug!(iface = %self.interface, "Listener started");

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                received = self.transport.recv_from(&mut buf) => {
                    match received {
                        Ok((len, source)) => {
                            let datagram = Bytes::copy_from_slice(&buf[..len]);
                            self.handle_datagram(&datagram, source);
                        }
                        Err(e) => {
                            // Expected when the socket is torn down during disable
                            if *self.shutdown_rx.borrow() {
                                break;
                            }
                            tracing::error!(iface = %self.interface, error = %e, "Receive failed");
                            let _ = self.errors_tx.send(Error::Io(Arc::new(e)));
                            tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }

        tracing::debug!(iface = %self.interface, "Listener stopped");
    }

    fn handle_datagram(&self, datagram: &Bytes, source: std::net::SocketAddr) {
        let packet = match SapPacket::decode(datagram) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(
                    iface = %self.interface,
                    source = %source,
                    len = datagram.len(),
                    error = %e,
                    "Discarding malformed packet"
                );
                let _ = self.errors_tx.send(e.into());
                return;
            }
        };

        if packet.payload_type != PAYLOAD_TYPE_SDP {
            tracing::debug!(
                iface = %self.interface,
                payload_type = %packet.payload_type,
                "Ignoring non-SDP payload"
            );
            return;
        }

        match packet.message_type {
            MessageType::Announcement => self.handle_announcement(&packet),
            MessageType::Deletion => self.handle_deletion(&packet),
        }
    }

    fn handle_announcement(&self, packet: &SapPacket) {
        let text = match packet.payload_str() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(iface = %self.interface, error = %e, "Non-UTF-8 payload");
                let _ = self.errors_tx.send(e.into());
                return;
            }
        };

        match SessionDescription::parse_with(text, ParseOptions::strict()) {
            Ok(description) => {
                self.registry.on_announce(&self.interface, description);
            }
            Err(e) => {
                tracing::warn!(iface = %self.interface, error = %e, "Discarding invalid session description");
                let _ = self.errors_tx.send(e.into());
            }
        }
    }

    fn handle_deletion(&self, packet: &SapPacket) {
        match packet.deletion_origin() {
            Ok(origin) => {
                self.registry.on_delete(&self.interface, &origin);
            }
            Err(e) => {
                tracing::warn!(iface = %self.interface, error = %e, "Discarding invalid deletion");
                let _ = self.errors_tx.send(e.into());
            }
        }
    }
}
