use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// A bidirectional byte-stream link to one vehicle.
///
/// Implementations own device addressing and endpoint discovery:
/// [`connect`](Transport::connect) must locate exactly one read and one
/// write endpoint on the peer or fail with
/// [`TransportError::MissingEndpoint`](crate::TransportError::MissingEndpoint).
///
/// Each buffer delivered through [`subscribe`](Transport::subscribe) is one
/// complete notification packet as received from the peer; transports do
/// not reassemble or split packets.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the link and resolve the protocol endpoints.
    async fn connect(&mut self) -> Result<()>;

    /// Tear down the link.
    ///
    /// Returns the remaining-connected state: `false` means the link is
    /// fully closed, `true` means the peer still considers itself
    /// connected and the caller should retry.
    async fn disconnect(&mut self) -> Result<bool>;

    /// Write one framed packet to the command endpoint.
    ///
    /// May suspend on transport backpressure.
    async fn write_command(&mut self, packet: &[u8]) -> Result<()>;

    /// Subscribe to notification packets from the read endpoint.
    ///
    /// The sender side is owned by the transport; the channel closes when
    /// the link drops.
    async fn subscribe(&mut self) -> Result<mpsc::Receiver<Bytes>>;
}
