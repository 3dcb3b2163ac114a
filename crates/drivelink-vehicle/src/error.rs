use drivelink_proto::ProtoError;
use drivelink_transport::TransportError;

/// Errors that can occur in vehicle session operations.
#[derive(Debug, thiserror::Error)]
pub enum VehicleError {
    /// The connection attempt did not complete within the transport's
    /// deadline.
    #[error("connecting to the vehicle timed out")]
    ConnectTimeout(#[source] TransportError),

    /// A bus fault occurred while connecting.
    #[error("bus fault while connecting to the vehicle")]
    ConnectTransportError(#[source] TransportError),

    /// Connecting failed for another reason (including a peer without
    /// the expected endpoint pair).
    #[error("connecting to the vehicle failed")]
    ConnectFailed(#[source] TransportError),

    /// The disconnect attempt did not complete within the transport's
    /// deadline. The session stays connected; callers should retry.
    #[error("disconnecting from the vehicle timed out")]
    DisconnectTimedOut(#[source] TransportError),

    /// The vehicle is still connected after a disconnect attempt. The
    /// session stays connected; callers should retry.
    #[error("disconnecting from the vehicle failed")]
    DisconnectFailed {
        #[source]
        source: Option<TransportError>,
    },

    /// A command was issued to a session that is not connected.
    #[error("command issued to a vehicle that is not connected")]
    NotConnected,

    /// A watcher removal was keyed on a handle that was never
    /// registered (or was already removed).
    #[error("watcher handle was never registered")]
    NotRegistered,

    /// Encoding a command failed.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// The transport rejected a command write.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, VehicleError>;
