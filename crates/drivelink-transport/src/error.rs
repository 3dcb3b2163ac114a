/// Errors that can occur in vehicle transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The operation did not complete within the transport's deadline.
    #[error("transport operation timed out")]
    Timeout,

    /// The underlying bus rejected or aborted the operation.
    #[error("bus error: {0}")]
    Bus(String),

    /// The transport failed for an unspecified reason.
    #[error("transport failure: {0}")]
    Failure(String),

    /// The peer does not expose the expected endpoint.
    ///
    /// Raised from `connect` when the protocol's read or write
    /// characteristic cannot be located on the device.
    #[error("missing {0} endpoint")]
    MissingEndpoint(&'static str),
}

pub type Result<T> = std::result::Result<T, TransportError>;
