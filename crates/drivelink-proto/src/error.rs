/// Errors that can occur while encoding or decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The buffer is shorter than the two-byte packet header.
    #[error("malformed packet ({len} bytes, need at least 2)")]
    MalformedPacket { len: usize },

    /// A payload is too short for its message kind.
    #[error("malformed {kind} payload ({len} bytes, need {need})")]
    MalformedPayload {
        kind: &'static str,
        len: usize,
        need: usize,
    },

    /// The payload exceeds what the one-byte size field can describe.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A light-pattern field is outside its allowed range.
    #[error("field {field} must be a non-negative integer no more than {limit}, was {value}")]
    Validation {
        field: &'static str,
        limit: u8,
        value: u8,
    },

    /// More simultaneous light patterns than the vehicle accepts.
    #[error("at most {max} light patterns per command, got {count}")]
    TooManyPatterns { count: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ProtoError>;
