//! Wire protocol error types.

use thiserror::Error;

/// Frame configuration and encoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// An address field is all-zero
    #[error("zero hardware address")]
    ZeroAddress,

    /// Declared payload length outside 46..=1500
    #[error("payload length {0} out of range")]
    PayloadLength(u16),

    /// Type field below 0x0600 and not a recognized protocol
    #[error("unrecognized type field 0x{0:04x}")]
    EtherType(u16),

    /// Supplied payload does not match the declared length
    #[error("payload mismatch: declared {declared}, supplied {supplied}")]
    PayloadMismatch {
        /// Length from the configuration snapshot
        declared: u16,
        /// Bytes actually supplied
        supplied: usize,
    },

    /// Malformed hardware address text
    #[error("malformed hardware address {0:?}")]
    AddrParse(String),

    /// Payload buffer misuse
    #[error("buffer error: {0}")]
    Buffer(#[from] framer_buffer::BufferError),

    /// The encoder stopped delivering bytes mid-frame
    #[error("encoder made no progress")]
    Stalled,
}
