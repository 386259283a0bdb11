//! Payload buffer error types.

use thiserror::Error;

/// Buffer API misuse errors.
///
/// Overflow and underflow are deliberately absent: they are sticky
/// diagnostic flags on [`crate::PayloadBuffer`], not errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Packet descriptor table is full
    #[error("packet table full")]
    PacketTableFull,

    /// The current packet is still collecting bytes
    #[error("packet still open")]
    PacketOpen,

    /// Declared packet length is not representable
    #[error("declared length {0} not representable")]
    DeclaredLength(u16),
}
