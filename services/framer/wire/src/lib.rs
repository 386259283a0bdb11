//! Ethernet layer-2 frame encoding for the frame generator.
//!
//! This crate assembles standards-compliant layer-2 frames from a
//! configuration snapshot plus buffered payload bytes, computing the
//! frame check sequence incrementally over exactly the protected range
//! and honoring consumer backpressure byte by byte.
//!
//! ## Features
//!
//! - **Step-Driven Encoder**: an explicit per-tick state machine with a
//!   ready/valid handshake; no byte is ever skipped or duplicated under
//!   arbitrary consumer stall patterns
//! - **FCS Engine**: table-driven CRC-32 accumulator cross-checked
//!   against the per-bit shift/XOR recurrence
//! - **Field Validation**: pure structural checks over addresses, length,
//!   and type, with derived frame-size figures
//! - **Builder API**: one-call frame assembly for callers that do not
//!   need tick-level control
//!
//! ## Wire Format
//!
//! ```text
//! +----------------------+----------------------------+
//! | preamble             | 7 bytes of 0x55            |
//! +----------------------+----------------------------+
//! | start delimiter      | 1 byte, 0xD5               |
//! +----------------------+----------------------------+
//! | destination address  | 6 bytes, MSB first         |
//! +----------------------+----------------------------+
//! | source address       | 6 bytes, MSB first         |
//! +----------------------+----------------------------+
//! | type / length        | 2 bytes, MSB first         |
//! +----------------------+----------------------------+
//! | payload              | 46..1500 bytes             |
//! +----------------------+----------------------------+
//! | pad                  | 0..44 zero bytes           |
//! +----------------------+----------------------------+
//! | frame check sequence | 4 bytes, MSB first         |
//! +----------------------+----------------------------+
//! ```
//!
//! The check sequence covers the destination address through the end of
//! payload/padding; preamble, delimiter, and the sequence itself are
//! outside the protected range.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crc;
pub mod encoder;
pub mod error;
pub mod fields;

// Re-export main types
pub use crc::{crc32_bitwise, Crc32, CRC_SEED, POLY_REFLECTED};
pub use encoder::{EncoderInput, EncoderOutput, FrameBuilder, FrameEncoder, Phase};
pub use error::WireError;
pub use fields::{
    validate, FrameConfig, MacAddr, Validation, FCS_LEN, FIXED_OVERHEAD, MAX_FRAME, MAX_PAYLOAD,
    MIN_FRAME, MIN_PAYLOAD, PREAMBLE_BYTE, PREAMBLE_LEN, SFD, TYPE_THRESHOLD,
};
