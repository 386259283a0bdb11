//! Bounded, backpressure-aware payload buffering for the frame generator.
//!
//! This crate decouples payload production from frame encoding while
//! preserving packet boundaries within the shared byte stream.
//!
//! ## Features
//!
//! - **Packet Boundary Tracking**: per-packet descriptors record where each
//!   packet's bytes begin and end inside the ring
//! - **Backpressure**: the write side reports readiness and rejects bytes
//!   once the buffer is full or the declared packet length is reached
//! - **Sticky Diagnostics**: overflow and underflow are polled flags that
//!   clear once the triggering condition resolves, never errors
//! - **Cross-Domain Variant**: a producer/consumer pair on independent
//!   threads exchanging bytes through position counters with
//!   acquire/release ordering
//!
//! Occupancy is always derived from the monotonic head/tail counters; it is
//! never maintained as separately mutated state.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fifo;
pub mod sync_fifo;

pub use error::BufferError;
pub use fifo::{PayloadBuffer, DEFAULT_CAPACITY, MAX_PACKETS};
pub use sync_fifo::{sync_fifo, SyncConsumer, SyncProducer};
