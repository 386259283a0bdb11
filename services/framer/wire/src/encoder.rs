//! Frame encoder state machine.
//!
//! Produces the exact ordered byte sequence of one layer-2 frame, one
//! byte per delivered handshake with the downstream consumer. The
//! encoder is driven by an explicit [`FrameEncoder::step`] call per
//! scheduling tick; a byte counts as delivered only when the encoder
//! offers it and the consumer asserts readiness on the same tick, and
//! internal state advances only on delivered ticks. A consumer that
//! never asserts readiness stalls the encoder indefinitely — that is the
//! flow-control contract, not a fault.

use bytes::{BufMut, Bytes, BytesMut};
use framer_buffer::PayloadBuffer;
use tracing::{debug, trace};

use crate::crc::Crc32;
use crate::fields::{
    FrameConfig, ADDR_LEN, FCS_LEN, MIN_PAYLOAD, PREAMBLE_BYTE, PREAMBLE_LEN, SFD, TYPE_LEN,
};
use crate::WireError;

/// Encoder phases, strictly ordered. Pad is entered only when the
/// declared payload length is below the 46-byte floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Waiting for a start trigger and a complete payload
    #[default]
    Idle,
    /// Seven bytes of 0x55
    Preamble,
    /// One 0xD5 byte
    Sfd,
    /// Destination address, MSB first
    DestAddr,
    /// Source address, MSB first
    SrcAddr,
    /// Type/length field, MSB first
    TypeField,
    /// Buffered payload bytes
    Payload,
    /// Zero fill up to the minimum payload floor
    Pad,
    /// Frame check sequence, MSB first
    Checksum,
    /// Final byte delivered; completion pulse on the next tick
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Preamble => "preamble",
            Phase::Sfd => "sfd",
            Phase::DestAddr => "dest-addr",
            Phase::SrcAddr => "src-addr",
            Phase::TypeField => "type-field",
            Phase::Payload => "payload",
            Phase::Pad => "pad",
            Phase::Checksum => "checksum",
            Phase::Complete => "complete",
        };
        write!(f, "{}", name)
    }
}

/// Inputs sampled by the encoder on one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderInput {
    /// Start-frame trigger carrying the configuration snapshot for the
    /// frame; consumed only while idle.
    pub start: Option<FrameConfig>,
    /// Consumer readiness; gates all emission.
    pub ready: bool,
}

/// Outputs produced by the encoder on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderOutput {
    /// Offered byte; `None` when no output is valid this tick.
    pub data: Option<u8>,
    /// True only while the first preamble byte is offered.
    pub start_of_packet: bool,
    /// True only while the final checksum byte is offered.
    pub end_of_packet: bool,
    /// True for exactly one tick after the final byte is delivered.
    pub done: bool,
}

/// The orchestrating state machine: sequences fixed fields, pulls
/// buffered payload, emits padding, and trails the check sequence.
///
/// The encoder assumes a pre-validated configuration; gate on
/// [`crate::fields::validate`] (or [`FrameConfig::check`]) before
/// asserting start, otherwise the frame content is undefined.
#[derive(Debug, Default)]
pub struct FrameEncoder {
    phase: Phase,
    /// Byte position within the current phase.
    index: usize,
    config: Option<FrameConfig>,
    crc: Crc32,
    fcs: [u8; FCS_LEN],
}

impl FrameEncoder {
    /// Create an idle encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while no frame is in flight.
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Abort unconditionally back to idle, discarding any frame in
    /// flight.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.index = 0;
        self.config = None;
        self.crc.reset();
    }

    /// Advance the machine by one tick.
    ///
    /// The offered byte is a pure function of the current state, so a
    /// stalled consumer observes the same byte and phase on every tick
    /// until it asserts readiness; only a delivered tick mutates state.
    ///
    /// The completion-pulse tick does not sample `start`: a trigger for
    /// the next frame must be asserted no earlier than the tick after
    /// `done` is observed.
    pub fn step(&mut self, buffer: &mut PayloadBuffer, input: EncoderInput) -> EncoderOutput {
        if self.phase == Phase::Complete {
            self.phase = Phase::Idle;
            self.index = 0;
            self.config = None;
            return EncoderOutput {
                done: true,
                ..EncoderOutput::default()
            };
        }

        if self.phase == Phase::Idle {
            if let Some(config) = input.start {
                // A zero-length payload has nothing to collect, so the
                // buffer cannot gate it.
                if config.payload_len == 0 || buffer.next_packet_ready() {
                    debug!(
                        "frame start: dest {} src {} type {:#06x} len {}",
                        config.dest, config.src, config.ether_type, config.payload_len
                    );
                    self.config = Some(config);
                    self.crc.reset();
                    self.index = 0;
                    self.phase = Phase::Preamble;
                } else {
                    trace!("start ignored: payload collection incomplete");
                }
            }
            if self.phase == Phase::Idle {
                return EncoderOutput::default();
            }
        }

        let data = self.offered(buffer);
        let output = EncoderOutput {
            data,
            start_of_packet: self.phase == Phase::Preamble && self.index == 0 && data.is_some(),
            end_of_packet: self.phase == Phase::Checksum && self.index == FCS_LEN - 1,
            done: false,
        };

        if let Some(byte) = data {
            if input.ready {
                self.deliver(byte, buffer);
            }
        }

        output
    }

    /// The byte currently on offer, without advancing state.
    fn offered(&self, buffer: &mut PayloadBuffer) -> Option<u8> {
        let config = self.config?;
        match self.phase {
            Phase::Idle | Phase::Complete => None,
            Phase::Preamble => Some(PREAMBLE_BYTE),
            Phase::Sfd => Some(SFD),
            Phase::DestAddr => Some(config.dest.octets()[self.index]),
            Phase::SrcAddr => Some(config.src.octets()[self.index]),
            Phase::TypeField => Some(config.ether_type.to_be_bytes()[self.index]),
            Phase::Payload => buffer.peek(),
            Phase::Pad => Some(0x00),
            Phase::Checksum => Some(self.fcs[self.index]),
        }
    }

    /// Commit one delivered byte: feed the protected range into the
    /// accumulator and advance phase/position.
    fn deliver(&mut self, byte: u8, buffer: &mut PayloadBuffer) {
        if self.in_protected_range() {
            self.crc.consume(byte);
        }

        let Some(config) = self.config else {
            return;
        };

        match self.phase {
            Phase::Preamble => self.advance(PREAMBLE_LEN, Phase::Sfd),
            Phase::Sfd => self.advance(1, Phase::DestAddr),
            Phase::DestAddr => self.advance(ADDR_LEN, Phase::SrcAddr),
            Phase::SrcAddr => self.advance(ADDR_LEN, Phase::TypeField),
            Phase::TypeField => {
                self.index += 1;
                if self.index == TYPE_LEN {
                    self.index = 0;
                    if config.payload_len == 0 {
                        self.enter(Phase::Pad);
                    } else {
                        self.enter(Phase::Payload);
                    }
                }
            }
            Phase::Payload => {
                let taken = buffer.take();
                debug_assert_eq!(taken, Some(byte));
                self.index += 1;
                if self.index == config.payload_len as usize {
                    self.index = 0;
                    if config.payload_len < MIN_PAYLOAD {
                        self.enter(Phase::Pad);
                    } else {
                        self.latch_fcs();
                        self.enter(Phase::Checksum);
                    }
                }
            }
            Phase::Pad => {
                self.index += 1;
                if self.index == (MIN_PAYLOAD - config.payload_len) as usize {
                    self.index = 0;
                    self.latch_fcs();
                    self.enter(Phase::Checksum);
                }
            }
            Phase::Checksum => self.advance(FCS_LEN, Phase::Complete),
            Phase::Idle | Phase::Complete => {}
        }
    }

    fn advance(&mut self, phase_len: usize, next: Phase) {
        self.index += 1;
        if self.index == phase_len {
            self.index = 0;
            self.enter(next);
        }
    }

    fn enter(&mut self, next: Phase) {
        trace!("phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// The accumulator runs exactly over DestAddr..Pad; never over the
    /// preamble, delimiter, or the check sequence itself.
    fn in_protected_range(&self) -> bool {
        matches!(
            self.phase,
            Phase::DestAddr | Phase::SrcAddr | Phase::TypeField | Phase::Payload | Phase::Pad
        )
    }

    /// Freeze the check sequence at the end of the protected range.
    fn latch_fcs(&mut self) {
        self.fcs = self.crc.value().to_be_bytes();
    }
}

/// Convenience driver that validates a configuration, buffers the
/// payload, and runs the encoder against an always-ready consumer.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    config: FrameConfig,
    payload: Bytes,
}

impl FrameBuilder {
    /// Create a builder for the given configuration snapshot.
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            payload: Bytes::new(),
        }
    }

    /// Set the payload; its length must match the declared length.
    pub fn payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    /// Assemble the complete frame.
    ///
    /// Refuses to start on the first failing validation predicate, so an
    /// unvalidated configuration never reaches the encoder.
    pub fn build(self) -> Result<Bytes, WireError> {
        self.config.check()?;
        if self.payload.len() != self.config.payload_len as usize {
            return Err(WireError::PayloadMismatch {
                declared: self.config.payload_len,
                supplied: self.payload.len(),
            });
        }

        let mut buffer = PayloadBuffer::new();
        buffer.begin_packet(self.config.payload_len)?;
        for &byte in self.payload.iter() {
            let accepted = buffer.offer(byte);
            debug_assert!(accepted);
        }

        let frame_size = self.config.frame_size();
        let mut encoder = FrameEncoder::new();
        let mut out = BytesMut::with_capacity(frame_size);
        let mut input = EncoderInput {
            start: Some(self.config),
            ready: true,
        };

        // One delivered byte per tick; a couple of extra ticks cover
        // start acceptance and the completion pulse.
        for _ in 0..frame_size + 2 {
            let output = encoder.step(&mut buffer, input);
            input.start = None;
            if let Some(byte) = output.data {
                out.put_u8(byte);
            }
            if output.done {
                return Ok(out.freeze());
            }
        }

        Err(WireError::Stalled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc32_bitwise;
    use crate::fields::{MacAddr, FIXED_OVERHEAD};

    fn config(payload_len: u16) -> FrameConfig {
        FrameConfig::new(
            MacAddr::BROADCAST,
            MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            0x0800,
            payload_len,
        )
    }

    fn loaded_buffer(payload: &[u8]) -> PayloadBuffer {
        let mut buffer = PayloadBuffer::new();
        buffer.begin_packet(payload.len() as u16).unwrap();
        for &b in payload {
            assert!(buffer.offer(b));
        }
        buffer
    }

    /// Drive the encoder with an always-ready consumer until done.
    fn run_to_completion(
        encoder: &mut FrameEncoder,
        buffer: &mut PayloadBuffer,
        config: FrameConfig,
    ) -> Vec<u8> {
        let mut input = EncoderInput {
            start: Some(config),
            ready: true,
        };
        let mut out = Vec::new();
        for _ in 0..4096 {
            let output = encoder.step(buffer, input);
            input.start = None;
            if let Some(byte) = output.data {
                out.push(byte);
            }
            if output.done {
                return out;
            }
        }
        panic!("encoder never completed");
    }

    #[test]
    fn test_end_to_end_minimum_frame() {
        let payload: Vec<u8> = (0..46u8).map(|i| 0xA5 ^ i).collect();
        let frame = FrameBuilder::new(config(46))
            .payload(Bytes::from(payload.clone()))
            .build()
            .unwrap();

        assert_eq!(frame.len(), 72);
        assert!(frame[..7].iter().all(|&b| b == 0x55));
        assert_eq!(frame[7], 0xD5);
        assert_eq!(&frame[8..14], &[0xFF; 6]);
        assert_eq!(&frame[14..20], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(&frame[20..22], &[0x08, 0x00]);
        assert_eq!(&frame[22..68], payload.as_slice());

        let expected_fcs = crc32_bitwise(&frame[8..68]);
        assert_eq!(&frame[68..72], &expected_fcs.to_be_bytes());
    }

    #[test]
    fn test_header_bytes_verbatim_for_larger_payload() {
        let payload = vec![0x42u8; 300];
        let frame = FrameBuilder::new(config(300))
            .payload(Bytes::from(payload))
            .build()
            .unwrap();

        assert_eq!(frame.len(), FIXED_OVERHEAD + 300);
        assert_eq!(&frame[8..14], &[0xFF; 6]);
        assert_eq!(&frame[14..20], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(&frame[20..22], &[0x08, 0x00]);
        let expected_fcs = crc32_bitwise(&frame[8..frame.len() - 4]);
        assert_eq!(&frame[frame.len() - 4..], &expected_fcs.to_be_bytes());
    }

    #[test]
    fn test_short_payload_padded_to_floor() {
        // Below the validation floor, driven through the raw encoder:
        // padding is an encoder property, not a validator one.
        let payload: Vec<u8> = (1..=10u8).collect();
        let mut buffer = loaded_buffer(&payload);
        let mut encoder = FrameEncoder::new();
        let frame = run_to_completion(&mut encoder, &mut buffer, config(10));

        assert_eq!(frame.len(), 72);
        assert_eq!(&frame[22..32], payload.as_slice());
        assert!(frame[32..68].iter().all(|&b| b == 0x00));
        assert_eq!(frame[32..68].len(), 36);

        let expected_fcs = crc32_bitwise(&frame[8..68]);
        assert_eq!(&frame[68..72], &expected_fcs.to_be_bytes());
    }

    #[test]
    fn test_zero_length_payload_fully_padded() {
        let mut buffer = loaded_buffer(&[]);
        let mut encoder = FrameEncoder::new();
        let frame = run_to_completion(&mut encoder, &mut buffer, config(0));

        assert_eq!(frame.len(), 72);
        assert!(frame[22..68].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_backpressure_stall_preserves_stream() {
        let payload: Vec<u8> = (0..46u8).collect();
        let reference = FrameBuilder::new(config(46))
            .payload(Bytes::from(payload.clone()))
            .build()
            .unwrap();

        let mut buffer = loaded_buffer(&payload);
        let mut encoder = FrameEncoder::new();
        let mut input = EncoderInput {
            start: Some(config(46)),
            ready: false,
        };

        let mut delivered = Vec::new();
        let mut tick = 0u32;
        let mut done = false;
        while !done {
            assert!(tick < 10_000, "encoder never completed");
            // Irregular stall pattern: ready on 2 of every 5 ticks.
            input.ready = matches!(tick % 5, 1 | 3);
            let output = encoder.step(&mut buffer, input);
            input.start = None;
            if !input.ready {
                // A stalled tick must re-offer the identical byte.
                if let Some(byte) = output.data {
                    let repeat = encoder.step(
                        &mut buffer,
                        EncoderInput {
                            start: None,
                            ready: false,
                        },
                    );
                    assert_eq!(repeat.data, Some(byte));
                }
            } else if let Some(byte) = output.data {
                delivered.push(byte);
            }
            done = output.done;
            tick += 1;
        }

        assert_eq!(delivered, reference.to_vec());
    }

    #[test]
    fn test_sop_eop_and_done_pulses() {
        let payload: Vec<u8> = vec![0x11; 46];
        let mut buffer = loaded_buffer(&payload);
        let mut encoder = FrameEncoder::new();
        let mut input = EncoderInput {
            start: Some(config(46)),
            ready: true,
        };

        let mut sop_offsets = Vec::new();
        let mut eop_offsets = Vec::new();
        let mut done_count = 0;
        let mut offset = 0usize;
        for _ in 0..80 {
            let output = encoder.step(&mut buffer, input);
            input.start = None;
            if output.start_of_packet {
                sop_offsets.push(offset);
            }
            if output.end_of_packet {
                eop_offsets.push(offset);
            }
            if output.data.is_some() {
                offset += 1;
            }
            if output.done {
                done_count += 1;
                break;
            }
        }

        assert_eq!(sop_offsets, vec![0]);
        assert_eq!(eop_offsets, vec![71]);
        assert_eq!(done_count, 1);
    }

    #[test]
    fn test_idle_after_complete_without_restart() {
        let payload = vec![0x00u8; 46];
        let mut buffer = loaded_buffer(&payload);
        let mut encoder = FrameEncoder::new();
        run_to_completion(&mut encoder, &mut buffer, config(46));

        assert!(encoder.is_idle());
        for _ in 0..16 {
            let output = encoder.step(
                &mut buffer,
                EncoderInput {
                    start: None,
                    ready: true,
                },
            );
            assert_eq!(output, EncoderOutput::default());
        }
    }

    #[test]
    fn test_start_gated_on_complete_payload() {
        let mut buffer = PayloadBuffer::new();
        buffer.begin_packet(46).unwrap();
        for _ in 0..10 {
            assert!(buffer.offer(0xAB));
        }

        let mut encoder = FrameEncoder::new();
        let output = encoder.step(
            &mut buffer,
            EncoderInput {
                start: Some(config(46)),
                ready: true,
            },
        );
        assert!(encoder.is_idle());
        assert_eq!(output, EncoderOutput::default());

        // Finishing the payload makes the same trigger effective.
        for _ in 0..36 {
            assert!(buffer.offer(0xAB));
        }
        let output = encoder.step(
            &mut buffer,
            EncoderInput {
                start: Some(config(46)),
                ready: true,
            },
        );
        assert_eq!(output.data, Some(0x55));
        assert!(output.start_of_packet);
    }

    #[test]
    fn test_reset_aborts_mid_frame() {
        let payload = vec![0x3Cu8; 46];
        let mut buffer = loaded_buffer(&payload);
        let mut encoder = FrameEncoder::new();
        let mut input = EncoderInput {
            start: Some(config(46)),
            ready: true,
        };
        for _ in 0..12 {
            encoder.step(&mut buffer, input);
            input.start = None;
        }
        assert!(!encoder.is_idle());

        encoder.reset();
        assert!(encoder.is_idle());
        let output = encoder.step(
            &mut buffer,
            EncoderInput {
                start: None,
                ready: true,
            },
        );
        assert_eq!(output, EncoderOutput::default());
    }

    #[test]
    fn test_back_to_back_frames() {
        let first: Vec<u8> = vec![0x01; 46];
        let second: Vec<u8> = vec![0x02; 46];
        let mut buffer = PayloadBuffer::new();
        buffer.begin_packet(46).unwrap();
        for &b in &first {
            assert!(buffer.offer(b));
        }
        buffer.begin_packet(46).unwrap();
        for &b in &second {
            assert!(buffer.offer(b));
        }

        let mut encoder = FrameEncoder::new();
        let frame_a = run_to_completion(&mut encoder, &mut buffer, config(46));
        let frame_b = run_to_completion(&mut encoder, &mut buffer, config(46));

        assert_eq!(&frame_a[22..68], first.as_slice());
        assert_eq!(&frame_b[22..68], second.as_slice());
        // Accumulator is re-seeded per frame, so identical configs with
        // identical payloads would produce identical sequences.
        assert_ne!(frame_a, frame_b);
    }

    #[test]
    fn test_start_not_sampled_on_done_tick() {
        let mut buffer = PayloadBuffer::new();
        for fill in [0x01u8, 0x02] {
            buffer.begin_packet(46).unwrap();
            for _ in 0..46 {
                assert!(buffer.offer(fill));
            }
        }

        let mut encoder = FrameEncoder::new();
        let mut input = EncoderInput {
            start: Some(config(46)),
            ready: true,
        };
        // One delivered byte per tick puts the machine in Complete
        // after the 72nd tick.
        for _ in 0..72 {
            let output = encoder.step(&mut buffer, input);
            input.start = None;
            assert!(!output.done);
        }

        // A trigger coinciding with the completion pulse is discarded.
        let output = encoder.step(
            &mut buffer,
            EncoderInput {
                start: Some(config(46)),
                ready: true,
            },
        );
        assert!(output.done);
        assert_eq!(output.data, None);
        assert!(encoder.is_idle());

        // Re-asserting on the following tick starts the next frame.
        let output = encoder.step(
            &mut buffer,
            EncoderInput {
                start: Some(config(46)),
                ready: true,
            },
        );
        assert_eq!(output.data, Some(0x55));
        assert!(output.start_of_packet);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut bad = config(46);
        bad.src = MacAddr::new([0; 6]);
        assert_eq!(
            FrameBuilder::new(bad)
                .payload(Bytes::from(vec![0u8; 46]))
                .build(),
            Err(WireError::ZeroAddress)
        );

        assert_eq!(
            FrameBuilder::new(config(45))
                .payload(Bytes::from(vec![0u8; 45]))
                .build(),
            Err(WireError::PayloadLength(45))
        );

        let mut bad = config(46);
        bad.ether_type = 0x0042;
        assert_eq!(
            FrameBuilder::new(bad)
                .payload(Bytes::from(vec![0u8; 46]))
                .build(),
            Err(WireError::EtherType(0x0042))
        );
    }

    #[test]
    fn test_builder_rejects_payload_mismatch() {
        assert_eq!(
            FrameBuilder::new(config(46))
                .payload(Bytes::from(vec![0u8; 45]))
                .build(),
            Err(WireError::PayloadMismatch {
                declared: 46,
                supplied: 45,
            })
        );
    }

    #[test]
    fn test_max_payload_frame() {
        let payload = vec![0x7Eu8; 1500];
        let frame = FrameBuilder::new(config(1500))
            .payload(Bytes::from(payload))
            .build()
            .unwrap();
        assert_eq!(frame.len(), 1526);
        let expected_fcs = crc32_bitwise(&frame[8..1522]);
        assert_eq!(&frame[1522..], &expected_fcs.to_be_bytes());
    }
}
