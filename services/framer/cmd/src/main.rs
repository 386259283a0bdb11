//! Ethernet frame generator binary.
//!
//! Builds one layer-2 frame from command-line parameters, driving the
//! library the same way an embedding system would: validate the
//! configuration first, refuse to start on any failing predicate, then
//! run the encoder step loop and print the resulting byte stream.

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::Parser;
use framer_buffer::PayloadBuffer;
use framer_wire::{validate, EncoderInput, FrameBuilder, FrameConfig, FrameEncoder, MacAddr};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod logging;

use config::{parse_u16, FramerConfig};
use logging::FramerLogFormatter;

/// Streaming Ethernet layer-2 frame generator
#[derive(Parser, Debug)]
#[command(name = "framer", version, about = "Streaming Ethernet layer-2 frame generator")]
struct Args {
    /// Destination hardware address, e.g. ff:ff:ff:ff:ff:ff
    #[arg(long)]
    dest: Option<MacAddr>,

    /// Source hardware address, e.g. 02:00:00:00:00:01
    #[arg(long)]
    src: Option<MacAddr>,

    /// Type/length field, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_type)]
    ether_type: Option<u16>,

    /// Payload as a hex string (sets the declared length)
    #[arg(long)]
    payload: Option<String>,

    /// Declared payload length when generating a fill pattern
    #[arg(long, conflicts_with = "payload")]
    length: Option<u16>,

    /// Fill byte for a generated payload, decimal or 0x-prefixed hex
    #[arg(long, default_value = "0x00", value_parser = parse_fill, conflicts_with = "payload")]
    fill: u8,

    /// Deassert consumer readiness every N ticks to exercise backpressure
    #[arg(long)]
    stall_every: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Optional YAML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_type(text: &str) -> Result<u16, String> {
    parse_u16(text).ok_or_else(|| format!("malformed type field {:?}", text))
}

fn parse_fill(text: &str) -> Result<u8, String> {
    parse_u16(text)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| format!("malformed fill byte {:?}", text))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .event_format(FramerLogFormatter::new())
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let file_config = match &args.config {
        Some(path) => FramerConfig::load_from_file(path)?,
        None => FramerConfig::load_from_env(),
    };

    let dest = match args.dest {
        Some(addr) => addr,
        None => file_config
            .dest
            .parse()
            .with_context(|| format!("configured dest address {:?}", file_config.dest))?,
    };
    let src = match args.src {
        Some(addr) => addr,
        None => file_config
            .src
            .parse()
            .with_context(|| format!("configured src address {:?}", file_config.src))?,
    };
    let ether_type = args.ether_type.unwrap_or(file_config.ether_type);

    let payload: Vec<u8> = match &args.payload {
        Some(hex) => decode_hex(hex)?,
        None => {
            let length = args.length.unwrap_or(file_config.payload_len);
            vec![args.fill; length as usize]
        }
    };

    if payload.len() > u16::MAX as usize {
        bail!("payload of {} bytes is far beyond the frame limit", payload.len());
    }
    let config = FrameConfig::new(dest, src, ether_type, payload.len() as u16);

    let validation = validate(&config);
    if !validation.is_valid() {
        if !validation.addresses_ok {
            tracing::error!("invalid configuration: an address field is all-zero");
        }
        if !validation.length_ok {
            tracing::error!(
                "invalid configuration: payload length {} outside 46..=1500",
                config.payload_len
            );
        }
        if !validation.type_ok {
            tracing::error!(
                "invalid configuration: type field {:#06x} below 0x0600 and not recognized",
                config.ether_type
            );
        }
        bail!("refusing to start frame");
    }

    info!(
        "encoding frame: dest {} src {} type {:#06x} payload {} bytes ({} on the wire)",
        config.dest,
        config.src,
        config.ether_type,
        config.payload_len,
        validation.frame_size
    );

    let frame = match args.stall_every {
        // N must leave at least one ready tick per period.
        Some(n) if n >= 2 => {
            encode_with_stalls(&config, &payload, file_config.buffer_capacity, n)?
        }
        Some(n) => {
            bail!("--stall-every must be at least 2, got {}", n);
        }
        None => FrameBuilder::new(config)
            .payload(Bytes::from(payload))
            .build()?,
    };

    print_frame(&frame);
    info!(
        "frame complete: {} bytes, fcs {:02x}{:02x}{:02x}{:02x}",
        frame.len(),
        frame[frame.len() - 4],
        frame[frame.len() - 3],
        frame[frame.len() - 2],
        frame[frame.len() - 1]
    );

    Ok(())
}

/// Drive the encoder tick by tick with a consumer that goes unready on
/// every Nth tick, demonstrating that backpressure stretches time but
/// never changes the byte stream.
fn encode_with_stalls(
    config: &FrameConfig,
    payload: &[u8],
    buffer_capacity: usize,
    stall_every: u32,
) -> Result<Bytes> {
    let mut buffer = PayloadBuffer::with_capacity(buffer_capacity);
    buffer.begin_packet(config.payload_len)?;
    for &byte in payload {
        if !buffer.offer(byte) {
            bail!("payload buffer rejected byte (capacity {})", buffer.capacity());
        }
    }

    let mut encoder = FrameEncoder::new();
    let mut input = EncoderInput {
        start: Some(*config),
        ready: true,
    };
    let mut out = Vec::with_capacity(config.frame_size());
    let mut tick = 0u64;
    let mut stalled = 0u64;

    loop {
        input.ready = tick % stall_every as u64 != 0;
        if !input.ready {
            stalled += 1;
        }
        let output = encoder.step(&mut buffer, input);
        input.start = None;
        if input.ready {
            if let Some(byte) = output.data {
                out.push(byte);
            }
        }
        if output.done {
            break;
        }
        tick += 1;
        if tick > 1_000_000 {
            bail!("encoder made no progress");
        }
    }

    debug!("delivered {} bytes over {} ticks ({} stalled)", out.len(), tick, stalled);
    Ok(Bytes::from(out))
}

/// Decode a hex string, ignoring whitespace and an optional 0x prefix.
fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.len() % 2 != 0 {
        bail!("hex payload has an odd number of digits");
    }
    let mut bytes = Vec::with_capacity(cleaned.len() / 2);
    for i in (0..cleaned.len()).step_by(2) {
        let pair = &cleaned[i..i + 2];
        let byte = u8::from_str_radix(pair, 16)
            .with_context(|| format!("malformed hex byte {:?}", pair))?;
        bytes.push(byte);
    }
    Ok(bytes)
}

/// Hex dump, sixteen bytes per row with offsets.
fn print_frame(frame: &[u8]) {
    for (row, chunk) in frame.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        println!("{:04x}  {}", row * 16, hex.join(" "));
    }
}
