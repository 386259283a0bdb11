//! Basic usage example for the frame encoder.

use bytes::Bytes;
use framer_buffer::PayloadBuffer;
use framer_wire::{
    crc32_bitwise, validate, EncoderInput, FrameBuilder, FrameConfig, FrameEncoder, MacAddr,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Frame Encoder Example ===\n");

    // 1. Validate a configuration snapshot
    println!("1. Validating configuration...");
    let config = FrameConfig::new(
        MacAddr::BROADCAST,
        MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
        0x0800,
        46,
    );
    let validation = validate(&config);
    println!("   addresses_ok: {}", validation.addresses_ok);
    println!("   length_ok:    {}", validation.length_ok);
    println!("   type_ok:      {}", validation.type_ok);
    println!("   frame size:   {} bytes", validation.frame_size);

    // 2. One-call frame assembly
    println!("\n2. Building a frame...");
    let payload: Vec<u8> = (0..46u8).map(|i| 0xA5 ^ i).collect();
    let frame = FrameBuilder::new(config)
        .payload(Bytes::from(payload.clone()))
        .build()?;
    println!("   Encoded frame size: {} bytes", frame.len());
    println!(
        "   FCS: {:08x}",
        u32::from_be_bytes([frame[68], frame[69], frame[70], frame[71]])
    );
    println!(
        "   Matches reference recurrence: {}",
        u32::from_be_bytes([frame[68], frame[69], frame[70], frame[71]])
            == crc32_bitwise(&frame[8..68])
    );

    // 3. Tick-level control with a stalling consumer
    println!("\n3. Driving the encoder with a stalling consumer...");
    let mut buffer = PayloadBuffer::new();
    buffer.begin_packet(46)?;
    for &b in &payload {
        assert!(buffer.offer(b));
    }

    let mut encoder = FrameEncoder::new();
    let mut input = EncoderInput {
        start: Some(config),
        ready: true,
    };
    let mut delivered = 0usize;
    let mut ticks = 0usize;
    loop {
        // Consumer ready only on every third tick.
        input.ready = ticks % 3 == 0;
        let output = encoder.step(&mut buffer, input);
        input.start = None;
        if input.ready && output.data.is_some() {
            delivered += 1;
        }
        ticks += 1;
        if output.done {
            break;
        }
    }
    println!("   Delivered {} bytes over {} ticks", delivered, ticks);

    Ok(())
}
