//! Frame configuration fields and structural validation.
//!
//! Validation is pure and stateless: it derives a [`Validation`] snapshot
//! from a [`FrameConfig`] on every call and never persists the result.

use std::fmt;
use std::str::FromStr;

use crate::WireError;

/// Preamble length in bytes.
pub const PREAMBLE_LEN: usize = 7;
/// Preamble fill byte.
pub const PREAMBLE_BYTE: u8 = 0x55;
/// Start frame delimiter.
pub const SFD: u8 = 0xD5;
/// Hardware address length in bytes.
pub const ADDR_LEN: usize = 6;
/// Type/length field width in bytes.
pub const TYPE_LEN: usize = 2;
/// Frame check sequence width in bytes.
pub const FCS_LEN: usize = 4;
/// Minimum payload length before padding applies.
pub const MIN_PAYLOAD: u16 = 46;
/// Maximum payload length.
pub const MAX_PAYLOAD: u16 = 1500;
/// Fixed per-frame overhead: preamble, delimiter, both addresses, type
/// field, and check sequence.
pub const FIXED_OVERHEAD: usize = PREAMBLE_LEN + 1 + 2 * ADDR_LEN + TYPE_LEN + FCS_LEN;
/// Smallest encodable frame.
pub const MIN_FRAME: usize = FIXED_OVERHEAD + MIN_PAYLOAD as usize;
/// Largest encodable frame.
pub const MAX_FRAME: usize = FIXED_OVERHEAD + MAX_PAYLOAD as usize;

/// Type-field values below this threshold are length fields rather than
/// protocol identifiers.
pub const TYPE_THRESHOLD: u16 = 0x0600;

/// Protocol identifiers accepted regardless of the threshold rule.
pub const RECOGNIZED_TYPES: [u16; 4] = [0x0800, 0x0806, 0x8100, 0x86DD];

/// 48-bit hardware address, network byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; ADDR_LEN]);

impl MacAddr {
    /// The all-ones broadcast address.
    pub const BROADCAST: MacAddr = MacAddr([0xFF; ADDR_LEN]);

    /// Construct from octets, most significant first.
    pub const fn new(octets: [u8; ADDR_LEN]) -> Self {
        Self(octets)
    }

    /// Octets in transmission order.
    pub fn octets(&self) -> [u8; ADDR_LEN] {
        self.0
    }

    /// True for the invalid all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDR_LEN]
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl From<[u8; ADDR_LEN]> for MacAddr {
    fn from(octets: [u8; ADDR_LEN]) -> Self {
        Self(octets)
    }
}

impl FromStr for MacAddr {
    type Err = WireError;

    /// Parse colon-separated hex octets, e.g. `ff:ff:ff:ff:ff:ff`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; ADDR_LEN];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| WireError::AddrParse(s.to_string()))?;
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| WireError::AddrParse(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(WireError::AddrParse(s.to_string()));
        }
        Ok(Self(octets))
    }
}

/// Immutable per-frame configuration snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Destination hardware address
    pub dest: MacAddr,
    /// Source hardware address
    pub src: MacAddr,
    /// Type/length field
    pub ether_type: u16,
    /// Declared payload length
    pub payload_len: u16,
}

impl FrameConfig {
    /// Create a configuration snapshot.
    pub fn new(dest: MacAddr, src: MacAddr, ether_type: u16, payload_len: u16) -> Self {
        Self {
            dest,
            src,
            ether_type,
            payload_len,
        }
    }

    /// Total encoded frame size: fixed overhead plus the padded payload.
    pub fn frame_size(&self) -> usize {
        FIXED_OVERHEAD + self.payload_len.max(MIN_PAYLOAD) as usize
    }

    /// Return the first failing predicate, if any, so callers can refuse
    /// to start a frame and surface the reason.
    pub fn check(&self) -> Result<(), WireError> {
        if self.dest.is_zero() || self.src.is_zero() {
            return Err(WireError::ZeroAddress);
        }
        if !(MIN_PAYLOAD..=MAX_PAYLOAD).contains(&self.payload_len) {
            return Err(WireError::PayloadLength(self.payload_len));
        }
        if !type_recognized(self.ether_type) {
            return Err(WireError::EtherType(self.ether_type));
        }
        Ok(())
    }
}

fn type_recognized(ether_type: u16) -> bool {
    ether_type >= TYPE_THRESHOLD || RECOGNIZED_TYPES.contains(&ether_type)
}

/// Structural validity of a configuration snapshot, recomputed on demand
/// and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    /// Neither address is all-zero
    pub addresses_ok: bool,
    /// Declared payload length within 46..=1500
    pub length_ok: bool,
    /// Type field above the threshold or in the recognized set
    pub type_ok: bool,
    /// Total frame size for this configuration
    pub frame_size: usize,
    /// Fixed per-frame overhead
    pub header_size: usize,
    /// Smallest legal frame
    pub min_frame_size: usize,
    /// Largest legal frame
    pub max_frame_size: usize,
}

impl Validation {
    /// True when every predicate holds.
    pub fn is_valid(&self) -> bool {
        self.addresses_ok && self.length_ok && self.type_ok
    }
}

/// Validate a configuration snapshot. Pure; safe to call any number of
/// times with no side effects.
pub fn validate(config: &FrameConfig) -> Validation {
    Validation {
        addresses_ok: !config.dest.is_zero() && !config.src.is_zero(),
        length_ok: (MIN_PAYLOAD..=MAX_PAYLOAD).contains(&config.payload_len),
        type_ok: type_recognized(config.ether_type),
        frame_size: config.frame_size(),
        header_size: FIXED_OVERHEAD,
        min_frame_size: MIN_FRAME,
        max_frame_size: MAX_FRAME,
    }
}
