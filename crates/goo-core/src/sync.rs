//! Sync packets: the full resolved table, shipped from an authoritative host
//! to observers that replace their local table wholesale.
//!
//! Encoded with `bitcode` behind a versioned header. Entries travel in
//! ascending key order and values keep their exact bits.

use crate::entry::GooEntry;
use crate::mapping::Mappings;
use serde::{Deserialize, Serialize};

/// Magic number identifying a goo value sync packet.
pub const PACKET_MAGIC: u32 = 0x600D_0001;

/// Current packet format version. Increment when breaking the wire format.
pub const PACKET_VERSION: u32 = 1;

/// Errors that can occur while decoding a packet.
#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", PACKET_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported packet version: expected {}, got {}", PACKET_VERSION, .0)]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
}

impl PacketHeader {
    pub fn current() -> Self {
        Self {
            magic: PACKET_MAGIC,
            version: PACKET_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), PacketError> {
        if self.magic != PACKET_MAGIC {
            return Err(PacketError::InvalidMagic(self.magic));
        }
        if self.version != PACKET_VERSION {
            return Err(PacketError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// A snapshot of every entry, ascending by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPacket {
    pub header: PacketHeader,
    pub entries: Vec<(String, GooEntry)>,
}

impl SyncPacket {
    pub fn from_mappings(mappings: &Mappings) -> Self {
        Self {
            header: PacketHeader::current(),
            entries: mappings
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    /// The packet's table. Duplicate keys keep the last occurrence.
    pub fn into_mappings(self) -> Mappings {
        self.entries.into_iter().collect()
    }

    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        bitcode::serialize(self).map_err(|e| PacketError::Encode(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        let packet: SyncPacket =
            bitcode::deserialize(data).map_err(|e| PacketError::Decode(e.to_string()))?;
        packet.header.validate()?;
        Ok(packet)
    }
}
