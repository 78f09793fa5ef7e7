use std::io;
use thiserror::Error;

use crate::block::{BlockKind, WithdrawnKind};

pub type Result<T> = std::result::Result<T, TapeError>;

/// Every way decoding a tape image can fail.
///
/// Offsets are absolute byte positions in the decoded stream.
#[derive(Error, Debug)]
pub enum TapeError {
    #[error("Invalid TZX signature at offset {offset}")]
    MalformedHeader { offset: u64 },
    #[error("Unsupported TZX version {major}.{minor:02} (highest understood major version: {supported})")]
    UnsupportedVersion { major: u8, minor: u8, supported: u8 },
    #[error("Unsupported block kind 0x{tag:02X} at offset {offset}")]
    UnsupportedBlockKind { tag: u8, offset: u64 },
    #[error("Withdrawn block kind 0x{:02X} ({}) at offset {offset}", .kind.tag(), .kind.name())]
    DeprecatedBlockKind { kind: WithdrawnKind, offset: u64 },
    #[error("Unexpected flag byte 0x{flag:02X} in tape header at offset {offset}")]
    UnexpectedFlagByte { flag: u8, offset: u64 },
    #[error("Unknown tape header type {subtype} at offset {offset}")]
    UnknownHeaderSubtype { subtype: u8, offset: u64 },
    #[error("Unexpected end of stream at offset {offset}: wanted {wanted} byte(s)")]
    UnexpectedEndOfStream { offset: u64, wanted: usize },
    /// The decoder picked by the dispatcher read a different tag than it owns.
    #[error("Decoder for {expected:?} found tag 0x{found:02X} at offset {offset}")]
    TagMismatch { expected: BlockKind, found: u8, offset: u64 },
    #[error("{kind:?} block declares {declared} byte(s) but its fields need {needed}")]
    BlockLengthMismatch { kind: BlockKind, declared: u32, needed: u64 },
    #[error("Checksum mismatch in block {block}: bytes XOR to 0x{computed:02X}")]
    ChecksumMismatch { block: usize, computed: u8 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TapeError {
    /// True for a clean truncation, as opposed to malformed or unsupported content.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, TapeError::UnexpectedEndOfStream { .. })
    }
}
