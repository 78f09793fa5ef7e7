//! TZX block model.
//!
//! Every live block kind has its own struct implementing [`BlockDecode`];
//! [`Block`] is the closed enum over all of them. Decoders are grouped by
//! payload shape:
//!
//! * [`data`]: tones, pulses and the three kinds embedding a TAP unit,
//! * [`recording`]: sampled signals kept as opaque bytes,
//! * [`generalized`]: the symbol-alphabet block,
//! * [`control`]: pauses, groups, jumps, loops and calls,
//! * [`info`]: texts, archive info, hardware and custom info, glue.
//!
//! Four kinds were withdrawn from the format; they are known by tag only
//! ([`WithdrawnKind`]) so that the dispatcher can reject them by name.

use std::convert::TryFrom;
use std::fmt;

use log::warn;
use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::{Result, TapeError};
use crate::field::FieldRead;
use crate::tap::TapeDataBlock;

pub mod control;
pub mod data;
pub mod generalized;
pub mod info;
pub mod recording;

pub use control::*;
pub use data::*;
pub use generalized::*;
pub use info::*;
pub use recording::*;

/// A block kind's payload decoder.
pub trait BlockDecode: Sized + Into<Block> {
    const KIND: BlockKind;

    /// Decodes everything following the tag byte.
    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self>;
}

macro_rules! tape_blocks {
    ($($kind:ident = $tag:literal => $name:literal),* $(,)?) => {
        /// The tag byte of a live block kind.
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub enum BlockKind {
            $($kind = $tag),*
        }

        impl BlockKind {
            pub const ALL: &'static [BlockKind] = &[$(BlockKind::$kind),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(BlockKind::$kind => $name),*
                }
            }
        }

        impl TryFrom<u8> for BlockKind {
            type Error = u8;

            fn try_from(tag: u8) -> std::result::Result<Self, u8> {
                match tag {
                    $($tag => Ok(BlockKind::$kind),)*
                    other => Err(other)
                }
            }
        }

        /// One decoded block.
        #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
        pub enum Block {
            $($kind($kind)),*
        }

        impl Block {
            pub fn kind(&self) -> BlockKind {
                match self {
                    $(Block::$kind(_) => BlockKind::$kind),*
                }
            }
        }

        $(
            impl From<$kind> for Block {
                fn from(block: $kind) -> Self {
                    Block::$kind(block)
                }
            }
        )*

        impl fmt::Display for Block {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Block::$kind(block) => fmt::Display::fmt(block, f)),*
                }
            }
        }
    };
}

tape_blocks! {
    StandardSpeedData  = 0x10 => "Standard Speed Data",
    TurboSpeedData     = 0x11 => "Turbo Speed Data",
    PureTone           = 0x12 => "Pure Tone",
    SequenceOfPulses   = 0x13 => "Sequence of Pulses",
    PureData           = 0x14 => "Pure Data",
    DirectRecording    = 0x15 => "Direct Recording",
    CswRecording       = 0x18 => "CSW Recording",
    GeneralizedData    = 0x19 => "Generalized Data",
    PauseTapeCommand   = 0x20 => "Pause / Stop the Tape",
    GroupStart         = 0x21 => "Group Start",
    GroupEnd           = 0x22 => "Group End",
    JumpTo             = 0x23 => "Jump to Block",
    LoopStart          = 0x24 => "Loop Start",
    LoopEnd            = 0x25 => "Loop End",
    CallSequence       = 0x26 => "Call Sequence",
    ReturnFromSequence = 0x27 => "Return from Sequence",
    Select             = 0x28 => "Select Block",
    StopTapeWhen48k    = 0x2A => "Stop the Tape if in 48K Mode",
    SetSignalLevel     = 0x2B => "Set Signal Level",
    TextDescription    = 0x30 => "Text Description",
    Message            = 0x31 => "Message",
    ArchiveInfo        = 0x32 => "Archive Info",
    HardwareType       = 0x33 => "Hardware Type",
    CustomInfo         = 0x35 => "Custom Info",
    GlueBlock          = 0x5A => "Glue Block",
}

impl BlockKind {
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl From<BlockKind> for u8 {
    fn from(kind: BlockKind) -> u8 {
        kind as u8
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Block kinds removed from the format. Writers never emit them.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WithdrawnKind {
    C64RomData    = 0x16,
    C64TurboData  = 0x17,
    EmulationInfo = 0x34,
    Snapshot      = 0x40,
}

impl WithdrawnKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x16 => Some(WithdrawnKind::C64RomData),
            0x17 => Some(WithdrawnKind::C64TurboData),
            0x34 => Some(WithdrawnKind::EmulationInfo),
            0x40 => Some(WithdrawnKind::Snapshot),
            _    => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            WithdrawnKind::C64RomData    => "C64 ROM Type Data",
            WithdrawnKind::C64TurboData  => "C64 Turbo Tape Data",
            WithdrawnKind::EmulationInfo => "Emulation Info",
            WithdrawnKind::Snapshot      => "Snapshot",
        }
    }
}

impl Block {
    pub fn tag(&self) -> u8 {
        self.kind().tag()
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// The TAP unit carried by standard speed, turbo speed and pure data blocks.
    pub fn tape_data(&self) -> Option<&TapeDataBlock> {
        match self {
            Block::StandardSpeedData(block) => Some(&block.tape_data),
            Block::TurboSpeedData(block)    => Some(&block.tape_data),
            Block::PureData(block)          => Some(&block.tape_data),
            _ => None,
        }
    }

    /// Silence after the block in milliseconds, for kinds that have one.
    pub fn pause(&self) -> Option<u16> {
        match self {
            Block::StandardSpeedData(block) => Some(block.pause),
            Block::TurboSpeedData(block)    => Some(block.pause),
            Block::PureData(block)          => Some(block.pause),
            Block::DirectRecording(block)   => Some(block.pause),
            Block::CswRecording(block)      => Some(block.pause),
            Block::GeneralizedData(block)   => Some(block.pause),
            Block::PauseTapeCommand(block)  => Some(block.pause),
            _ => None,
        }
    }

    /// Raw bytes a block carries without interpreting them.
    pub fn opaque_payload(&self) -> Option<&[u8]> {
        match self {
            Block::DirectRecording(block) => Some(&block.samples),
            Block::CswRecording(block)    => Some(&block.data),
            Block::CustomInfo(block)      => Some(&block.data),
            _ => None,
        }
    }
}

/// Consumes the tag byte, checks it belongs to `T`, then decodes `T`.
pub fn decode_tagged<T, C>(cur: &mut C) -> Result<Block>
where
    T: BlockDecode,
    C: ByteCursor + ?Sized,
{
    let offset = cur.position();
    let found = cur.read_u8()?;
    if found != T::KIND.tag() {
        return Err(TapeError::TagMismatch { expected: T::KIND, found, offset });
    }
    T::decode_payload(cur).map(Into::into)
}

/// Holds a block to the byte length it declares.
///
/// Bytes left over inside the declared length are skipped; fields reaching
/// past it fail with [`TapeError::BlockLengthMismatch`].
pub(crate) struct LengthBound {
    kind:     BlockKind,
    declared: u32,
    start:    u64,
}

impl LengthBound {
    pub(crate) fn new<C: ByteCursor + ?Sized>(cur: &C, kind: BlockKind, declared: u32) -> Self {
        LengthBound { kind, declared, start: cur.position() }
    }

    /// Fails early when the fixed part of a block cannot fit.
    pub(crate) fn require(&self, needed: u64) -> Result<()> {
        if needed > u64::from(self.declared) {
            return Err(self.mismatch(needed));
        }
        Ok(())
    }

    pub(crate) fn finish<C: ByteCursor + ?Sized>(self, cur: &mut C) -> Result<()> {
        let consumed = cur.position() - self.start;
        let declared = u64::from(self.declared);
        if consumed > declared {
            return Err(self.mismatch(consumed));
        }
        let rest = declared - consumed;
        if rest > 0 {
            warn!("{}: skipping {} byte(s) at offset {} inside the declared length",
                self.kind, rest, cur.position());
            cur.discard(rest as usize)?;
        }
        Ok(())
    }

    fn mismatch(&self, needed: u64) -> TapeError {
        TapeError::BlockLengthMismatch { kind: self.kind, declared: self.declared, needed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SliceCursor;

    #[test]
    fn tags_round_trip_through_kind() {
        for &kind in BlockKind::ALL {
            assert_eq!(BlockKind::try_from(kind.tag()), Ok(kind));
            assert!(WithdrawnKind::from_tag(kind.tag()).is_none());
        }
        assert_eq!(BlockKind::ALL.len(), 25);
        assert_eq!(BlockKind::try_from(0x16), Err(0x16));
    }

    #[test]
    fn withdrawn_kinds() {
        for tag in [0x16, 0x17, 0x34, 0x40] {
            let kind = WithdrawnKind::from_tag(tag).expect("withdrawn");
            assert_eq!(kind.tag(), tag);
        }
        assert_eq!(WithdrawnKind::Snapshot.name(), "Snapshot");
    }

    #[test]
    fn tagged_decode_checks_the_tag() {
        let data = [0x24, 0x05, 0x00];
        let mut cur = SliceCursor::new(&data);
        match decode_tagged::<PauseTapeCommand, _>(&mut cur) {
            Err(TapeError::TagMismatch { expected: BlockKind::PauseTapeCommand, found: 0x24, offset: 0 }) => {}
            other => panic!("unexpected {other:?}"),
        }
        let mut cur = SliceCursor::new(&data);
        let block = decode_tagged::<LoopStart, _>(&mut cur).unwrap();
        assert_eq!(block, Block::LoopStart(LoopStart { repetitions: 5 }));
        assert_eq!(block.name(), "Loop Start");
        assert_eq!(block.tag(), 0x24);
    }

    #[test]
    fn length_bound_skips_and_rejects() {
        let data = [1u8, 2, 3, 4];
        let mut cur = SliceCursor::new(&data);
        let bound = LengthBound::new(&cur, BlockKind::ArchiveInfo, 3);
        cur.discard(1).unwrap();
        bound.finish(&mut cur).unwrap();
        assert_eq!(cur.position(), 3);

        let mut cur = SliceCursor::new(&data);
        let bound = LengthBound::new(&cur, BlockKind::Select, 1);
        cur.discard(2).unwrap();
        match bound.finish(&mut cur) {
            Err(TapeError::BlockLengthMismatch { kind: BlockKind::Select, declared: 1, needed: 2 }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
