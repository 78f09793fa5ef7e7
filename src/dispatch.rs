//! Tag byte to decoder.
//!
//! The tag table is closed: [`dispatch`] resolves a tag to a [`BlockKind`]
//! and [`BlockKind::decoder`] hands out the matching decode function.
//! Neither consumes input.

use std::convert::TryFrom;

use crate::block::*;
use crate::cursor::ByteCursor;
use crate::error::{Result, TapeError};

/// Decodes one block, tag byte included.
pub type DecodeFn<C> = fn(&mut C) -> Result<Block>;

/// Resolves the tag found at `offset`.
pub fn dispatch(tag: u8, offset: u64) -> Result<BlockKind> {
    if let Some(kind) = WithdrawnKind::from_tag(tag) {
        return Err(TapeError::DeprecatedBlockKind { kind, offset });
    }
    BlockKind::try_from(tag).map_err(|tag| TapeError::UnsupportedBlockKind { tag, offset })
}

impl BlockKind {
    pub fn decoder<C: ByteCursor>(self) -> DecodeFn<C> {
        match self {
            BlockKind::StandardSpeedData  => decode_tagged::<StandardSpeedData, C>,
            BlockKind::TurboSpeedData     => decode_tagged::<TurboSpeedData, C>,
            BlockKind::PureTone           => decode_tagged::<PureTone, C>,
            BlockKind::SequenceOfPulses   => decode_tagged::<SequenceOfPulses, C>,
            BlockKind::PureData           => decode_tagged::<PureData, C>,
            BlockKind::DirectRecording    => decode_tagged::<DirectRecording, C>,
            BlockKind::CswRecording       => decode_tagged::<CswRecording, C>,
            BlockKind::GeneralizedData    => decode_tagged::<GeneralizedData, C>,
            BlockKind::PauseTapeCommand   => decode_tagged::<PauseTapeCommand, C>,
            BlockKind::GroupStart         => decode_tagged::<GroupStart, C>,
            BlockKind::GroupEnd           => decode_tagged::<GroupEnd, C>,
            BlockKind::JumpTo             => decode_tagged::<JumpTo, C>,
            BlockKind::LoopStart          => decode_tagged::<LoopStart, C>,
            BlockKind::LoopEnd            => decode_tagged::<LoopEnd, C>,
            BlockKind::CallSequence       => decode_tagged::<CallSequence, C>,
            BlockKind::ReturnFromSequence => decode_tagged::<ReturnFromSequence, C>,
            BlockKind::Select             => decode_tagged::<Select, C>,
            BlockKind::StopTapeWhen48k    => decode_tagged::<StopTapeWhen48k, C>,
            BlockKind::SetSignalLevel     => decode_tagged::<SetSignalLevel, C>,
            BlockKind::TextDescription    => decode_tagged::<TextDescription, C>,
            BlockKind::Message            => decode_tagged::<Message, C>,
            BlockKind::ArchiveInfo        => decode_tagged::<ArchiveInfo, C>,
            BlockKind::HardwareType       => decode_tagged::<HardwareType, C>,
            BlockKind::CustomInfo         => decode_tagged::<CustomInfo, C>,
            BlockKind::GlueBlock          => decode_tagged::<GlueBlock, C>,
        }
    }
}
