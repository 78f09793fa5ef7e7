//! Tones, pulse sequences and the kinds carrying a TAP unit.
//!
//! | tag  | payload after the tag                                          |
//! |------|----------------------------------------------------------------|
//! | 0x10 | pause u16, u16-prefixed TAP unit                               |
//! | 0x11 | 6 × u16 timings, used bits u8, pause u16, u24 length, TAP body |
//! | 0x12 | pulse length u16, pulse count u16                              |
//! | 0x13 | count u8, count × u16                                          |
//! | 0x14 | zero u16, one u16, used bits u8, pause u16, u24 length, body   |

use std::fmt;

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::field::FieldRead;
use crate::tap::{decode_next, decode_sized, DecodeMode, TapeDataBlock};

use super::{BlockDecode, BlockKind};

/// A TAP unit at ROM loader timings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StandardSpeedData {
    /// Milliseconds of silence after the block.
    pub pause:     u16,
    pub tape_data: TapeDataBlock,
}

/// A TAP unit at custom timings. Pulse lengths are in Z80 T-states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurboSpeedData {
    pub pilot_pulse:  u16,
    pub sync1:        u16,
    pub sync2:        u16,
    pub zero_pulse:   u16,
    pub one_pulse:    u16,
    pub pilot_pulses: u16,
    /// Bits used in the last data byte, counted from the MSB.
    pub used_bits:    u8,
    pub pause:        u16,
    pub tape_data:    TapeDataBlock,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PureTone {
    pub pulse_length: u16,
    pub pulses:       u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SequenceOfPulses {
    pub pulses: Vec<u16>,
}

/// A TAP unit with neither pilot tone nor sync pulses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PureData {
    pub zero_pulse: u16,
    pub one_pulse:  u16,
    pub used_bits:  u8,
    pub pause:      u16,
    pub tape_data:  TapeDataBlock,
}

impl BlockDecode for StandardSpeedData {
    const KIND: BlockKind = BlockKind::StandardSpeedData;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let pause = cur.read_u16_le()?;
        let (tape_data, _) = decode_next(cur, DecodeMode::SingleShot)?;
        Ok(StandardSpeedData { pause, tape_data })
    }
}

impl BlockDecode for TurboSpeedData {
    const KIND: BlockKind = BlockKind::TurboSpeedData;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let pilot_pulse  = cur.read_u16_le()?;
        let sync1        = cur.read_u16_le()?;
        let sync2        = cur.read_u16_le()?;
        let zero_pulse   = cur.read_u16_le()?;
        let one_pulse    = cur.read_u16_le()?;
        let pilot_pulses = cur.read_u16_le()?;
        let used_bits    = cur.read_u8()?;
        let pause        = cur.read_u16_le()?;
        let length       = cur.read_u24_as_u32()?;
        let tape_data    = decode_sized(cur, length)?;
        Ok(TurboSpeedData {
            pilot_pulse, sync1, sync2, zero_pulse, one_pulse, pilot_pulses,
            used_bits, pause, tape_data,
        })
    }
}

impl BlockDecode for PureTone {
    const KIND: BlockKind = BlockKind::PureTone;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        Ok(PureTone {
            pulse_length: cur.read_u16_le()?,
            pulses:       cur.read_u16_le()?,
        })
    }
}

impl BlockDecode for SequenceOfPulses {
    const KIND: BlockKind = BlockKind::SequenceOfPulses;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let count = cur.read_u8()?;
        let pulses = (0..count)
            .map(|_| cur.read_u16_le())
            .collect::<Result<Vec<_>>>()?;
        Ok(SequenceOfPulses { pulses })
    }
}

impl BlockDecode for PureData {
    const KIND: BlockKind = BlockKind::PureData;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let zero_pulse = cur.read_u16_le()?;
        let one_pulse  = cur.read_u16_le()?;
        let used_bits  = cur.read_u8()?;
        let pause      = cur.read_u16_le()?;
        let length     = cur.read_u24_as_u32()?;
        let tape_data  = decode_sized(cur, length)?;
        Ok(PureData { zero_pulse, one_pulse, used_bits, pause, tape_data })
    }
}

impl fmt::Display for StandardSpeedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, pause {} ms", self.tape_data, self.pause)
    }
}

impl fmt::Display for TurboSpeedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, pilot {}×{}, pause {} ms",
            self.tape_data, self.pilot_pulses, self.pilot_pulse, self.pause)
    }
}

impl fmt::Display for PureTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pulses of {} T-states", self.pulses, self.pulse_length)
    }
}

impl fmt::Display for SequenceOfPulses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pulses", self.pulses.len())
    }
}

impl fmt::Display for PureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, pause {} ms", self.tape_data, self.pause)
    }
}
