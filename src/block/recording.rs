//! Sampled recordings. Samples are kept as read; nothing here plays them back.

use std::fmt;

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::field::FieldRead;
use crate::tap::serialize_len;

use super::{BlockDecode, BlockKind, LengthBound};

/// Fixed fields of a CSW block counted by its block length.
const CSW_FIXED_LENGTH: u32 = 10;

/// One bit per sample, MSB first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectRecording {
    pub tstates_per_sample: u16,
    pub pause:              u16,
    pub used_bits:          u8,
    #[serde(serialize_with = "serialize_len")]
    pub samples:            Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CswCompression {
    Rle,
    ZRle,
    Other(u8),
}

impl From<u8> for CswCompression {
    fn from(byte: u8) -> Self {
        match byte {
            1 => CswCompression::Rle,
            2 => CswCompression::ZRle,
            other => CswCompression::Other(other),
        }
    }
}

impl fmt::Display for CswCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CswCompression::Rle       => f.write_str("RLE"),
            CswCompression::ZRle      => f.write_str("Z-RLE"),
            CswCompression::Other(id) => write!(f, "compression {:#04x}", id),
        }
    }
}

/// A CSW v2 data stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CswRecording {
    pub pause:       u16,
    /// Samples per second, 24-bit on tape.
    pub sample_rate: u32,
    pub compression: CswCompression,
    /// Pulses after decompression.
    pub pulse_count: u32,
    #[serde(serialize_with = "serialize_len")]
    pub data:        Vec<u8>,
}

impl BlockDecode for DirectRecording {
    const KIND: BlockKind = BlockKind::DirectRecording;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let tstates_per_sample = cur.read_u16_le()?;
        let pause     = cur.read_u16_le()?;
        let used_bits = cur.read_u8()?;
        let length    = cur.read_u24_as_u32()?;
        let samples   = cur.read_vec(length as usize)?;
        Ok(DirectRecording { tstates_per_sample, pause, used_bits, samples })
    }
}

impl BlockDecode for CswRecording {
    const KIND: BlockKind = BlockKind::CswRecording;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let declared = cur.read_u32_le()?;
        let bound = LengthBound::new(&*cur, Self::KIND, declared);
        bound.require(CSW_FIXED_LENGTH.into())?;
        let pause       = cur.read_u16_le()?;
        let sample_rate = cur.read_u24_as_u32()?;
        let compression = cur.read_u8()?.into();
        let pulse_count = cur.read_u32_le()?;
        let data        = cur.read_vec((declared - CSW_FIXED_LENGTH) as usize)?;
        bound.finish(cur)?;
        Ok(CswRecording { pause, sample_rate, compression, pulse_count, data })
    }
}

impl fmt::Display for DirectRecording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} byte(s) at {} T-states/sample, pause {} ms",
            self.samples.len(), self.tstates_per_sample, self.pause)
    }
}

impl fmt::Display for CswRecording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pulses, {} Hz, {}, pause {} ms",
            self.pulse_count, self.sample_rate, self.compression, self.pause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SliceCursor;
    use crate::error::TapeError;

    #[test]
    fn direct_recording() {
        let payload = [0x4F, 0x00, 0x64, 0x00, 0x05, 0x03, 0x00, 0x00, 0xAA, 0x55, 0xF0, 0x99];
        let mut cur = SliceCursor::new(&payload);
        let block = DirectRecording::decode_payload(&mut cur).unwrap();
        assert_eq!(block.tstates_per_sample, 79);
        assert_eq!(block.pause, 100);
        assert_eq!(block.used_bits, 5);
        assert_eq!(block.samples, vec![0xAA, 0x55, 0xF0]);
        assert_eq!(cur.remaining(), &[0x99]);
    }

    #[test]
    fn csw_recording() {
        let payload = [
            0x0C, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x44, 0xAC, 0x00, 0x02, 0x10, 0x00, 0x00, 0x00,
            0x01, 0x02,
        ];
        let mut cur = SliceCursor::new(&payload);
        let block = CswRecording::decode_payload(&mut cur).unwrap();
        assert_eq!(block.sample_rate, 44100);
        assert_eq!(block.compression, CswCompression::ZRle);
        assert_eq!(block.pulse_count, 16);
        assert_eq!(block.data, vec![0x01, 0x02]);
        assert!(cur.at_end().unwrap());
        assert_eq!(block.to_string(), "16 pulses, 44100 Hz, Z-RLE, pause 0 ms");
    }

    #[test]
    fn csw_length_below_fixed_fields() {
        let payload = [0x09, 0x00, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        match CswRecording::decode_payload(&mut SliceCursor::new(&payload)) {
            Err(TapeError::BlockLengthMismatch { kind: BlockKind::CswRecording, declared: 9, needed: 10 }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
