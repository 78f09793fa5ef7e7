//! Generalized data (0x19): pilot and data described by symbol alphabets.
//!
//! After the block length, pause and the two section descriptors
//! (`TOTP`/`NPP`/`ASP`, `TOTD`/`NPD`/`ASD`) come:
//!
//! * when `TOTP > 0`: `ASP` symbol definitions of `NPP` pulse slots each,
//!   then `TOTP` run-length entries (symbol u8, repetitions u16),
//! * when `TOTD > 0`: `ASD` symbol definitions of `NPD` pulse slots each,
//!   then `TOTD` symbol indices packed `ceil(log2(ASD))` bits apiece, MSB
//!   first, padded to a whole byte.
//!
//! An alphabet size byte of 0 stands for 256 symbols.

use std::fmt;

use log::trace;
use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::field::FieldRead;
use crate::tap::serialize_len;

use super::{BlockDecode, BlockKind, LengthBound};

/// Pause, both totals, both pulse maxima and both alphabet sizes.
const DESCRIPTOR_LENGTH: u64 = 2 + 4 + 1 + 1 + 4 + 1 + 1;
const RUN_LENGTH_ENTRY: u64 = 3;

/// What the signal level does at the start of a symbol's first pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolPolarity {
    Toggle,
    Keep,
    ForceLow,
    ForceHigh,
}

impl From<u8> for SymbolPolarity {
    fn from(flags: u8) -> Self {
        match flags & 0b11 {
            0 => SymbolPolarity::Toggle,
            1 => SymbolPolarity::Keep,
            2 => SymbolPolarity::ForceLow,
            _ => SymbolPolarity::ForceHigh,
        }
    }
}

/// One alphabet entry. `pulses` stops before the first zero-length slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub polarity: SymbolPolarity,
    pub pulses:   Vec<u16>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PilotRunLength {
    pub symbol:      u8,
    pub repetitions: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PilotSection {
    /// Pulse slots per symbol definition.
    pub max_pulses: u8,
    pub symbols:    Vec<Symbol>,
    pub runs:       Vec<PilotRunLength>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DataSection {
    pub max_pulses: u8,
    pub symbols:    Vec<Symbol>,
    pub stream:     SymbolStream,
}

/// Bit-packed symbol indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SymbolStream {
    pub bits_per_symbol: u8,
    /// Number of indices packed into `bytes`.
    pub count:           u32,
    #[serde(serialize_with = "serialize_len")]
    pub bytes:           Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneralizedData {
    pub pause: u16,
    pub pilot: Option<PilotSection>,
    pub data:  Option<DataSection>,
}

/// Alphabet size from its on-tape byte.
fn alphabet_size(byte: u8) -> u16 {
    match byte {
        0 => 256,
        n => n.into(),
    }
}

/// `ceil(log2(size))`, 0 for a single-symbol alphabet.
pub fn bits_per_symbol(size: u16) -> u8 {
    debug_assert!((1..=256).contains(&size));
    (16 - (size - 1).leading_zeros()) as u8
}

fn stream_length(count: u32, bits: u8) -> u64 {
    (u64::from(count) * u64::from(bits) + 7) / 8
}

fn read_symbols<C: ByteCursor + ?Sized>(cur: &mut C, size: u16, max_pulses: u8) -> Result<Vec<Symbol>> {
    (0..size).map(|_| -> Result<Symbol> {
        let polarity = cur.read_u8()?.into();
        let mut pulses = Vec::with_capacity(max_pulses.into());
        let mut ended = false;
        for _ in 0..max_pulses {
            let pulse = cur.read_u16_le()?;
            ended |= pulse == 0;
            if !ended {
                pulses.push(pulse);
            }
        }
        Ok(Symbol { polarity, pulses })
    })
    .collect()
}

impl SymbolStream {
    pub fn iter(&self) -> SymbolIter<'_> {
        SymbolIter { stream: self, index: 0 }
    }
}

impl<'a> IntoIterator for &'a SymbolStream {
    type Item = u8;
    type IntoIter = SymbolIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Yields the packed symbol indices in tape order.
#[derive(Clone, Debug)]
pub struct SymbolIter<'a> {
    stream: &'a SymbolStream,
    index:  u32,
}

impl Iterator for SymbolIter<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.index >= self.stream.count {
            return None;
        }
        let bits = usize::from(self.stream.bits_per_symbol);
        let start = self.index as usize * bits;
        self.index += 1;
        let symbol = (start..start + bits).fold(0u8, |acc, bit| {
            let byte = self.stream.bytes.get(bit / 8).copied().unwrap_or(0);
            acc << 1 | (byte >> (7 - bit % 8)) & 1
        });
        Some(symbol)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.stream.count - self.index) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for SymbolIter<'_> {}

impl BlockDecode for GeneralizedData {
    const KIND: BlockKind = BlockKind::GeneralizedData;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let declared = cur.read_u32_le()?;
        let bound = LengthBound::new(&*cur, Self::KIND, declared);
        bound.require(DESCRIPTOR_LENGTH)?;
        let pause = cur.read_u16_le()?;
        let totp  = cur.read_u32_le()?;
        let npp   = cur.read_u8()?;
        let asp   = alphabet_size(cur.read_u8()?);
        let totd  = cur.read_u32_le()?;
        let npd   = cur.read_u8()?;
        let asd   = alphabet_size(cur.read_u8()?);
        let bits  = bits_per_symbol(asd);

        let table = |size: u16, pulses: u8| u64::from(size) * (1 + 2 * u64::from(pulses));
        let pilot_length = match totp {
            0 => 0,
            n => table(asp, npp) + u64::from(n) * RUN_LENGTH_ENTRY,
        };
        let data_length = match totd {
            0 => 0,
            n => table(asd, npd) + stream_length(n, bits),
        };
        trace!("generalized data: pilot {} symbol(s) in {} byte(s), data {} symbol(s) in {} byte(s)",
            totp, pilot_length, totd, data_length);
        bound.require(DESCRIPTOR_LENGTH + pilot_length + data_length)?;

        let pilot = if totp > 0 {
            let symbols = read_symbols(cur, asp, npp)?;
            let runs = (0..totp)
                .map(|_| -> Result<PilotRunLength> { Ok(PilotRunLength {
                    symbol:      cur.read_u8()?,
                    repetitions: cur.read_u16_le()?,
                }) })
                .collect::<Result<Vec<_>>>()?;
            Some(PilotSection { max_pulses: npp, symbols, runs })
        } else {
            None
        };

        let data = if totd > 0 {
            let symbols = read_symbols(cur, asd, npd)?;
            let bytes = cur.read_vec(stream_length(totd, bits) as usize)?;
            let stream = SymbolStream { bits_per_symbol: bits, count: totd, bytes };
            Some(DataSection { max_pulses: npd, symbols, stream })
        } else {
            None
        };

        bound.finish(cur)?;
        Ok(GeneralizedData { pause, pilot, data })
    }
}

impl fmt::Display for GeneralizedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pilot: u64 = self.pilot.as_ref()
            .map(|p| p.runs.iter().map(|r| u64::from(r.repetitions)).sum())
            .unwrap_or(0);
        let data = self.data.as_ref().map(|d| d.stream.count).unwrap_or(0);
        write!(f, "pilot {} symbol(s), data {} symbol(s), pause {} ms", pilot, data, self.pause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SliceCursor;
    use crate::error::TapeError;

    fn block(body: &[u8]) -> Vec<u8> {
        let mut bytes = (body.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn symbol_widths() {
        assert_eq!(bits_per_symbol(1), 0);
        assert_eq!(bits_per_symbol(2), 1);
        assert_eq!(bits_per_symbol(3), 2);
        assert_eq!(bits_per_symbol(4), 2);
        assert_eq!(bits_per_symbol(5), 3);
        assert_eq!(bits_per_symbol(256), 8);
        assert_eq!(alphabet_size(0), 256);
    }

    #[test]
    fn empty_sections_are_absent() {
        let bytes = block(&[0xE8, 0x03, 0, 0, 0, 0, 2, 2, 0, 0, 0, 0, 2, 2]);
        let mut cur = SliceCursor::new(&bytes);
        let block = GeneralizedData::decode_payload(&mut cur).unwrap();
        assert_eq!(block, GeneralizedData { pause: 1000, pilot: None, data: None });
        assert!(cur.at_end().unwrap());
    }

    #[test]
    fn pilot_and_data_sections() {
        let body = [
            0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x02, 0x01,
            0x0A, 0x00, 0x00, 0x00, 0x02, 0x02,
            // pilot alphabet: one symbol, pulses 2168 then an unused slot
            0x00, 0x78, 0x08, 0x00, 0x00,
            // pilot run
            0x00, 0x7F, 0x1F,
            // data alphabet
            0x00, 0x57, 0x03, 0x57, 0x03,
            0x03, 0xAE, 0x06, 0xAE, 0x06,
            // 10 one-bit symbols
            0b1011_0000, 0b0100_0000,
        ];
        let bytes = block(&body);
        let mut cur = SliceCursor::new(&bytes);
        let block = GeneralizedData::decode_payload(&mut cur).unwrap();
        assert!(cur.at_end().unwrap());

        let pilot = block.pilot.as_ref().expect("pilot");
        assert_eq!(pilot.symbols, vec![Symbol { polarity: SymbolPolarity::Toggle, pulses: vec![2168] }]);
        assert_eq!(pilot.runs, vec![PilotRunLength { symbol: 0, repetitions: 8063 }]);

        let data = block.data.as_ref().expect("data");
        assert_eq!(data.symbols[1].polarity, SymbolPolarity::ForceHigh);
        assert_eq!(data.symbols[1].pulses, vec![1710, 1710]);
        assert_eq!(data.stream.bits_per_symbol, 1);
        let symbols: Vec<u8> = data.stream.iter().collect();
        assert_eq!(symbols, [1, 0, 1, 1, 0, 0, 0, 0, 0, 1]);
        assert_eq!(block.to_string(), "pilot 8063 symbol(s), data 10 symbol(s), pause 0 ms");
    }

    #[test]
    fn multi_bit_stream() {
        let stream = SymbolStream { bits_per_symbol: 3, count: 4, bytes: vec![0b1010_0011, 0b1011_0000] };
        assert_eq!(stream.iter().len(), 4);
        assert_eq!(stream.iter().collect::<Vec<_>>(), [5, 0, 7, 3]);
        let single = SymbolStream { bits_per_symbol: 0, count: 3, bytes: vec![] };
        assert_eq!(single.iter().collect::<Vec<_>>(), [0, 0, 0]);
    }

    #[test]
    fn trailing_bytes_inside_length_are_skipped() {
        let bytes = block(&[0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 1, 1, 0xEE, 0xEE]);
        let mut cur = SliceCursor::new(&bytes);
        GeneralizedData::decode_payload(&mut cur).unwrap();
        assert!(cur.at_end().unwrap());
    }

    #[test]
    fn sections_past_declared_length() {
        let mut bytes = block(&[0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 2]);
        bytes.extend_from_slice(&[0; 16]);
        match GeneralizedData::decode_payload(&mut SliceCursor::new(&bytes)) {
            Err(TapeError::BlockLengthMismatch { declared: 14, needed: 21, .. }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
