//! **TAP** units: the "header or data" records that make up a `.tap` file and
//! that three TZX block kinds embed.
//!
//! # Layout
//!
//! On its own a unit is a 2-byte (LSB first) length followed by that many
//! bytes. A length of 19 normally means a header:
//!
//! | offset | size | description                         |
//! |--------|------|-------------------------------------|
//! |    0   |    1 | flag, `0x00` for headers            |
//! |    1   |    1 | type (0,1,2,3)                      |
//! |    2   |   10 | file name, padded with spaces       |
//! |   12   |    2 | length of the following data block  |
//! |   14   |    2 | parameter 1                         |
//! |   16   |    2 | parameter 2                         |
//! |   18   |    1 | checksum                            |
//!
//! Any other unit is data: a flag byte, `length - 2` payload bytes and a
//! checksum byte. Units shorter than 2 bytes carry neither flag nor checksum
//! and are kept as fragments.
//!
//! A 19-byte data block cannot be told from a header by its length. Tapes
//! never hold two headers in a row, so a standalone scan threads a
//! [`HeaderGate`] from one unit to the next: after a header the gate is
//! closed and the next unit is decoded as data whatever its bytes say.

use std::convert::TryFrom;
use std::fmt;
use std::io::Read;

use log::trace;
use serde::{Serialize, Serializer};

use crate::cursor::{ByteCursor, ReadCursor, SliceCursor};
use crate::error::{Result, TapeError};
use crate::field::{latin1, FieldRead};
use crate::options::DecodeOptions;

pub const HEADER_FLAG: u8 = 0x00;
pub const DATA_FLAG: u8 = 0xFF;
/// Declared length of a header unit: flag, 17 header bytes and checksum.
pub const HEADER_LENGTH: u16 = 19;

/// XOR of all bytes; a well-formed unit including its checksum gives 0.
pub fn checksum<'a, I: IntoIterator<Item = &'a u8>>(bytes: I) -> u8 {
    bytes.into_iter().fold(0, |acc, b| acc ^ b)
}

// ── Types ────────────────────────────────────────────────────────────────────

/// What the data block following a header holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum HeaderKind {
    Program      = 0,
    Numeric      = 1,
    Alphanumeric = 2,
    Byte         = 3,
}

/// A decoded header unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TapeHeader {
    pub kind:        HeaderKind,
    #[serde(serialize_with = "serialize_name")]
    pub name:        [u8; 10],
    /// Length of the data block this header announces.
    pub data_length: u16,
    pub param1:      u16,
    pub param2:      u16,
    pub checksum:    u8,
}

/// A decoded data unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TapeData {
    Standard {
        flag:     u8,
        #[serde(serialize_with = "serialize_len")]
        payload:  Vec<u8>,
        checksum: u8,
    },
    /// A unit declaring 0 or 1 bytes.
    Fragment {
        bytes: Vec<u8>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TapeDataBlock {
    Header(TapeHeader),
    Data(TapeData),
}

/// Whether the next unit of a standalone scan may be a header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderGate {
    header_allowed: bool,
}

/// How [`decode_next`] treats a 19-byte unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeMode {
    /// One unit of a `.tap` file; the gate comes from the previous call.
    Standalone(HeaderGate),
    /// The only unit of an enclosing TZX block; headers always allowed.
    SingleShot,
}

/// A whole `.tap` file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TapFile {
    blocks: Vec<TapeDataBlock>,
}

fn serialize_name<S: Serializer>(name: &[u8; 10], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&latin1(name))
}

pub(crate) fn serialize_len<S: Serializer>(bytes: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(bytes.len() as u64)
}

// ── HeaderKind / TapeHeader ──────────────────────────────────────────────────

impl TryFrom<u8> for HeaderKind {
    type Error = u8;

    fn try_from(subtype: u8) -> std::result::Result<Self, u8> {
        match subtype {
            0 => Ok(HeaderKind::Program),
            1 => Ok(HeaderKind::Numeric),
            2 => Ok(HeaderKind::Alphanumeric),
            3 => Ok(HeaderKind::Byte),
            other => Err(other),
        }
    }
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HeaderKind::Program      => "Program",
            HeaderKind::Numeric      => "Number array",
            HeaderKind::Alphanumeric => "Character array",
            HeaderKind::Byte         => "Bytes",
        })
    }
}

impl TapeHeader {
    /// The file name with trailing padding removed.
    pub fn name_str(&self) -> String {
        let mut name = latin1(&self.name);
        name.truncate(name.trim_end().len());
        name
    }

    /// `LINE` a program starts at; values from 32768 up mean no autostart.
    pub fn autostart_line(&self) -> Option<u16> {
        match self.kind {
            HeaderKind::Program if self.param1 < 0x8000 => Some(self.param1),
            _ => None,
        }
    }

    /// Length of the BASIC program without its variables area.
    pub fn program_length(&self) -> Option<u16> {
        match self.kind {
            HeaderKind::Program => Some(self.param2),
            _ => None,
        }
    }

    pub fn start_address(&self) -> Option<u16> {
        match self.kind {
            HeaderKind::Byte => Some(self.param1),
            _ => None,
        }
    }

    /// Variable name of an array, e.g. `'A'` for `A()` or `A$()`.
    pub fn array_name(&self) -> Option<char> {
        match self.kind {
            HeaderKind::Numeric | HeaderKind::Alphanumeric => {
                let c = (self.param1 >> 8) as u8;
                Some((c & 0b0001_1111 | 0b0100_0000).into())
            }
            _ => None,
        }
    }

    /// XOR over the whole unit, checksum included.
    pub fn checksum_residue(&self) -> u8 {
        let fixed = [
            HEADER_FLAG,
            self.kind as u8,
            self.checksum,
        ];
        checksum(fixed.iter()
            .chain(self.name.iter())
            .chain(self.data_length.to_le_bytes().iter())
            .chain(self.param1.to_le_bytes().iter())
            .chain(self.param2.to_le_bytes().iter()))
    }
}

impl fmt::Display for TapeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: \"{}\"", self.kind, self.name_str())?;
        match self.kind {
            HeaderKind::Program => {
                if let Some(line) = self.autostart_line() {
                    write!(f, " LINE {}", line)?;
                }
                if self.param2 < self.data_length {
                    write!(f, " PROG {} VARS {}", self.param2, self.data_length - self.param2)?;
                }
                Ok(())
            }
            HeaderKind::Numeric => {
                write!(f, " DATA {}()", self.array_name().unwrap_or('?'))
            }
            HeaderKind::Alphanumeric => {
                write!(f, " DATA {}$()", self.array_name().unwrap_or('?'))
            }
            HeaderKind::Byte => {
                write!(f, " CODE {},{}", self.param1, self.data_length)
            }
        }
    }
}

// ── TapeData / TapeDataBlock ─────────────────────────────────────────────────

impl TapeData {
    /// Bytes between the flag and the checksum, or the whole fragment.
    pub fn payload(&self) -> &[u8] {
        match self {
            TapeData::Standard { payload, .. } => payload,
            TapeData::Fragment { bytes }       => bytes,
        }
    }

    pub fn flag(&self) -> Option<u8> {
        match self {
            TapeData::Standard { flag, .. } => Some(*flag),
            TapeData::Fragment { .. }       => None,
        }
    }

    /// XOR over flag, payload and checksum. Fragments carry no checksum.
    pub fn checksum_residue(&self) -> Option<u8> {
        match self {
            TapeData::Standard { flag, payload, checksum: sum } => {
                Some(flag ^ sum ^ checksum(payload))
            }
            TapeData::Fragment { .. } => None,
        }
    }
}

impl TapeDataBlock {
    /// The length the unit declares on tape.
    pub fn declared_length(&self) -> u32 {
        match self {
            TapeDataBlock::Header(_) => HEADER_LENGTH as u32,
            TapeDataBlock::Data(TapeData::Standard { payload, .. }) => payload.len() as u32 + 2,
            TapeDataBlock::Data(TapeData::Fragment { bytes }) => bytes.len() as u32,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, TapeDataBlock::Header(_))
    }

    pub fn header(&self) -> Option<&TapeHeader> {
        match self {
            TapeDataBlock::Header(header) => Some(header),
            TapeDataBlock::Data(_)        => None,
        }
    }

    pub fn data(&self) -> Option<&TapeData> {
        match self {
            TapeDataBlock::Data(data) => Some(data),
            TapeDataBlock::Header(_)  => None,
        }
    }

    pub fn checksum_residue(&self) -> Option<u8> {
        match self {
            TapeDataBlock::Header(header) => Some(header.checksum_residue()),
            TapeDataBlock::Data(data)     => data.checksum_residue(),
        }
    }

    /// Fails with [`TapeError::ChecksumMismatch`] unless the unit XORs to 0.
    pub fn verify_checksum(&self, block: usize) -> Result<()> {
        match self.checksum_residue() {
            Some(computed) if computed != 0 => Err(TapeError::ChecksumMismatch { block, computed }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for TapeDataBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapeDataBlock::Header(header) => fmt::Display::fmt(header, f),
            TapeDataBlock::Data(TapeData::Standard { payload, .. }) => {
                write!(f, "(data {})", payload.len())
            }
            TapeDataBlock::Data(TapeData::Fragment { bytes }) => {
                write!(f, "(fragment {})", bytes.len())
            }
        }
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

impl HeaderGate {
    /// The state before the first unit of a file.
    pub fn open() -> Self {
        HeaderGate { header_allowed: true }
    }

    pub fn is_open(&self) -> bool {
        self.header_allowed
    }

    /// The gate for the unit following `block`.
    pub fn after(block: &TapeDataBlock) -> Self {
        HeaderGate { header_allowed: !block.is_header() }
    }
}

impl Default for HeaderGate {
    fn default() -> Self {
        HeaderGate::open()
    }
}

impl DecodeMode {
    /// Mode for the first unit of a standalone scan.
    pub fn standalone() -> Self {
        DecodeMode::Standalone(HeaderGate::open())
    }

    fn header_allowed(&self) -> bool {
        match self {
            DecodeMode::Standalone(gate) => gate.is_open(),
            DecodeMode::SingleShot       => true,
        }
    }

    fn after(self, block: &TapeDataBlock) -> Self {
        match self {
            DecodeMode::Standalone(_) => DecodeMode::Standalone(HeaderGate::after(block)),
            DecodeMode::SingleShot    => DecodeMode::SingleShot,
        }
    }
}

fn header_kind(flag: u8, subtype: u8, offset: u64) -> Result<HeaderKind> {
    if flag != HEADER_FLAG {
        return Err(TapeError::UnexpectedFlagByte { flag, offset });
    }
    HeaderKind::try_from(subtype)
        .map_err(|subtype| TapeError::UnknownHeaderSubtype { subtype, offset: offset + 1 })
}

/// Reads the 17 header bytes and checksum following flag and type.
fn read_header_body<C: ByteCursor + ?Sized>(cur: &mut C, kind: HeaderKind) -> Result<TapeHeader> {
    Ok(TapeHeader {
        kind,
        name:        cur.read_fixed::<10>()?,
        data_length: cur.read_u16_le()?,
        param1:      cur.read_u16_le()?,
        param2:      cur.read_u16_le()?,
        checksum:    cur.read_u8()?,
    })
}

fn read_data<C: ByteCursor + ?Sized>(cur: &mut C, length: u32) -> Result<TapeData> {
    if length < 2 {
        return Ok(TapeData::Fragment { bytes: cur.read_vec(length as usize)? });
    }
    Ok(TapeData::Standard {
        flag:     cur.read_u8()?,
        payload:  cur.read_vec(length as usize - 2)?,
        checksum: cur.read_u8()?,
    })
}

/// Decodes one length-prefixed unit and returns it with the mode for the
/// next call.
pub fn decode_next<C>(cur: &mut C, mode: DecodeMode) -> Result<(TapeDataBlock, DecodeMode)>
where
    C: ByteCursor + ?Sized,
{
    let offset = cur.position();
    let length = cur.peek_u16()?;
    let block = if length == HEADER_LENGTH && mode.header_allowed() {
        let head = cur.peek(4)?;
        let (flag, subtype) = (head[2], head[3]);
        let kind = header_kind(flag, subtype, offset + 2)?;
        cur.discard(4)?;
        TapeDataBlock::Header(read_header_body(cur, kind)?)
    } else {
        cur.discard(2)?;
        TapeDataBlock::Data(read_data(cur, length.into())?)
    };
    trace!("tap unit at {}: length {}, {}", offset, length, block);
    let next = mode.after(&block);
    Ok((block, next))
}

/// Decodes one unit whose length the enclosing block has already consumed.
///
/// Used by the TZX kinds with 24-bit length fields; headers are always
/// allowed, as in [`DecodeMode::SingleShot`].
pub fn decode_sized<C>(cur: &mut C, length: u32) -> Result<TapeDataBlock>
where
    C: ByteCursor + ?Sized,
{
    let offset = cur.position();
    let block = if length == HEADER_LENGTH as u32 {
        let head = cur.peek(2)?;
        let (flag, subtype) = (head[0], head[1]);
        let kind = header_kind(flag, subtype, offset)?;
        cur.discard(2)?;
        TapeDataBlock::Header(read_header_body(cur, kind)?)
    } else {
        TapeDataBlock::Data(read_data(cur, length)?)
    };
    trace!("tap unit at {}: length {}, {}", offset, length, block);
    Ok(block)
}

// ── TapFile ──────────────────────────────────────────────────────────────────

impl TapFile {
    /// Scans units until the cursor is exhausted.
    pub fn decode<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        Self::decode_with(cur, &DecodeOptions::default())
    }

    pub fn decode_with<C>(cur: &mut C, options: &DecodeOptions) -> Result<Self>
    where
        C: ByteCursor + ?Sized,
    {
        let mut blocks = Vec::new();
        let mut mode = DecodeMode::standalone();
        while !cur.at_end()? {
            let (block, next) = decode_next(cur, mode)?;
            blocks.push(block);
            mode = next;
        }
        if options.verify_checksums {
            for (index, block) in blocks.iter().enumerate() {
                block.verify_checksum(index)?;
            }
        }
        Ok(TapFile { blocks })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::decode(&mut SliceCursor::new(data))
    }

    pub fn from_reader<R: Read>(rd: R) -> Result<Self> {
        Self::decode(&mut ReadCursor::new(rd))
    }

    pub fn blocks(&self) -> &[TapeDataBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<TapeDataBlock> {
        self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TapeDataBlock> {
        self.blocks.iter()
    }
}

impl<'a> IntoIterator for &'a TapFile {
    type Item = &'a TapeDataBlock;
    type IntoIter = std::slice::Iter<'a, TapeDataBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
