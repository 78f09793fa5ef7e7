//! TZX container: the 10-byte header followed by blocks until end of stream.
//!
//! ```text
//! offset  size  field
//!    0      7   "ZXTape!"
//!    7      1   0x1A
//!    8      1   major version
//!    9      1   minor version
//!   10      …   blocks, each starting with its tag byte
//! ```

use std::fs;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};
use serde::Serialize;

use crate::block::{ArchiveInfo, Block};
use crate::cursor::{ByteCursor, ReadCursor, SliceCursor};
use crate::dispatch::dispatch;
use crate::error::{Result, TapeError};
use crate::field::FieldRead;
use crate::options::DecodeOptions;
use crate::tap::TapFile;

pub const SIGNATURE: &[u8; 8] = b"ZXTape!\x1A";
/// Minor revision of the newest format this decoder knows about.
pub const KNOWN_MINOR_VERSION: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TzxHeader {
    #[serde(skip)]
    signature: [u8; 8],
    major:     u8,
    minor:     u8,
}

/// A decoded TZX image. Its header and blocks are read through accessors:
///
/// ```compile_fail
/// let mut tzx = zxtape::TzxFile::from_bytes(b"ZXTape!\x1A\x01\x14").unwrap();
/// tzx.blocks.clear();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TzxFile {
    header: TzxHeader,
    blocks: Vec<Block>,
}

impl TzxHeader {
    pub fn read<C: ByteCursor + ?Sized>(cur: &mut C, options: &DecodeOptions) -> Result<Self> {
        let offset = cur.position();
        let signature = cur.read_fixed::<8>()?;
        if signature != *SIGNATURE {
            return Err(TapeError::MalformedHeader { offset });
        }
        let major = cur.read_u8()?;
        let minor = cur.read_u8()?;
        if major > options.max_major_version {
            return Err(TapeError::UnsupportedVersion {
                major,
                minor,
                supported: options.max_major_version,
            });
        }
        if major == options.max_major_version && minor > KNOWN_MINOR_VERSION {
            warn!("TZX revision {}.{:02} is newer than {}.{:02}; decoding anyway",
                major, minor, major, KNOWN_MINOR_VERSION);
        }
        Ok(TzxHeader { signature, major, minor })
    }

    pub fn signature(&self) -> &[u8; 8] {
        &self.signature
    }

    pub fn major(&self) -> u8 {
        self.major
    }

    pub fn minor(&self) -> u8 {
        self.minor
    }
}

impl TzxFile {
    pub fn decode<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        Self::decode_with(cur, &DecodeOptions::default())
    }

    pub fn decode_with<C>(cur: &mut C, options: &DecodeOptions) -> Result<Self>
    where
        C: ByteCursor + ?Sized,
    {
        let header = TzxHeader::read(cur, options)?;
        debug!("TZX {}.{:02}", header.major, header.minor);

        let mut blocks = Vec::new();
        let mut cur = cur;
        while !cur.at_end()? {
            let offset = cur.position();
            let kind = dispatch(cur.peek_byte()?, offset)?;
            let block = kind.decoder()(&mut cur)?;
            debug!("block #{} at {}: 0x{:02X} {}", blocks.len(), offset, kind.tag(), kind);
            blocks.push(block);
        }

        let file = TzxFile { header, blocks };
        if options.verify_checksums {
            file.verify_checksums()?;
        }
        Ok(file)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::decode(&mut SliceCursor::new(data))
    }

    pub fn from_reader<R: Read>(rd: R) -> Result<Self> {
        Self::decode(&mut ReadCursor::new(rd))
    }

    /// Reads the whole file, then decodes it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }

    pub fn header(&self) -> &TzxHeader {
        &self.header
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// The first archive info block, where titles and authors live.
    pub fn archive_info(&self) -> Option<&ArchiveInfo> {
        self.blocks.iter().find_map(|block| match block {
            Block::ArchiveInfo(info) => Some(info),
            _ => None,
        })
    }

    /// Fails on the first embedded TAP unit whose bytes do not XOR to 0.
    pub fn verify_checksums(&self) -> Result<()> {
        for (index, block) in self.blocks.iter().enumerate() {
            if let Some(unit) = block.tape_data() {
                unit.verify_checksum(index)?;
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a TzxFile {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

// ── Tape ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TapeFormat {
    Tzx,
    Tap,
}

/// Either kind of tape image, told apart by the TZX signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Tape {
    Tzx(TzxFile),
    Tap(TapFile),
}

impl Tape {
    /// Anything not starting with the TZX signature is taken for a TAP file.
    pub fn detect(prefix: &[u8]) -> TapeFormat {
        if prefix.starts_with(SIGNATURE) {
            TapeFormat::Tzx
        } else {
            TapeFormat::Tap
        }
    }

    pub fn from_bytes(data: &[u8], options: &DecodeOptions) -> Result<Self> {
        let mut cur = SliceCursor::new(data);
        match Self::detect(data) {
            TapeFormat::Tzx => TzxFile::decode_with(&mut cur, options).map(Tape::Tzx),
            TapeFormat::Tap => TapFile::decode_with(&mut cur, options).map(Tape::Tap),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?, options)
    }

    pub fn format(&self) -> TapeFormat {
        match self {
            Tape::Tzx(_) => TapeFormat::Tzx,
            Tape::Tap(_) => TapeFormat::Tap,
        }
    }
}
