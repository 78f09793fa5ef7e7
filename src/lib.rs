//! Decoder for ZX Spectrum cassette images: TZX containers and plain TAP
//! files.
//!
//! ```no_run
//! use zxtape::TzxFile;
//!
//! let tzx = TzxFile::open("game.tzx")?;
//! for block in tzx.blocks() {
//!     println!("{}: {}", block.name(), block);
//! }
//! # Ok::<(), zxtape::TapeError>(())
//! ```

pub mod cursor;
pub mod field;
pub mod error;
pub mod options;
pub mod tap;
pub mod block;
pub mod dispatch;
pub mod container;

pub use cursor::{ByteCursor, ReadCursor, SliceCursor};
pub use error::{Result, TapeError};
pub use options::DecodeOptions;
pub use tap::{DecodeMode, HeaderGate, HeaderKind, TapFile, TapeData, TapeDataBlock, TapeHeader};
pub use block::{Block, BlockKind, WithdrawnKind};
pub use dispatch::dispatch;
pub use container::{Tape, TapeFormat, TzxFile, TzxHeader};
