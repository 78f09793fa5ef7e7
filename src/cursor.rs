//! Forward-only byte cursors.
//!
//! Decoders never seek backwards; all they need is to consume bytes, look a
//! few bytes ahead and skip. [`SliceCursor`] serves in-memory images,
//! [`ReadCursor`] adapts any [`Read`] by buffering just enough lookahead.

use std::io::{self, Read};

use crate::error::{Result, TapeError};

/// The capability set the decoders consume.
pub trait ByteCursor {
    /// Number of bytes consumed so far.
    fn position(&self) -> u64;

    /// Returns the next `n` bytes without consuming them.
    fn peek(&mut self, n: usize) -> Result<&[u8]>;

    /// Consumes `n` bytes without looking at them.
    fn discard(&mut self, n: usize) -> Result<()>;

    /// Returns `true` when no byte is left.
    fn at_end(&mut self) -> Result<bool>;

    /// Consumes exactly `buf.len()` bytes into `buf`.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = buf.len();
        buf.copy_from_slice(self.peek(n)?);
        self.discard(n)
    }

    /// Consumes `n` bytes into a new vector.
    fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let bytes = self.peek(n)?.to_vec();
        self.discard(n)?;
        Ok(bytes)
    }
}

impl<C: ByteCursor + ?Sized> ByteCursor for &mut C {
    fn position(&self) -> u64 { (**self).position() }
    fn peek(&mut self, n: usize) -> Result<&[u8]> { (**self).peek(n) }
    fn discard(&mut self, n: usize) -> Result<()> { (**self).discard(n) }
    fn at_end(&mut self) -> Result<bool> { (**self).at_end() }
}

fn end_of_stream(offset: u64, wanted: usize) -> TapeError {
    TapeError::UnexpectedEndOfStream { offset, wanted }
}

// ── SliceCursor ──────────────────────────────────────────────────────────────

/// Cursor over a byte slice held in memory.
#[derive(Debug, Clone)]
pub struct SliceCursor<'a> {
    data: &'a [u8],
    pos:  usize,
}

impl<'a> SliceCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl<'a, T: AsRef<[u8]> + ?Sized> From<&'a T> for SliceCursor<'a> {
    fn from(data: &'a T) -> Self {
        SliceCursor::new(data.as_ref())
    }
}

impl ByteCursor for SliceCursor<'_> {
    fn position(&self) -> u64 {
        self.pos as u64
    }

    fn peek(&mut self, n: usize) -> Result<&[u8]> {
        self.data.get(self.pos..self.pos.saturating_add(n))
            .ok_or_else(|| end_of_stream(self.pos as u64, n))
    }

    fn discard(&mut self, n: usize) -> Result<()> {
        if self.data.len() - self.pos < n {
            return Err(end_of_stream(self.pos as u64, n));
        }
        self.pos += n;
        Ok(())
    }

    fn at_end(&mut self) -> Result<bool> {
        Ok(self.pos == self.data.len())
    }
}

// ── ReadCursor ───────────────────────────────────────────────────────────────

const READ_CHUNK: usize = 8 * 1024;

/// Cursor over any [`Read`], buffering only what lookahead requires.
#[derive(Debug)]
pub struct ReadCursor<R> {
    inner:    R,
    buf:      Vec<u8>,
    start:    usize,
    consumed: u64,
    eof:      bool,
}

impl<R: Read> ReadCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, buf: Vec::new(), start: 0, consumed: 0, eof: false }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn buffered(&self) -> usize {
        self.buf.len() - self.start
    }

    /// Buffers until `n` bytes are available or the reader is exhausted.
    fn fill(&mut self, n: usize) -> io::Result<()> {
        if self.buffered() >= n || self.eof {
            return Ok(());
        }
        if self.start > 0 {
            self.buf.drain(..self.start);
            self.start = 0;
        }
        let mut chunk = [0u8; READ_CHUNK];
        while self.buf.len() < n {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(read) => self.buf.extend_from_slice(&chunk[..read]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl<R: Read> ByteCursor for ReadCursor<R> {
    fn position(&self) -> u64 {
        self.consumed
    }

    fn peek(&mut self, n: usize) -> Result<&[u8]> {
        self.fill(n)?;
        if self.buffered() < n {
            return Err(end_of_stream(self.consumed, n));
        }
        Ok(&self.buf[self.start..self.start + n])
    }

    fn discard(&mut self, n: usize) -> Result<()> {
        self.fill(n)?;
        if self.buffered() < n {
            return Err(end_of_stream(self.consumed, n));
        }
        self.start += n;
        self.consumed += n as u64;
        Ok(())
    }

    fn at_end(&mut self) -> Result<bool> {
        self.fill(1)?;
        Ok(self.buffered() == 0)
    }
}
