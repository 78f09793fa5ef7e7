//! Little-endian field reads on top of [`ByteCursor`].
//!
//! Every read fails with [`TapeError::UnexpectedEndOfStream`] when the stream
//! is short; nothing falls back to a default value.
//!
//! [`TapeError::UnexpectedEndOfStream`]: crate::error::TapeError::UnexpectedEndOfStream

use byteorder::{ByteOrder, LittleEndian};

use crate::cursor::ByteCursor;
use crate::error::Result;

pub trait FieldRead: ByteCursor {
    fn read_u8(&mut self) -> Result<u8> {
        let byte = self.peek(1)?[0];
        self.discard(1)?;
        Ok(byte)
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        let value = LittleEndian::read_u16(self.peek(2)?);
        self.discard(2)?;
        Ok(value)
    }

    fn read_i16_le(&mut self) -> Result<i16> {
        let value = LittleEndian::read_i16(self.peek(2)?);
        self.discard(2)?;
        Ok(value)
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let value = LittleEndian::read_u32(self.peek(4)?);
        self.discard(4)?;
        Ok(value)
    }

    /// Reads a 3-byte length field, the implicit 4th byte being zero.
    fn read_u24_as_u32(&mut self) -> Result<u32> {
        let value = LittleEndian::read_u24(self.peek(3)?);
        self.discard(3)?;
        Ok(value)
    }

    fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        self.read(n)
    }

    fn peek_byte(&mut self) -> Result<u8> {
        Ok(self.peek(1)?[0])
    }

    fn peek_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.peek(2)?))
    }

    /// Reads `len` bytes of 8-bit text, each byte taken as its Latin-1
    /// character.
    fn read_text(&mut self, len: usize) -> Result<String> {
        let text = latin1(self.peek(len)?);
        self.discard(len)?;
        Ok(text)
    }

    /// Reads a text preceded by its one-byte length.
    fn read_text_u8(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        self.read_text(len)
    }
}

impl<C: ByteCursor + ?Sized> FieldRead for C {}

/// Maps every byte to the code point of the same value.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
