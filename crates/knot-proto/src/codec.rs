// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packed little-endian byte writer/reader
//!
//! Both protocol layers use packed layouts: fields follow each other with
//! no alignment padding and multi-byte integers are little-endian. Fixed
//! string fields are null-padded to their declared width.

use crate::error::{Error, Result, ValidationError};

/// Writer over a caller-provided buffer
///
/// # Example
///
/// ```ignore
/// let mut buf = [0u8; 16];
/// let mut w = ByteWriter::new(&mut buf);
/// w.put_u8(0x20)?;
/// w.put_i32(2500)?;
/// assert_eq!(w.position(), 5);
/// ```
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// Create a writer starting at offset 0
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Finish writing and return the written prefix
    pub fn finish(self) -> &'a [u8] {
        let Self { buf, pos } = self;
        &buf[..pos]
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.remaining() {
            return Err(Error::BufferTooSmall);
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.put_bytes(&[value])
    }

    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_i32(&mut self, value: i32) -> Result<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    /// Write `value` into a field of exactly `width` bytes, null-padded.
    pub fn put_padded_str(&mut self, value: &str, width: usize) -> Result<()> {
        let bytes = value.as_bytes();
        if bytes.len() > width {
            return Err(Error::PayloadTooLarge(bytes.len()));
        }
        if width > self.remaining() {
            return Err(Error::BufferTooSmall);
        }
        self.put_bytes(bytes)?;
        for _ in bytes.len()..width {
            self.put_u8(0)?;
        }
        Ok(())
    }
}

/// Reader over a borrowed buffer
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader starting at offset 0
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(Error::BufferTooSmall);
        }
        let bytes = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.bytes(N)?);
        Ok(arr)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    /// Read a null-padded string field of `width` bytes.
    ///
    /// The string ends at the first NUL or at the field boundary.
    pub fn padded_str(&mut self, width: usize) -> Result<&'a str> {
        let field = self.bytes(width)?;
        let end = field.iter().position(|&b| b == 0).unwrap_or(width);
        core::str::from_utf8(&field[..end]).map_err(|_| ValidationError::InvalidDeviceName.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_layout_has_no_padding() {
        let mut buf = [0u8; 16];
        let mut w = ByteWriter::new(&mut buf);
        w.put_u8(0x11).unwrap();
        w.put_i32(-2).unwrap();
        w.put_u16(0x0203).unwrap();

        assert_eq!(w.finish(), &[0x11, 0xFE, 0xFF, 0xFF, 0xFF, 0x03, 0x02]);
    }

    #[test]
    fn test_padded_str() {
        let mut buf = [0xAAu8; 8];
        let mut w = ByteWriter::new(&mut buf);
        w.put_padded_str("abc", 6).unwrap();
        assert_eq!(w.position(), 6);
        assert_eq!(&buf[..6], b"abc\0\0\0");

        let mut r = ByteReader::new(&buf[..6]);
        assert_eq!(r.padded_str(6).unwrap(), "abc");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_padded_str_full_width_without_terminator() {
        let buf = *b"abcd";
        let mut r = ByteReader::new(&buf);
        assert_eq!(r.padded_str(4).unwrap(), "abcd");
    }

    #[test]
    fn test_oversized_str_rejected() {
        let mut buf = [0u8; 8];
        let mut w = ByteWriter::new(&mut buf);
        assert_eq!(w.put_padded_str("toolong", 4), Err(Error::PayloadTooLarge(7)));
        assert_eq!(w.position(), 0);
    }

    #[test]
    fn test_buffer_too_small() {
        let mut buf = [0u8; 2];
        let mut w = ByteWriter::new(&mut buf);
        assert_eq!(w.put_u32(42), Err(Error::BufferTooSmall));

        let mut r = ByteReader::new(&buf);
        assert_eq!(r.u32(), Err(Error::BufferTooSmall));
    }
}
