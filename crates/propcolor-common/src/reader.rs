//! Binary reader for bounds-checked parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that reads
//! little-endian values from a byte slice. Every read is range-checked, so
//! a corrupt offset surfaces as an [`Error::UnexpectedEof`] instead of a
//! panic.

use std::borrow::Cow;

use zerocopy::FromBytes;

use crate::{Error, Result};

/// A binary reader over a byte slice.
///
/// # Example
///
/// ```
/// use propcolor_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0xFE, 0xFF];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_i32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_i16().unwrap(), -2);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a new reader starting at a specific position.
    ///
    /// The position may lie past the end of the buffer; the first read
    /// will then fail with [`Error::UnexpectedEof`].
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a little-endian i16.
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.read_bytes(2)?;
        Ok(i16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a null-terminated string, replacing invalid UTF-8 sequences.
    ///
    /// Model files written by older tools carry code-page text in a few
    /// string fields; this keeps those readable instead of failing.
    pub fn read_cstring_lossy(&mut self) -> Result<Cow<'a, str>> {
        let bytes = self.read_cstring_bytes()?;
        Ok(String::from_utf8_lossy(bytes))
    }

    /// Read the bytes of a null-terminated string, excluding the terminator.
    fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
        if self.is_empty() {
            return Err(Error::UnexpectedEof {
                needed: 1,
                available: 0,
            });
        }

        let remaining = self.remaining_bytes();
        let null_pos = memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator)?;

        self.position += null_pos + 1; // Skip the null terminator
        Ok(&remaining[..null_pos])
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes` from the zerocopy crate.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Expect one of several magic values and return the one that matched.
    pub fn expect_any_magic<const N: usize>(&mut self, accepted: &[[u8; N]]) -> Result<[u8; N]> {
        let actual = self.peek_bytes(N).map_err(|_| Error::InvalidMagic {
            expected: accepted.first().map(|m| m.to_vec()).unwrap_or_default(),
            actual: self.remaining_bytes().to_vec(),
        })?;

        match accepted.iter().find(|magic| magic.as_slice() == actual) {
            Some(magic) => {
                self.position += N;
                Ok(*magic)
            }
            None => Err(Error::InvalidMagic {
                expected: accepted.first().map(|m| m.to_vec()).unwrap_or_default(),
                actual: actual.to_vec(),
            }),
        }
    }
}
