//! Bounds-checked little-endian reader over resource bytes.

use encoding_rs::EUC_KR;

use crate::error::ParseError;

/// Result type for format parsing.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Cursor over a byte slice. Every read is bounds-checked and reports the
/// offset where data ran out.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consumes `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Truncated` if fewer than `len` bytes remain.
    pub fn take(&mut self, len: usize) -> ParseResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(ParseError::Truncated {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Skips `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Truncated` if fewer than `len` bytes remain.
    pub fn skip(&mut self, len: usize) -> ParseResult<()> {
        self.take(len).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> ParseResult<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    /// Reads a `u8`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Truncated` at end of input.
    pub fn u8(&mut self) -> ParseResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    /// Reads a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Truncated` at end of input.
    pub fn u32(&mut self) -> ParseResult<u32> {
        self.array().map(u32::from_le_bytes)
    }

    /// Reads a little-endian `i32`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Truncated` at end of input.
    pub fn i32(&mut self) -> ParseResult<i32> {
        self.array().map(i32::from_le_bytes)
    }

    /// Reads a little-endian `f32`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Truncated` at end of input.
    pub fn f32(&mut self) -> ParseResult<f32> {
        self.array().map(f32::from_le_bytes)
    }

    /// Reads an `i32` element count and rejects negative values and counts
    /// that cannot fit in the remaining input at `min_size` bytes each.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidData` for impossible counts.
    pub fn count(&mut self, min_size: usize) -> ParseResult<usize> {
        let offset = self.pos;
        let raw = self.i32()?;
        let count = usize::try_from(raw)
            .map_err(|_| ParseError::InvalidData(format!("negative count {raw} at offset {offset}")))?;
        if count.saturating_mul(min_size) > self.remaining() {
            return Err(ParseError::InvalidData(format!(
                "count {count} at offset {offset} exceeds remaining data"
            )));
        }
        Ok(count)
    }

    /// Checks a file signature.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::BadMagic` on mismatch.
    pub fn magic(&mut self, expected: &'static str) -> ParseResult<()> {
        let found = self.take(expected.len()).map_err(|_| ParseError::BadMagic {
            expected,
            found: String::from_utf8_lossy(&self.data[self.pos..]).into_owned(),
        })?;
        if found != expected.as_bytes() {
            return Err(ParseError::BadMagic {
                expected,
                found: String::from_utf8_lossy(found).into_owned(),
            });
        }
        Ok(())
    }

    /// Reads a fixed-size, NUL-padded EUC-KR string.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Truncated` if fewer than `len` bytes remain.
    pub fn fixed_string(&mut self, len: usize) -> ParseResult<String> {
        self.take(len).map(decode_name)
    }

    /// Reads an `i32` length followed by that many bytes of EUC-KR text.
    ///
    /// # Errors
    ///
    /// Returns an error if the length is invalid or the input is truncated.
    pub fn prefixed_string(&mut self) -> ParseResult<String> {
        let len = self.count(1)?;
        self.fixed_string(len)
    }
}

/// Decodes a NUL-terminated EUC-KR name.
#[must_use]
pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (text, _had_errors) = EUC_KR.decode_without_bom_handling(&bytes[..end]);
    text.into_owned()
}
