//! Fixed-layout binary codec shared by the persistent store and the UDP
//! command payloads.
//!
//! The codec is stateless: every function takes an explicit byte buffer and
//! a reference to the entity being encoded or decoded. Field access goes
//! through [`ByteWriter`] / [`ByteReader`], which track the remaining
//! capacity and either move a whole field or nothing at all.
//!
//! Numeric fields are two bytes, low byte first, assembled byte by byte so
//! the layout never depends on the host's endianness.

pub mod controller;
pub mod identity;

use crate::bounded::FixedStr;
use crate::error::CodecError;

// ───────────────────────────────────────────────────────────────
// Writer
// ───────────────────────────────────────────────────────────────

/// Cursor over an output buffer.
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fail up front if `needed` more bytes will not fit.
    pub fn reserve(&self, needed: usize) -> Result<(), CodecError> {
        if needed > self.remaining() {
            return Err(CodecError::BufferTooSmall {
                needed: self.pos + needed,
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn put_bytes(&mut self, data: &[u8]) -> Result<(), CodecError> {
        self.reserve(data.len())?;
        self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
        Ok(())
    }

    pub fn put_u8(&mut self, v: u8) -> Result<(), CodecError> {
        self.put_bytes(&[v])
    }

    pub fn put_u16(&mut self, v: u16) -> Result<(), CodecError> {
        let lo = (v & 0x00FF) as u8;
        let hi = (v >> 8) as u8;
        self.put_bytes(&[lo, hi])
    }

    /// Write the whole field, zero padding included.
    pub fn put_fixed<const N: usize>(&mut self, s: &FixedStr<N>) -> Result<(), CodecError> {
        self.put_bytes(s.raw())
    }

    /// Total bytes written; consumes the cursor.
    pub fn finish(self) -> usize {
        self.pos
    }
}

// ───────────────────────────────────────────────────────────────
// Reader
// ───────────────────────────────────────────────────────────────

/// Cursor over an input buffer. Reads past the end return `None` and
/// leave the cursor where it was.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if n > self.remaining() {
            return None;
        }
        let field = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Some(field)
    }

    pub fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    pub fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from(b[0]) | (u16::from(b[1]) << 8))
    }

    pub fn fixed<const N: usize>(&mut self) -> Option<FixedStr<N>> {
        self.take(N).map(FixedStr::from_bytes)
    }

    /// Everything not consumed yet.
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }
}
