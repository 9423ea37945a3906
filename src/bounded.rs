//! Fixed-capacity, zero-terminated text fields.
//!
//! Every name, SSID and key on the wire and in the store occupies a fixed
//! number of bytes. [`FixedStr<N>`] carries that capacity in its type:
//!
//! - at most `N - 1` content bytes are kept, oversized input is truncated
//!   silently;
//! - every byte after the content is zero, so the last byte is always a
//!   terminator;
//! - the encoded form is always exactly `N` bytes.

use core::fmt;

use serde::{Serialize, Serializer};

use crate::config::{NAME_CAPACITY, SSID_CAPACITY};

/// Capability, controller, device and location names (15 chars + NUL).
pub type NameStr = FixedStr<NAME_CAPACITY>;
/// Network SSID and key fields (23 chars + NUL).
pub type SsidStr = FixedStr<SSID_CAPACITY>;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedStr<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedStr<N> {
    /// Size of the field on the wire and in the store.
    pub const CAPACITY: usize = N;

    /// An empty (all-zero) field.
    pub const fn new() -> Self {
        Self { bytes: [0; N] }
    }

    /// Copy `s`, truncating to `N - 1` bytes.
    pub fn from_str_truncated(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// Copy raw field bytes up to the first NUL, truncating to `N - 1` bytes.
    ///
    /// `src` may be shorter or longer than `N`; bytes past the terminator are
    /// discarded rather than carried over.
    pub fn from_bytes(src: &[u8]) -> Self {
        let mut out = Self::new();
        let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
        let len = end.min(N.saturating_sub(1));
        out.bytes[..len].copy_from_slice(&src[..len]);
        out
    }

    /// Number of content bytes (terminator excluded).
    pub fn len(&self) -> usize {
        self.bytes.iter().position(|&b| b == 0).unwrap_or(N)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.first().is_none_or(|&b| b == 0)
    }

    /// Content bytes, terminator excluded.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Content as text. A trailing partial UTF-8 sequence (left by byte
    /// truncation) or invalid bytes end the string early.
    pub fn as_str(&self) -> &str {
        let content = self.as_bytes();
        match core::str::from_utf8(content) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&content[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    /// The full field, zero padding included.
    pub fn raw(&self) -> &[u8; N] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes = [0; N];
    }

    /// Replace the content, truncating like [`from_str_truncated`](Self::from_str_truncated).
    pub fn set(&mut self, s: &str) {
        *self = Self::from_str_truncated(s);
    }
}

impl<const N: usize> Default for FixedStr<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> From<&str> for FixedStr<N> {
    fn from(s: &str) -> Self {
        Self::from_str_truncated(s)
    }
}

impl<const N: usize> PartialEq<str> for FixedStr<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> PartialEq<&str> for FixedStr<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> fmt::Display for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for FixedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl<const N: usize> Serialize for FixedStr<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
