//! Byte View Module
//!
//! Immutable view over the bytes of one cached value.

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;

// == Sized Value ==
/// Anything the LRU store can hold: it only needs to report its size in bytes.
#[allow(clippy::len_without_is_empty)]
pub trait SizedValue {
    /// Size of the value in bytes.
    fn len(&self) -> usize;
}

// == Byte View ==
/// An immutable, cheaply cloneable byte buffer.
///
/// The underlying bytes are never handed out mutably. `copy_out` gives the
/// caller a private copy it may change freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Creates a view over the given bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Number of bytes in the view.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrows the bytes read-only.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns a fresh copy of the bytes.
    pub fn copy_out(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Returns the bytes as text, replacing invalid UTF-8 sequences.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl SizedValue for ByteView {
    fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<Bytes> for ByteView {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

impl From<String> for ByteView {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}

impl From<&str> for ByteView {
    fn from(text: &str) -> Self {
        Self::new(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}
