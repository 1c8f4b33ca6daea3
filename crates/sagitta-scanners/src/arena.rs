//! Owned transition storage.
//!
//! An [`Arena`] is a contiguous byte region built with the same padding
//! discipline the wire cursors use, so an offset into an arena always equals
//! the corresponding wire offset. Scanners reference into it exclusively by
//! such offsets; no pointer into the arena is ever stored.

use sagitta_wire::{Scalar, padding_for};

/// Growable byte arena mirroring the wire layout.
#[derive(Clone, Debug, Default)]
pub struct Arena {
    bytes: Vec<u8>,
}

impl Arena {
    /// Empty arena. Allocation-free.
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Adopt bytes that already follow the arena layout (a loaded image
    /// block).
    pub(crate) fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Current write position; equals the final section offset while a
    /// scanner is being assembled.
    pub fn pos(&self) -> usize {
        self.bytes.len()
    }

    /// Append one scalar, little-endian.
    pub fn put<T: Scalar>(&mut self, value: T) {
        let mut buf = [0u8; 8];
        value.store(&mut buf);
        self.bytes.extend_from_slice(&buf[..T::WIDTH]);
    }

    /// Append raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Zero-pad to the next alignment boundary.
    pub fn pad(&mut self) {
        let n = padding_for(self.bytes.len());
        self.bytes.resize(self.bytes.len() + n, 0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for Arena {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
