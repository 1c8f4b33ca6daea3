//! 16-byte aligned storage for image buffers.
//!
//! Map mode requires the source buffer to start on a [`MAX_ALIGN`] boundary.
//! Standard `Vec<u8>` provides no alignment guarantees for `u8`, so bytes
//! that arrive unaligned (a socket read, a test vector) are rehomed here
//! before mapping.

use std::ops::Deref;

use crate::align::MAX_ALIGN;

/// 16-byte aligned block.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
struct Chunk([u8; MAX_ALIGN]);

/// Immutable byte storage whose base address satisfies [`MAX_ALIGN`].
///
/// Uses `Vec<Chunk>` internally; Vec guarantees element alignment, so the
/// data starts on the required boundary without a custom allocator.
pub struct AlignedBytes {
    chunks: Vec<Chunk>,
    len: usize,
}

impl AlignedBytes {
    /// Copy bytes into aligned storage.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self {
                chunks: Vec::new(),
                len: 0,
            };
        }

        let n = bytes.len().div_ceil(MAX_ALIGN);
        let mut chunks = vec![Chunk([0; MAX_ALIGN]); n];
        for (chunk, src) in chunks.iter_mut().zip(bytes.chunks(MAX_ALIGN)) {
            chunk.0[..src.len()].copy_from_slice(src);
        }

        Self {
            chunks,
            len: bytes.len(),
        }
    }

    /// Read a whole file into aligned storage.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::copy_from_slice(&bytes))
    }

    /// Number of bytes stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// View as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        if self.chunks.is_empty() {
            return &[];
        }
        debug_assert!(self.len <= self.chunks.len() * MAX_ALIGN);
        // SAFETY: Chunk is repr(C) holding only [u8; 16], so the pointer cast
        // is valid. Only `len` bytes are exposed, all initialized in
        // copy_from_slice.
        unsafe { std::slice::from_raw_parts(self.chunks.as_ptr() as *const u8, self.len) }
    }
}

impl Deref for AlignedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Clone for AlignedBytes {
    fn clone(&self) -> Self {
        Self {
            chunks: self.chunks.clone(),
            len: self.len,
        }
    }
}

impl std::fmt::Debug for AlignedBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBytes")
            .field("len", &self.len)
            .finish()
    }
}
