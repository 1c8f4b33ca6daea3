//! Map-mode image cursor and typed section views.
//!
//! Map mode interprets an already-resident buffer in place: sections are
//! borrowed, never copied, and every span is bounds-checked up front so a
//! truncated image fails cleanly instead of reading past the buffer.

use std::marker::PhantomData;

use crate::align::{is_aligned, padding_for};
use crate::error::ImageError;
use crate::header::{HEADER_LEN, Header};
use crate::scalar::Scalar;

/// Cursor over a mapped image buffer.
///
/// Construction checks the buffer's base address once; after that, position
/// alignment and address alignment coincide.
pub struct MapCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> MapCursor<'a> {
    /// Fails with [`ImageError::Misaligned`] if the buffer base itself does
    /// not satisfy the alignment contract.
    pub fn new(bytes: &'a [u8]) -> Result<Self, ImageError> {
        if !is_aligned(bytes.as_ptr() as usize) {
            return Err(ImageError::Misaligned);
        }
        Ok(Self { bytes, pos: 0 })
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Bytes left in the buffer.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Borrow the next `len` bytes in place.
    pub fn take_span(&mut self, len: usize) -> Result<&'a [u8], ImageError> {
        if self.remaining() < len {
            return Err(ImageError::Truncated);
        }
        let span = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(span)
    }

    /// Decode one scalar and advance.
    pub fn take<T: Scalar>(&mut self) -> Result<T, ImageError> {
        Ok(T::load(self.take_span(T::WIDTH)?))
    }

    /// Skip pad bytes up to the next alignment boundary.
    pub fn skip_pad(&mut self) -> Result<(), ImageError> {
        self.take_span(padding_for(self.pos)).map(|_| ())
    }

    /// Read an image header and its padding. Performs no validation.
    pub fn take_header(&mut self) -> Result<Header, ImageError> {
        let span = self.take_span(HEADER_LEN)?;
        self.skip_pad()?;
        Ok(Header::from_bytes(span))
    }
}

/// Borrowed view of a homogeneous section, decoding one element per access.
///
/// Decoding is a `from_le_bytes` per element, which is free on
/// little-endian targets.
#[derive(Clone, Copy)]
pub struct Table<'a, T: Scalar> {
    bytes: &'a [u8],
    _marker: PhantomData<T>,
}

impl<'a, T: Scalar> Table<'a, T> {
    pub fn new(bytes: &'a [u8]) -> Self {
        debug_assert!(bytes.len().is_multiple_of(T::WIDTH), "ragged table");
        Self {
            bytes,
            _marker: PhantomData,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / T::WIDTH
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the element at `idx`.
    pub fn get(&self, idx: usize) -> T {
        assert!(idx < self.len(), "table index out of bounds");
        T::load(&self.bytes[idx * T::WIDTH..])
    }

    /// Iterate over all elements.
    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        let bytes = self.bytes;
        (0..bytes.len() / T::WIDTH).map(move |i| T::load(&bytes[i * T::WIDTH..]))
    }
}
