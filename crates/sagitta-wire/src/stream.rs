//! Stream-mode image cursors.
//!
//! Thin position-tracking wrappers over `std::io` that keep the stream
//! cursor on the same [`MAX_ALIGN`](crate::MAX_ALIGN) grid a mapped buffer
//! would use, so stream offsets and map offsets always agree.

use std::io::{self, Read, Write};

use crate::align::{MAX_ALIGN, padding_for};
use crate::error::ImageError;
use crate::header::{HEADER_LEN, Header};
use crate::scalar::Scalar;

/// Sequential image writer.
pub struct ImageWriter<W> {
    inner: W,
    pos: usize,
}

impl<W: Write> ImageWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, pos: 0 }
    }

    /// Bytes written so far.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Write raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), ImageError> {
        self.inner.write_all(bytes)?;
        self.pos += bytes.len();
        Ok(())
    }

    /// Write one scalar, little-endian.
    pub fn put<T: Scalar>(&mut self, value: T) -> Result<(), ImageError> {
        let mut buf = [0u8; 8];
        value.store(&mut buf);
        self.put_bytes(&buf[..T::WIDTH])
    }

    /// Pad with zeros to the next alignment boundary.
    pub fn pad(&mut self) -> Result<(), ImageError> {
        const ZEROS: [u8; MAX_ALIGN] = [0; MAX_ALIGN];
        let n = padding_for(self.pos);
        self.put_bytes(&ZEROS[..n])
    }

    /// Write an image header, padded.
    pub fn put_header(&mut self, header: &Header) -> Result<(), ImageError> {
        self.put_bytes(&header.to_bytes())?;
        self.pad()
    }
}

/// Sequential image reader. Short reads surface as
/// [`ImageError::Truncated`].
pub struct ImageReader<R> {
    inner: R,
    pos: usize,
}

impl<R: Read> ImageReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Fill `buf` exactly.
    pub fn take_bytes(&mut self, buf: &mut [u8]) -> Result<(), ImageError> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                ImageError::Truncated
            } else {
                ImageError::Io(e)
            }
        })?;
        self.pos += buf.len();
        Ok(())
    }

    /// Read one scalar, little-endian.
    pub fn take<T: Scalar>(&mut self) -> Result<T, ImageError> {
        let mut buf = [0u8; 8];
        self.take_bytes(&mut buf[..T::WIDTH])?;
        Ok(T::load(&buf))
    }

    /// Skip pad bytes up to the next alignment boundary.
    pub fn skip_pad(&mut self) -> Result<(), ImageError> {
        let mut scratch = [0u8; MAX_ALIGN];
        let n = padding_for(self.pos);
        self.take_bytes(&mut scratch[..n])
    }

    /// Read an image header and its padding. Performs no validation.
    pub fn take_header(&mut self) -> Result<Header, ImageError> {
        let mut buf = [0u8; HEADER_LEN];
        self.take_bytes(&mut buf)?;
        self.skip_pad()?;
        Ok(Header::from_bytes(&buf))
    }
}
