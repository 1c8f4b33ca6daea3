//! Wire format for scanner images.
//!
//! A scanner image is the portable byte form of a compiled text scanner:
//! `[header][pad][locals][pad][variant blocks, each padded]`. Every block
//! starts on a [`MAX_ALIGN`] boundary, so the same bytes can be consumed
//! two ways:
//! - **stream mode** ([`ImageWriter`] / [`ImageReader`]) over any
//!   `std::io` channel, for file and socket persistence;
//! - **map mode** ([`MapCursor`]) over an already-resident buffer, borrowing
//!   sections in place without copying.
//!
//! All multi-byte fields are little-endian at defined offsets; no in-memory
//! struct is ever reinterpreted from raw bytes.

mod align;
mod aligned;
mod error;
mod header;
mod map;
mod mmap;
mod scalar;
mod stream;

pub use align::{MAX_ALIGN, align_up, is_aligned, padding_for};
pub use aligned::AlignedBytes;
pub use error::ImageError;
pub use header::{HEADER_LEN, Header, MAGIC, TypeCode, VERSION};
pub use map::{MapCursor, Table};
pub use mmap::MappedImage;
pub use scalar::Scalar;
pub use stream::{ImageReader, ImageWriter};

#[cfg(test)]
mod stream_tests;
