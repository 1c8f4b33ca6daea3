//! Image load/save errors.

use std::io;

use crate::align::MAX_ALIGN;
use crate::header::VERSION;

/// Everything that can go wrong while reading or writing a scanner image.
///
/// Failures are returned synchronously and never retried; a failed load is a
/// constructor that returned `Err`, so no partial scanner ever escapes.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The bytes are not a scanner image at all.
    #[error("invalid magic: not a scanner image")]
    BadMagic,

    /// Recognized image, wrong format revision.
    #[error("unsupported image version {found} (expected {})", VERSION)]
    Version { found: u32 },

    /// Pointer width, alignment unit or table geometry differ from the
    /// platform this build runs on.
    #[error("scanner image is incompatible with your system")]
    Platform,

    /// The image holds a different scanner variant than the caller asked for.
    #[error("scanner type mismatch: expected {expected}, found {found}")]
    Type { expected: u32, found: u32 },

    /// The declared locals block size disagrees with this build.
    #[error("locals size mismatch: expected {expected} bytes, found {found}")]
    Locals { expected: u32, found: u32 },

    /// Fewer bytes available than a block declares.
    #[error("truncated scanner image")]
    Truncated,

    /// A map-mode source buffer does not start on a `MAX_ALIGN` boundary.
    #[error("image buffer is not {}-byte aligned", MAX_ALIGN)]
    Misaligned,

    /// A table entry is out of range or violates a table invariant.
    #[error("corrupt scanner table at entry {at}")]
    BadIndex { at: usize },

    /// The variant has no wire representation for an empty scanner.
    #[error("empty scanner is not representable in this format")]
    EmptyScanner,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
