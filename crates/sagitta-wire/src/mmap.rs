//! File-backed image storage.

use std::fs::File;
use std::io;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

/// Read-only memory-mapped image file.
///
/// Mappings are page-aligned, which satisfies the
/// [`MAX_ALIGN`](crate::MAX_ALIGN) contract, so the bytes can be handed
/// straight to [`MapCursor`](crate::MapCursor). Scanners mapped from here
/// borrow the mapping; the file must stay unmodified while it is alive.
pub struct MappedImage {
    map: Mmap,
}

impl MappedImage {
    /// Map a file read-only.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and we never write through it;
        // callers must not truncate or rewrite the file while mapped.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map })
    }

    /// View the mapped bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.map
    }

    /// Mapped length in bytes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Deref for MappedImage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.map
    }
}
