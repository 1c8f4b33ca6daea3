//! Byte-to-letter classification.
//!
//! A letter is an equivalence class of input bytes the automaton treats
//! identically. Compressing 256 byte values down to a handful of classes is
//! what keeps dense jump matrices small; the table mapping byte → class is
//! the first section of every classed variant's image.

use sagitta_wire::{ImageError, Table};

/// Size of the input alphabet; the classification table always has this many
/// entries.
pub const ALPHABET: usize = 256;

/// Owned classification table, used when assembling a scanner.
///
/// Classes must be contiguous: every value in `0..class_count()` occurs.
#[derive(Clone)]
pub struct LetterTable {
    classes: [u32; ALPHABET],
    count: u32,
}

impl LetterTable {
    /// One class per byte value; no compression.
    pub fn identity() -> Self {
        let mut classes = [0u32; ALPHABET];
        for (b, class) in classes.iter_mut().enumerate() {
            *class = b as u32;
        }
        Self {
            classes,
            count: ALPHABET as u32,
        }
    }

    /// Adopt a precomputed classification.
    ///
    /// Panics if the classes are not contiguous from zero.
    pub fn from_classes(classes: [u32; ALPHABET]) -> Self {
        let count = classes.iter().max().copied().unwrap_or(0) + 1;
        let mut seen = vec![false; count as usize];
        for &c in &classes {
            seen[c as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "letter classes must be contiguous");
        Self { classes, count }
    }

    /// Number of distinct classes.
    pub fn class_count(&self) -> u32 {
        self.count
    }

    pub fn class_of(&self, byte: u8) -> u32 {
        self.classes[byte as usize]
    }

    /// Append the table to an arena as `ALPHABET` little-endian u32 values.
    pub(crate) fn encode(&self, arena: &mut crate::arena::Arena) {
        for &class in &self.classes {
            arena.put(class);
        }
    }
}

impl std::fmt::Debug for LetterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LetterTable")
            .field("count", &self.count)
            .finish()
    }
}

/// Borrowed view of an encoded classification section.
#[derive(Clone, Copy)]
pub struct LettersView<'a> {
    table: Table<'a, u32>,
}

impl<'a> LettersView<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self {
            table: Table::new(bytes),
        }
    }

    #[inline]
    pub fn class_of(&self, byte: u8) -> u32 {
        self.table.get(byte as usize)
    }

    /// Load-time check that every class is below the declared letter count.
    pub(crate) fn validate(&self, letters: u32) -> Result<(), ImageError> {
        for (at, class) in self.table.iter().enumerate() {
            if class >= letters {
                return Err(ImageError::BadIndex { at });
            }
        }
        Ok(())
    }
}
