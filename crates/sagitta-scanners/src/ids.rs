//! Scanner index newtypes.

/// Index of an automaton state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateId(pub u32);

/// Byte offset of a transition row, relative to the variant's row base
/// (the arena start for dense and flat scanners, the jump section for
/// tagged ones).
///
/// Rows are what jump cells and the `initial` locals field hold, in memory
/// and on the wire alike, which is what makes an image position-independent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Row(pub u32);

impl Row {
    #[inline]
    pub fn byte_offset(self) -> usize {
        self.0 as usize
    }
}

/// Index of a pattern in a multi-pattern scanner.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PatternId(pub u32);
