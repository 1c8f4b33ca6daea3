//! Alignment discipline for image blocks.
//!
//! Every logical block of an image is followed by zero padding up to the
//! next [`MAX_ALIGN`] boundary. Pad bytes carry no meaning; readers skip
//! them and never interpret them.

/// Largest alignment unit any image block assumes.
///
/// Map-mode source buffers must start on this boundary.
pub const MAX_ALIGN: usize = 16;

/// Round `value` up to the next multiple of [`MAX_ALIGN`].
pub const fn align_up(value: usize) -> usize {
    (value + MAX_ALIGN - 1) & !(MAX_ALIGN - 1)
}

/// Number of pad bytes needed after a block ending at `pos`.
pub const fn padding_for(pos: usize) -> usize {
    align_up(pos) - pos
}

/// Check that an address sits on a [`MAX_ALIGN`] boundary.
pub fn is_aligned(addr: usize) -> bool {
    addr.is_multiple_of(MAX_ALIGN)
}
