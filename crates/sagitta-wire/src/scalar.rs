//! Fixed-width little-endian scalars.
//!
//! The substrate every image block is built from: each field is encoded at
//! a defined byte offset with `to_le_bytes`/`from_le_bytes`, independent of
//! the producing platform's struct layout.

/// A value with a fixed little-endian wire encoding.
pub trait Scalar: Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decode from the first `WIDTH` bytes of `bytes`.
    fn load(bytes: &[u8]) -> Self;

    /// Encode into the first `WIDTH` bytes of `out`.
    fn store(self, out: &mut [u8]);
}

macro_rules! le_scalar {
    ($($ty:ty),*) => {$(
        impl Scalar for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn load(bytes: &[u8]) -> Self {
                Self::from_le_bytes(bytes[..Self::WIDTH].try_into().unwrap())
            }

            #[inline]
            fn store(self, out: &mut [u8]) {
                out[..Self::WIDTH].copy_from_slice(&self.to_le_bytes());
            }
        }
    )*};
}

le_scalar!(u8, u16, u32, u64);
