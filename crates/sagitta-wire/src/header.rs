//! Image header (24 bytes on the wire, padded to 32).
//!
//! Layout (little-endian u32 each):
//! magic → version → ptr_width → max_align → type_code → locals_len

use crate::align::MAX_ALIGN;
use crate::error::ImageError;

/// `"PIRE"` read as a little-endian u32.
pub const MAGIC: u32 = 0x4552_4950;

/// Format version. Incremented whenever the encoding of any block changes.
pub const VERSION: u32 = 1;

/// Encoded header size, before padding.
pub const HEADER_LEN: usize = 24;

/// Scanner variant stored in an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TypeCode {
    /// Letter-classed multi-pattern DFA.
    Dense = 1,
    /// Single-pattern DFA over raw bytes.
    Flat = 2,
    /// CSR transition lists (NFA-capable).
    Sparse = 3,
    /// Dense jump/action/tag tables.
    Tagged = 4,
}

impl TypeCode {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Dense),
            2 => Some(Self::Flat),
            3 => Some(Self::Sparse),
            4 => Some(Self::Tagged),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// First bytes of every image; validated before anything else is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version: u32,
    /// Native pointer width of the producing build.
    pub ptr_width: u32,
    /// Largest alignment unit the producing build padded blocks to.
    pub max_align: u32,
    /// Scanner variant, one of [`TypeCode`].
    pub type_code: u32,
    /// Byte length of the locals block that follows.
    pub locals_len: u32,
}

impl Header {
    /// Header this build writes for the given variant.
    pub fn new(type_code: TypeCode, locals_len: u32) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            ptr_width: std::mem::size_of::<usize>() as u32,
            max_align: MAX_ALIGN as u32,
            type_code: type_code.as_u32(),
            locals_len,
        }
    }

    /// Decode from the first [`HEADER_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= HEADER_LEN, "header too short");
        Self {
            magic: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            ptr_width: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            max_align: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            type_code: u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
            locals_len: u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
        }
    }

    /// Encode to [`HEADER_LEN`] bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.ptr_width.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.max_align.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.type_code.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.locals_len.to_le_bytes());
        bytes
    }

    /// Pre-flight check: magic, version and platform fields only.
    ///
    /// Used when the caller does not yet know which variant the image holds.
    pub fn validate_platform(&self) -> Result<(), ImageError> {
        if self.magic != MAGIC {
            return Err(ImageError::BadMagic);
        }
        if self.version != VERSION {
            return Err(ImageError::Version {
                found: self.version,
            });
        }
        if self.ptr_width != std::mem::size_of::<usize>() as u32
            || self.max_align != MAX_ALIGN as u32
        {
            return Err(ImageError::Platform);
        }
        Ok(())
    }

    /// Full check: platform fields plus the expected variant and locals size.
    pub fn validate_for(&self, type_code: TypeCode, locals_len: u32) -> Result<(), ImageError> {
        self.validate_platform()?;
        if self.type_code != type_code.as_u32() {
            return Err(ImageError::Type {
                expected: type_code.as_u32(),
                found: self.type_code,
            });
        }
        if self.locals_len != locals_len {
            return Err(ImageError::Locals {
                expected: locals_len,
                found: self.locals_len,
            });
        }
        Ok(())
    }
}
