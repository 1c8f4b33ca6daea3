//! Dense-scanner table geometry.
//!
//! A settings block records the two representation constants a foreign or
//! future build could disagree on, independently of the header's platform
//! fields. Written right after the dense locals and compared wholesale on
//! load.

use sagitta_wire::ImageError;

/// Width of one jump cell in bytes.
pub(crate) const CELL_BYTES: usize = 4;

/// Sentinel terminating each state's accept run.
pub const ACCEPT_TERMINATOR: u32 = 0xFFFF_FFFF;

/// Table geometry the producing build assumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub cell: u32,
    pub terminator: u32,
}

impl Settings {
    pub(crate) const WIRE_LEN: usize = 8;

    /// Geometry this build requires.
    pub fn required() -> Self {
        Self {
            cell: CELL_BYTES as u32,
            terminator: ACCEPT_TERMINATOR,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::WIRE_LEN] {
        let mut bytes = [0u8; Self::WIRE_LEN];
        bytes[0..4].copy_from_slice(&self.cell.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.terminator.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            cell: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            terminator: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// A stored geometry differing from ours is a platform incompatibility,
    /// distinct from the header checks.
    pub fn check(&self) -> Result<(), ImageError> {
        if *self != Self::required() {
            return Err(ImageError::Platform);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_geometry_round_trips_and_checks() {
        let s = Settings::required();
        assert_eq!(Settings::from_bytes(&s.to_bytes()), s);
        s.check().unwrap();
    }

    #[test]
    fn foreign_geometry_is_a_platform_error() {
        let s = Settings {
            cell: 8,
            terminator: ACCEPT_TERMINATOR,
        };
        assert!(matches!(s.check(), Err(ImageError::Platform)));
    }
}
