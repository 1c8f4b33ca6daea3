//! Pre-flight image inspection.
//!
//! Reads just the header so a caller can learn which scanner variant a blob
//! holds (and whether this platform can load it at all) before committing
//! to a full load.

use std::io::Read;

use sagitta_wire::{Header, ImageError, ImageReader, MapCursor};

/// Inspect a resident image buffer.
///
/// Checks magic, version and platform fields; type code and locals size are
/// left for the variant's own load.
pub fn probe(bytes: &[u8]) -> Result<Header, ImageError> {
    let header = MapCursor::new(bytes)?.take_header()?;
    header.validate_platform()?;
    Ok(header)
}

/// Inspect a stream. Consumes the header block and its padding.
pub fn probe_reader<R: Read>(input: &mut R) -> Result<Header, ImageError> {
    let header = ImageReader::new(input).take_header()?;
    header.validate_platform()?;
    Ok(header)
}
