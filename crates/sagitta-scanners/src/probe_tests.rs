use sagitta_wire::{AlignedBytes, Header, ImageError, MAX_ALIGN, TypeCode};

use crate::test_utils::{dfa_tables, dense_from, sparse_from};
use crate::{probe, probe_reader};

fn dense_image() -> Vec<u8> {
    let mut bytes = Vec::new();
    dense_from(&dfa_tables("ab")).save(&mut bytes).unwrap();
    bytes
}

#[test]
fn probe_reports_the_variant_without_loading() {
    let image = AlignedBytes::copy_from_slice(&dense_image());
    let header = probe(&image).unwrap();
    assert_eq!(header.type_code, TypeCode::Dense.as_u32());
    assert_eq!(header.locals_len, 20);
    assert_eq!(header.max_align, MAX_ALIGN as u32);

    let mut bytes = Vec::new();
    sparse_from(&dfa_tables("ab")).save(&mut bytes).unwrap();
    let image = AlignedBytes::copy_from_slice(&bytes);
    assert_eq!(probe(&image).unwrap().type_code, TypeCode::Sparse.as_u32());
}

#[test]
fn probe_reader_consumes_exactly_the_header_block() {
    let bytes = dense_image();
    let mut input = bytes.as_slice();
    let header = probe_reader(&mut input).unwrap();
    assert_eq!(header.type_code, TypeCode::Dense.as_u32());
    assert_eq!(input.len(), bytes.len() - 32);
}

#[test]
fn probe_rejects_a_foreign_magic() {
    let mut bytes = dense_image();
    bytes[0] = b'Q';
    let image = AlignedBytes::copy_from_slice(&bytes);
    assert!(matches!(probe(&image), Err(ImageError::BadMagic)));
}

#[test]
fn probe_rejects_an_unknown_version() {
    let mut bytes = dense_image();
    bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
    assert!(matches!(
        probe_reader(&mut bytes.as_slice()),
        Err(ImageError::Version { found: 7 })
    ));
}

#[test]
fn probe_rejects_a_foreign_alignment() {
    let mut bytes = dense_image();
    bytes[12..16].copy_from_slice(&8u32.to_le_bytes());
    let image = AlignedBytes::copy_from_slice(&bytes);
    assert!(matches!(probe(&image), Err(ImageError::Platform)));
}

#[test]
fn probe_leaves_the_type_code_to_the_variant_load() {
    // An unassigned type code still probes; only a full load rejects it.
    let mut bytes = Header::new(TypeCode::Dense, 20).to_bytes().to_vec();
    bytes[16..20].copy_from_slice(&9u32.to_le_bytes());
    bytes.resize(32, 0);
    let image = AlignedBytes::copy_from_slice(&bytes);
    assert_eq!(probe(&image).unwrap().type_code, 9);
}

#[test]
fn probe_rejects_a_misaligned_buffer() {
    let image = AlignedBytes::copy_from_slice(&dense_image());
    assert!(matches!(
        probe(&image[1..]),
        Err(ImageError::Misaligned)
    ));
}

#[test]
fn probe_rejects_a_short_buffer() {
    let image = AlignedBytes::copy_from_slice(&dense_image()[..16]);
    assert!(matches!(probe(&image), Err(ImageError::Truncated)));
}
