use sagitta_wire::{AlignedBytes, ImageError};

use crate::test_utils::{dense_from, dfa_tables, run_dense, sample_inputs, table_match};
use crate::{ALPHABET, DenseScanner, LetterTable, PatternId, StateId};

/// 2 states, 2 letters (`a` vs everything else), state 1 accepts pattern 0.
fn tiny() -> DenseScanner {
    let mut classes = [0u32; ALPHABET];
    classes[b'a' as usize] = 1;
    let letters = LetterTable::from_classes(classes);
    let jumps = [StateId(0), StateId(1), StateId(0), StateId(1)];
    let accepts = [vec![], vec![PatternId(0)]];
    DenseScanner::from_parts(&letters, &jumps, &accepts, StateId(0))
}

fn saved(sc: &DenseScanner) -> Vec<u8> {
    let mut bytes = Vec::new();
    sc.save(&mut bytes).unwrap();
    bytes
}

#[test]
fn from_parts_exposes_the_counts() {
    let sc = tiny();
    assert_eq!(sc.states(), 2);
    assert_eq!(sc.letters(), 2);
    assert_eq!(sc.patterns(), 1);
    assert!(!sc.is_empty());
    assert_eq!(sc.letter_of(b'a'), 1);
    assert_eq!(sc.letter_of(b'z'), 0);
}

#[test]
fn rows_and_states_convert_both_ways() {
    let sc = tiny();
    for s in 0..sc.states() {
        let state = StateId(s);
        assert_eq!(sc.state_of(sc.row_of(state)), state);
    }
    assert_eq!(sc.state_of(sc.initial_row()), StateId(0));
}

#[test]
fn transitions_and_accepts_follow_the_tables() {
    let sc = tiny();
    let start = sc.initial_row();
    assert!(!sc.is_final_row(start));
    assert_eq!(sc.accepted(start).count(), 0);

    let after_a = sc.next_row(start, b'a');
    assert_eq!(sc.state_of(after_a), StateId(1));
    assert!(sc.is_final_row(after_a));
    assert_eq!(sc.accepted(after_a).collect::<Vec<_>>(), [PatternId(0)]);

    assert_eq!(sc.state_of(sc.next_row(after_a, b'x')), StateId(0));
}

#[test]
fn image_layout_starts_with_the_magic_and_locals() {
    let bytes = saved(&tiny());
    assert_eq!(&bytes[0..4], b"PIRE");
    assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 1);
    assert_eq!(u32::from_le_bytes(bytes[20..24].try_into().unwrap()), 20);
    // locals block at 32: states, letters
    assert_eq!(u32::from_le_bytes(bytes[32..36].try_into().unwrap()), 2);
    assert_eq!(u32::from_le_bytes(bytes[36..40].try_into().unwrap()), 2);
    // settings block at 64: cell width
    assert_eq!(u32::from_le_bytes(bytes[64..68].try_into().unwrap()), 4);
    // empty flag at 80
    assert_eq!(bytes[80], 0);
    assert_eq!(bytes.len() % 16, 0);
}

#[test]
fn stream_round_trip_preserves_behavior() {
    let t = dfa_tables("a(b|c)*d");
    let sc = dense_from(&t);
    let loaded = DenseScanner::load(&mut saved(&sc).as_slice()).unwrap();
    assert_eq!(loaded.states(), sc.states());
    for input in sample_inputs() {
        assert_eq!(run_dense(&loaded, input), table_match(&t, input));
    }
}

#[test]
fn map_borrows_without_copying() {
    let sc = tiny();
    let image = AlignedBytes::copy_from_slice(&saved(&sc));
    let (mapped, consumed) = DenseScanner::map(&image).unwrap();
    assert_eq!(consumed, image.len());
    assert_eq!(mapped.states(), 2);
    assert!(mapped.is_final_row(mapped.next_row(mapped.initial_row(), b'a')));
}

#[test]
fn mapped_behavior_is_independent_of_the_base_address() {
    let t = dfa_tables("(ab)+");
    let bytes = saved(&dense_from(&t));
    let first = AlignedBytes::copy_from_slice(&bytes);
    let second = AlignedBytes::copy_from_slice(&bytes);
    assert_ne!(first.as_slice().as_ptr(), second.as_slice().as_ptr());

    let (a, _) = DenseScanner::map(&first).unwrap();
    let (b, _) = DenseScanner::map(&second).unwrap();
    for input in sample_inputs() {
        assert_eq!(run_dense(&a, input), run_dense(&b, input));
        assert_eq!(run_dense(&a, input), table_match(&t, input));
    }
}

#[test]
fn round_trips_survive_a_jump_section_with_tail_padding() {
    // 3 states x 2 letters: 24 bytes of jump cells, padded to 32 on the
    // wire. The pad bytes must not be validated as cells.
    let mut classes = [0u32; ALPHABET];
    classes[b'a' as usize] = 1;
    let letters = LetterTable::from_classes(classes);
    let jumps = [
        StateId(0),
        StateId(1),
        StateId(0),
        StateId(2),
        StateId(0),
        StateId(1),
    ];
    let accepts = [vec![], vec![], vec![PatternId(0)]];
    let sc = DenseScanner::from_parts(&letters, &jumps, &accepts, StateId(0));

    let bytes = saved(&sc);
    let loaded = DenseScanner::load(&mut bytes.as_slice()).unwrap();
    let image = AlignedBytes::copy_from_slice(&bytes);
    let (mapped, consumed) = DenseScanner::map(&image).unwrap();
    assert_eq!(consumed, image.len());

    for (input, want) in [
        (b"aa".as_slice(), true),
        (b"a".as_slice(), false),
        (b"baa".as_slice(), true),
        (b"aab".as_slice(), false),
    ] {
        assert_eq!(run_dense(&loaded, input), want);
        assert_eq!(run_dense(&mapped, input), want);
    }
}

#[test]
fn absurd_locals_counts_are_rejected_not_allocated() {
    let mut bad = saved(&tiny());
    bad[32..36].copy_from_slice(&u32::MAX.to_le_bytes());
    bad[36..40].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(matches!(
        DenseScanner::load(&mut bad.as_slice()),
        Err(ImageError::BadIndex { at: 0 })
    ));
    let image = AlignedBytes::copy_from_slice(&bad);
    assert!(matches!(
        DenseScanner::map(&image),
        Err(ImageError::BadIndex { at: 0 })
    ));
}

#[test]
fn empty_scanner_round_trips_through_the_empty_flag() {
    let bytes = saved(&DenseScanner::empty());
    assert_eq!(bytes[80], 1);
    assert_eq!(bytes.len(), 96);

    let loaded = DenseScanner::load(&mut bytes.as_slice()).unwrap();
    assert!(loaded.is_empty());

    let image = AlignedBytes::copy_from_slice(&bytes);
    let (mapped, consumed) = DenseScanner::map(&image).unwrap();
    assert!(mapped.is_empty());
    assert_eq!(consumed, 96);
}

#[test]
fn shared_empty_is_the_default() {
    assert!(DenseScanner::shared_empty().is_empty());
    assert!(DenseScanner::default().is_empty());
    let shared = DenseScanner::shared_empty();
    assert!(std::ptr::eq(shared, DenseScanner::shared_empty()));
}

#[test]
fn corrupt_header_fields_are_rejected() {
    let good = saved(&tiny());

    let mut bad = good.clone();
    bad[0] = b'X';
    assert!(matches!(
        DenseScanner::load(&mut bad.as_slice()),
        Err(ImageError::BadMagic)
    ));

    let mut bad = good.clone();
    bad[4] = 9;
    assert!(matches!(
        DenseScanner::load(&mut bad.as_slice()),
        Err(ImageError::Version { found: 9 })
    ));

    let mut bad = good.clone();
    bad[16] = 3;
    assert!(matches!(
        DenseScanner::load(&mut bad.as_slice()),
        Err(ImageError::Type {
            expected: 1,
            found: 3
        })
    ));

    let mut bad = good.clone();
    bad[20] = 19;
    assert!(matches!(
        DenseScanner::load(&mut bad.as_slice()),
        Err(ImageError::Locals { expected: 20, .. })
    ));
}

#[test]
fn foreign_settings_are_a_platform_error() {
    let mut bad = saved(&tiny());
    bad[64] = 8;
    assert!(matches!(
        DenseScanner::load(&mut bad.as_slice()),
        Err(ImageError::Platform)
    ));
    let image = AlignedBytes::copy_from_slice(&bad);
    assert!(matches!(
        DenseScanner::map(&image),
        Err(ImageError::Platform)
    ));
}

#[test]
fn truncated_images_are_rejected_by_both_loads() {
    let bytes = saved(&tiny());
    let short = &bytes[..bytes.len() - 16];
    assert!(matches!(
        DenseScanner::load(&mut &short[..]),
        Err(ImageError::Truncated)
    ));
    let image = AlignedBytes::copy_from_slice(short);
    assert!(matches!(
        DenseScanner::map(&image),
        Err(ImageError::Truncated)
    ));
}

#[test]
fn a_jump_cell_that_is_not_a_row_start_is_rejected() {
    let mut bad = saved(&tiny());
    // first jump cell: arena base 96 + jumps section 1056
    bad[96 + 1056..96 + 1060].copy_from_slice(&1u32.to_le_bytes());
    assert!(matches!(
        DenseScanner::load(&mut bad.as_slice()),
        Err(ImageError::BadIndex { .. })
    ));
}

#[test]
fn a_missing_accept_terminator_is_rejected() {
    let mut bad = saved(&tiny());
    // last accept element: arena base 96 + accept section 1040 + 2 cells
    bad[96 + 1048..96 + 1052].copy_from_slice(&0u32.to_le_bytes());
    assert!(matches!(
        DenseScanner::load(&mut bad.as_slice()),
        Err(ImageError::BadIndex { .. })
    ));
}

#[test]
fn an_out_of_range_initial_row_is_rejected() {
    let mut bad = saved(&tiny());
    // locals.initial at 48: point past the arena
    bad[48..52].copy_from_slice(&0xFFF0u32.to_le_bytes());
    assert!(matches!(
        DenseScanner::load(&mut bad.as_slice()),
        Err(ImageError::BadIndex { .. })
    ));
}
