//! Test fixtures: derive scanner tables from a real DFA.
//!
//! `regex-automata` compiles a pattern to an anchored dense DFA; a BFS over
//! its public `Automaton` API flattens it into plain `states × 256` tables
//! every scanner variant can be assembled from. Matching a scanner against
//! the source tables then checks the whole codec path, not a hand-copied
//! expectation.

use std::collections::HashMap;

use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::{Anchored, Input};

use crate::{
    ALPHABET, DenseScanner, FlatScanner, LetterTable, PatternId, SparseScanner, StateId,
    TaggedScanner,
};

/// Flattened DFA: row-major `states × 256` jump table over raw bytes.
pub struct DfaTables {
    pub states: u32,
    pub jumps: Vec<StateId>,
    pub finals: Vec<bool>,
    pub initial: StateId,
}

/// Compile `pattern` and flatten the resulting anchored DFA.
pub fn dfa_tables(pattern: &str) -> DfaTables {
    let dfa = dense::Builder::new()
        .configure(dense::Config::new().start_kind(StartKind::Anchored))
        .build(pattern)
        .unwrap();
    let start = dfa
        .start_state_forward(&Input::new("").anchored(Anchored::Yes))
        .unwrap();

    let mut ids = vec![start];
    let mut index = HashMap::from([(start, 0u32)]);
    let mut jumps = Vec::new();
    let mut at = 0;
    while at < ids.len() {
        let sid = ids[at];
        for byte in 0..=255u8 {
            let next = dfa.next_state(sid, byte);
            let target = *index.entry(next).or_insert_with(|| {
                ids.push(next);
                (ids.len() - 1) as u32
            });
            jumps.push(StateId(target));
        }
        at += 1;
    }

    // A state accepts if feeding end-of-input from it lands on a match
    // state; that converts match-on-next-state semantics to per-state
    // finality.
    let finals = ids
        .iter()
        .map(|&sid| dfa.is_match_state(dfa.next_eoi_state(sid)))
        .collect();

    DfaTables {
        states: ids.len() as u32,
        jumps,
        finals,
        initial: StateId(0),
    }
}

/// Reference decision: does the whole input match, per the flattened
/// tables?
pub fn table_match(t: &DfaTables, input: &[u8]) -> bool {
    let mut state = t.initial.0 as usize;
    for &byte in input {
        state = t.jumps[state * ALPHABET + byte as usize].0 as usize;
    }
    t.finals[state]
}

/// Group bytes whose whole jump column is identical into letter classes.
pub fn classes_of(t: &DfaTables) -> LetterTable {
    let mut classes = [0u32; ALPHABET];
    let mut columns: Vec<Vec<StateId>> = Vec::new();
    for byte in 0..ALPHABET {
        let column: Vec<StateId> = (0..t.states as usize)
            .map(|s| t.jumps[s * ALPHABET + byte])
            .collect();
        classes[byte] = match columns.iter().position(|c| *c == column) {
            Some(k) => k as u32,
            None => {
                columns.push(column);
                (columns.len() - 1) as u32
            }
        };
    }
    LetterTable::from_classes(classes)
}

/// One representative byte per letter class.
fn class_reps(letters: &LetterTable) -> Vec<u8> {
    let mut reps = vec![0u8; letters.class_count() as usize];
    for byte in (0..ALPHABET as u32).rev() {
        reps[letters.class_of(byte as u8) as usize] = byte as u8;
    }
    reps
}

pub fn dense_from(t: &DfaTables) -> DenseScanner {
    let letters = classes_of(t);
    let reps = class_reps(&letters);
    let jumps: Vec<StateId> = (0..t.states as usize)
        .flat_map(|s| reps.iter().map(move |&b| (s, b)))
        .map(|(s, b)| t.jumps[s * ALPHABET + b as usize])
        .collect();
    let accepts: Vec<Vec<PatternId>> = t
        .finals
        .iter()
        .map(|&f| if f { vec![PatternId(0)] } else { vec![] })
        .collect();
    DenseScanner::from_parts(&letters, &jumps, &accepts, t.initial)
}

pub fn flat_from(t: &DfaTables) -> FlatScanner {
    FlatScanner::from_parts(&t.finals, &t.jumps, t.initial)
}

pub fn sparse_from(t: &DfaTables) -> SparseScanner {
    let letters = classes_of(t);
    let reps = class_reps(&letters);
    let lists: Vec<Vec<StateId>> = (0..t.states as usize)
        .flat_map(|s| reps.iter().map(move |&b| (s, b)))
        .map(|(s, b)| vec![t.jumps[s * ALPHABET + b as usize]])
        .collect();
    SparseScanner::from_parts(&letters, &t.finals, &lists, t.initial)
}

pub fn tagged_from(t: &DfaTables) -> TaggedScanner {
    let letters = classes_of(t);
    let reps = class_reps(&letters);
    let jumps: Vec<StateId> = (0..t.states as usize)
        .flat_map(|s| reps.iter().map(move |&b| (s, b)))
        .map(|(s, b)| t.jumps[s * ALPHABET + b as usize])
        .collect();
    let actions: Vec<u32> = jumps
        .iter()
        .map(|target| if t.finals[target.0 as usize] { 1 } else { 0 })
        .collect();
    let tags: Vec<u16> = t.finals.iter().map(|&f| f as u16).collect();
    TaggedScanner::from_parts(&letters, &jumps, &actions, &tags, t.initial)
}

/// Run a dense scanner over `input`, whole-match semantics.
pub fn run_dense<B: AsRef<[u8]>>(sc: &DenseScanner<B>, input: &[u8]) -> bool {
    if sc.is_empty() {
        return false;
    }
    let mut row = sc.initial_row();
    for &byte in input {
        row = sc.next_row(row, byte);
    }
    sc.is_final_row(row)
}

pub fn run_flat<B: AsRef<[u8]>>(sc: &FlatScanner<B>, input: &[u8]) -> bool {
    let mut row = sc.initial_row();
    for &byte in input {
        row = sc.next_row(row, byte);
    }
    sc.is_final_row(row)
}

/// NFA-style simulation: track the reachable state set.
pub fn run_sparse<B: AsRef<[u8]>>(sc: &SparseScanner<B>, input: &[u8]) -> bool {
    if sc.is_empty() {
        return false;
    }
    let mut current = vec![sc.initial()];
    for &byte in input {
        let mut next: Vec<StateId> = current
            .iter()
            .flat_map(|&s| sc.transitions(s, byte))
            .collect();
        next.sort_unstable();
        next.dedup();
        current = next;
    }
    current.iter().any(|&s| sc.is_final(s))
}

pub fn run_tagged<B: AsRef<[u8]>>(sc: &TaggedScanner<B>, input: &[u8]) -> bool {
    if sc.is_empty() {
        return false;
    }
    let mut row = sc.initial_row();
    for &byte in input {
        row = sc.next_row(row, byte);
    }
    sc.is_final_row(row)
}

/// Inputs the equivalence tests probe with.
pub fn sample_inputs() -> Vec<&'static [u8]> {
    vec![
        b"",
        b"a",
        b"b",
        b"ab",
        b"abc",
        b"abcd",
        b"abcabc",
        b"zzz",
        b"0",
        b"42",
        b"3.14",
        b"3.",
        b"hello world",
        b"\x00\xff\x80",
    ]
}
