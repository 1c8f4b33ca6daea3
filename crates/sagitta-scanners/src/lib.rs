//! Compiled text scanners and their image codecs.
//!
//! A scanner is a compiled finite-state automaton over bytes. This crate
//! never computes matches against a pattern language; it owns the automaton
//! tables, persists them as portable images (see `sagitta-wire` for the
//! framing) and reconstructs them either by streaming copy or by zero-copy
//! mapping over a resident buffer.
//!
//! Four variants, one per image type code:
//! - [`DenseScanner`]: letter-classed multi-pattern DFA (type 1);
//! - [`FlatScanner`]: single-pattern DFA over raw bytes (type 2);
//! - [`SparseScanner`]: CSR transition lists, NFA-capable (type 3);
//! - [`TaggedScanner`]: dense jump/action/tag tables (type 4).
//!
//! Every variant stores intra-table references as integer byte offsets, so
//! the same image bytes work at any load address. Loads build a complete
//! value before returning it: a failed load is an `Err`, never a
//! half-initialized scanner.

mod arena;
mod dense;
mod dump;
mod flat;
mod ids;
mod letters;
mod probe;
mod settings;
mod sparse;
mod tagged;

pub use arena::Arena;
pub use dense::DenseScanner;
pub use dump::dump;
pub use flat::FlatScanner;
pub use ids::{PatternId, Row, StateId};
pub use letters::{ALPHABET, LetterTable, LettersView};
pub use probe::{probe, probe_reader};
pub use settings::{ACCEPT_TERMINATOR, Settings};
pub use sparse::SparseScanner;
pub use tagged::{TAG_FINAL, TaggedScanner};

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod dense_tests;
#[cfg(test)]
mod probe_tests;
