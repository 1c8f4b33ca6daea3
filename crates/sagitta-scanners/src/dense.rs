//! Dense letter-classed scanner (image type 1).
//!
//! The workhorse multi-pattern DFA. One owned arena holds four sections:
//!
//! ```text
//! letters       u32 × 256              byte value → letter class
//! accept_index  u32 × states           element offset into accept
//! accept        u32 × accept_len       pattern ids, one run per state,
//!                                      each run 0xFFFF_FFFF-terminated
//! jumps         u32 × states × letters arena byte offset of the target row
//! ```
//!
//! A row is `letters` consecutive cells inside `jumps`; jump cells and the
//! `initial` locals field hold the arena offset of a row start, so the whole
//! arena is position-independent and an image can be mapped in place at any
//! address.

use std::io::{Read, Write};

use sagitta_wire::{
    Header, ImageError, ImageReader, ImageWriter, MapCursor, Scalar, Table, TypeCode, align_up,
};

use crate::arena::Arena;
use crate::ids::{PatternId, Row, StateId};
use crate::letters::{ALPHABET, LetterTable, LettersView};
use crate::settings::{ACCEPT_TERMINATOR, CELL_BYTES, Settings};

pub(crate) const LOCALS_LEN: u32 = 20;

/// Fixed per-image metadata, 20 bytes on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Locals {
    states: u32,
    letters: u32,
    patterns: u32,
    accept_len: u32,
    /// Arena byte offset of the initial state's row.
    initial: u32,
}

impl Locals {
    fn to_bytes(self) -> [u8; LOCALS_LEN as usize] {
        let mut bytes = [0u8; LOCALS_LEN as usize];
        bytes[0..4].copy_from_slice(&self.states.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.letters.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.patterns.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.accept_len.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.initial.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            states: u32::load(&bytes[0..]),
            letters: u32::load(&bytes[4..]),
            patterns: u32::load(&bytes[8..]),
            accept_len: u32::load(&bytes[12..]),
            initial: u32::load(&bytes[16..]),
        }
    }
}

/// Section offsets within the arena, derived from the counts.
/// The letters section is always at offset 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Layout {
    accept_index: usize,
    accept: usize,
    jumps: usize,
    total: usize,
}

impl Layout {
    const EMPTY: Layout = Layout {
        accept_index: 0,
        accept: 0,
        jumps: 0,
        total: 0,
    };

    const fn of(states: u32, letters: u32, accept_len: u32) -> Self {
        let accept_index = align_up(ALPHABET * CELL_BYTES);
        let accept = align_up(accept_index + states as usize * CELL_BYTES);
        let jumps = align_up(accept + accept_len as usize * CELL_BYTES);
        let total = align_up(jumps + states as usize * letters as usize * CELL_BYTES);
        Self {
            accept_index,
            accept,
            jumps,
            total,
        }
    }
}

/// Letter-classed multi-pattern scanner.
///
/// `B` is the arena storage: [`Arena`] for owned scanners (built or stream
/// loaded), `&[u8]` for scanners mapped over a resident image. Accessors are
/// shared between the two through `AsRef<[u8]>`.
#[derive(Clone, Debug)]
pub struct DenseScanner<B = Arena> {
    locals: Locals,
    layout: Layout,
    arena: B,
}

impl<B: AsRef<[u8]>> DenseScanner<B> {
    pub fn states(&self) -> u32 {
        self.locals.states
    }

    pub fn letters(&self) -> u32 {
        self.locals.letters
    }

    pub fn patterns(&self) -> u32 {
        self.locals.patterns
    }

    /// An empty scanner has no arena and matches nothing.
    pub fn is_empty(&self) -> bool {
        self.locals.states == 0
    }

    fn bytes(&self) -> &[u8] {
        self.arena.as_ref()
    }

    fn letters_view(&self) -> LettersView<'_> {
        LettersView::new(&self.bytes()[..ALPHABET * CELL_BYTES])
    }

    fn accept_index(&self) -> Table<'_, u32> {
        let off = self.layout.accept_index;
        Table::new(&self.bytes()[off..off + self.locals.states as usize * CELL_BYTES])
    }

    fn accept(&self) -> Table<'_, u32> {
        let off = self.layout.accept;
        Table::new(&self.bytes()[off..off + self.locals.accept_len as usize * CELL_BYTES])
    }

    fn row_bytes(&self) -> usize {
        self.locals.letters as usize * CELL_BYTES
    }

    pub fn letter_of(&self, byte: u8) -> u32 {
        self.letters_view().class_of(byte)
    }

    /// Row of the initial state.
    pub fn initial_row(&self) -> Row {
        assert!(!self.is_empty(), "empty scanner has no rows");
        Row(self.locals.initial)
    }

    /// Row the given row transitions to on `byte`.
    pub fn next_row(&self, row: Row, byte: u8) -> Row {
        self.next_row_for_class(row, self.letter_of(byte))
    }

    /// Row the given row transitions to on any byte of `class`.
    pub fn next_row_for_class(&self, row: Row, class: u32) -> Row {
        debug_assert!(class < self.locals.letters);
        let off = row.byte_offset() + class as usize * CELL_BYTES;
        Row(u32::load(&self.bytes()[off..]))
    }

    /// State index a row belongs to.
    pub fn state_of(&self, row: Row) -> StateId {
        StateId(((row.byte_offset() - self.layout.jumps) / self.row_bytes()) as u32)
    }

    /// Row of a state.
    pub fn row_of(&self, state: StateId) -> Row {
        debug_assert!(state.0 < self.locals.states);
        Row((self.layout.jumps + state.0 as usize * self.row_bytes()) as u32)
    }

    /// Patterns accepted in the given row, in run order.
    pub fn accepted(&self, row: Row) -> impl Iterator<Item = PatternId> + '_ {
        let accept = self.accept();
        let mut at = self.accept_index().get(self.state_of(row).0 as usize) as usize;
        std::iter::from_fn(move || {
            let value = accept.get(at);
            if value == ACCEPT_TERMINATOR {
                None
            } else {
                at += 1;
                Some(PatternId(value))
            }
        })
    }

    pub fn is_final_row(&self, row: Row) -> bool {
        self.accepted(row).next().is_some()
    }

    /// (name, offset, byte length) of each arena section, for dumps.
    pub(crate) fn sections(&self) -> [(&'static str, usize, usize); 4] {
        let cells = self.locals.states as usize * self.locals.letters as usize;
        [
            ("letters", 0, ALPHABET * CELL_BYTES),
            (
                "accept_index",
                self.layout.accept_index,
                self.locals.states as usize * CELL_BYTES,
            ),
            (
                "accept",
                self.layout.accept,
                self.locals.accept_len as usize * CELL_BYTES,
            ),
            ("jumps", self.layout.jumps, cells * CELL_BYTES),
        ]
    }

    /// Serialize as a type-1 image.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<(), ImageError> {
        let mut w = ImageWriter::new(out);
        w.put_header(&Header::new(TypeCode::Dense, LOCALS_LEN))?;
        w.put_bytes(&self.locals.to_bytes())?;
        w.pad()?;
        w.put_bytes(&Settings::required().to_bytes())?;
        w.pad()?;
        w.put(self.is_empty() as u8)?;
        w.pad()?;
        if !self.is_empty() {
            w.put_bytes(self.bytes())?;
            w.pad()?;
        }
        Ok(())
    }

    /// Validate locals + arena and assemble a scanner. Shared by the stream
    /// and map loads; nothing observable is built unless every check passes.
    fn checked(locals: Locals, arena: B) -> Result<Self, ImageError> {
        if locals.states == 0 || locals.letters == 0 || locals.letters as usize > ALPHABET {
            return Err(ImageError::BadIndex { at: 0 });
        }
        let layout = Layout::of(locals.states, locals.letters, locals.accept_len);
        if arena.as_ref().len() != layout.total {
            return Err(ImageError::Truncated);
        }

        let scanner = Self {
            locals,
            layout,
            arena,
        };
        scanner.letters_view().validate(locals.letters)?;
        scanner.check_row(locals.initial)?;

        // Every jump cell must name a row start. The section may carry tail
        // padding up to layout.total; pad bytes are not cells.
        let cells = locals.states as usize * locals.letters as usize;
        let jumps: Table<'_, u32> =
            Table::new(&scanner.bytes()[layout.jumps..layout.jumps + cells * CELL_BYTES]);
        for cell in jumps.iter() {
            scanner.check_row(cell)?;
        }

        // Accept runs: in-range starts, a terminator closing the section,
        // pattern ids below the declared count.
        let accept = scanner.accept();
        if locals.accept_len == 0 || accept.get(locals.accept_len as usize - 1) != ACCEPT_TERMINATOR
        {
            return Err(ImageError::BadIndex {
                at: locals.accept_len.saturating_sub(1) as usize,
            });
        }
        for (at, start) in scanner.accept_index().iter().enumerate() {
            if start >= locals.accept_len {
                return Err(ImageError::BadIndex { at });
            }
        }
        for (at, value) in accept.iter().enumerate() {
            if value != ACCEPT_TERMINATOR && value >= locals.patterns {
                return Err(ImageError::BadIndex { at });
            }
        }

        Ok(scanner)
    }

    fn check_row(&self, offset: u32) -> Result<(), ImageError> {
        let offset = offset as usize;
        let in_section = offset >= self.layout.jumps && offset < self.layout.total;
        if !in_section || !(offset - self.layout.jumps).is_multiple_of(self.row_bytes()) {
            return Err(ImageError::BadIndex { at: offset });
        }
        let state = (offset - self.layout.jumps) / self.row_bytes();
        if state >= self.locals.states as usize {
            return Err(ImageError::BadIndex { at: offset });
        }
        Ok(())
    }
}

impl DenseScanner<Arena> {
    /// The empty scanner: no states, no arena.
    pub const fn empty() -> Self {
        Self {
            locals: Locals {
                states: 0,
                letters: 0,
                patterns: 0,
                accept_len: 0,
                initial: 0,
            },
            layout: Layout::EMPTY,
            arena: Arena::new(),
        }
    }

    /// Process-wide empty scanner, shared by reference instead of allocated
    /// per caller.
    pub fn shared_empty() -> &'static Self {
        static EMPTY: DenseScanner = DenseScanner::empty();
        &EMPTY
    }

    /// Assemble a scanner from compiler output.
    ///
    /// `jumps` is row-major, `states × letters.class_count()` target states;
    /// `accepts` lists the accepted patterns per state.
    pub fn from_parts(
        letters: &LetterTable,
        jumps: &[StateId],
        accepts: &[Vec<PatternId>],
        initial: StateId,
    ) -> Self {
        let states = accepts.len() as u32;
        let letter_count = letters.class_count();
        assert!(states > 0, "use DenseScanner::empty() for zero states");
        assert_eq!(
            jumps.len(),
            (states * letter_count) as usize,
            "jump table shape mismatch"
        );
        assert!(initial.0 < states, "initial state out of range");

        let accept_len: u32 = accepts.iter().map(|run| run.len() as u32 + 1).sum();
        let patterns = accepts
            .iter()
            .flatten()
            .map(|p| p.0 + 1)
            .max()
            .unwrap_or(0);
        let layout = Layout::of(states, letter_count, accept_len);
        let row_bytes = (letter_count as usize * CELL_BYTES) as u32;

        let mut arena = Arena::with_capacity(layout.total);
        letters.encode(&mut arena);
        arena.pad();
        let mut run_start = 0u32;
        for run in accepts {
            arena.put(run_start);
            run_start += run.len() as u32 + 1;
        }
        arena.pad();
        for run in accepts {
            for pattern in run {
                arena.put(pattern.0);
            }
            arena.put(ACCEPT_TERMINATOR);
        }
        arena.pad();
        for target in jumps {
            debug_assert!(target.0 < states);
            arena.put(layout.jumps as u32 + target.0 * row_bytes);
        }
        arena.pad();
        debug_assert_eq!(arena.pos(), layout.total);

        Self {
            locals: Locals {
                states,
                letters: letter_count,
                patterns,
                accept_len,
                initial: layout.jumps as u32 + initial.0 * row_bytes,
            },
            layout,
            arena,
        }
    }

    /// Stream-load a type-1 image into freshly allocated storage.
    pub fn load<R: Read>(input: &mut R) -> Result<Self, ImageError> {
        let mut r = ImageReader::new(input);
        r.take_header()?.validate_for(TypeCode::Dense, LOCALS_LEN)?;

        let mut buf = [0u8; LOCALS_LEN as usize];
        r.take_bytes(&mut buf)?;
        r.skip_pad()?;
        let locals = Locals::from_bytes(&buf);

        let mut settings = [0u8; Settings::WIRE_LEN];
        r.take_bytes(&mut settings)?;
        r.skip_pad()?;
        Settings::from_bytes(&settings).check()?;

        let empty: u8 = r.take()?;
        r.skip_pad()?;
        if empty != 0 {
            return Ok(Self::empty());
        }
        // Counts bound the layout arithmetic and the allocation below; they
        // must be sane before either happens.
        if locals.states == 0 || locals.letters == 0 || locals.letters as usize > ALPHABET {
            return Err(ImageError::BadIndex { at: 0 });
        }

        let layout = Layout::of(locals.states, locals.letters, locals.accept_len);
        let mut bytes = vec![0u8; layout.total];
        r.take_bytes(&mut bytes)?;
        r.skip_pad()?;
        Self::checked(locals, Arena::from_vec(bytes))
    }
}

impl Default for DenseScanner<Arena> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> DenseScanner<&'a [u8]> {
    /// Map a type-1 image in place, without copying the arena.
    ///
    /// Returns the scanner and the number of bytes consumed, so several
    /// images can be chained in one buffer. The scanner borrows `bytes` for
    /// its lifetime and never writes through it.
    pub fn map(bytes: &'a [u8]) -> Result<(Self, usize), ImageError> {
        let mut c = MapCursor::new(bytes)?;
        c.take_header()?.validate_for(TypeCode::Dense, LOCALS_LEN)?;

        let locals = Locals::from_bytes(c.take_span(LOCALS_LEN as usize)?);
        c.skip_pad()?;
        Settings::from_bytes(c.take_span(Settings::WIRE_LEN)?).check()?;
        c.skip_pad()?;
        let empty: u8 = c.take()?;
        c.skip_pad()?;

        if empty != 0 {
            let scanner = Self {
                locals: Locals::default(),
                layout: Layout::EMPTY,
                arena: &bytes[..0],
            };
            return Ok((scanner, c.consumed()));
        }
        if locals.states == 0 || locals.letters == 0 || locals.letters as usize > ALPHABET {
            return Err(ImageError::BadIndex { at: 0 });
        }

        let layout = Layout::of(locals.states, locals.letters, locals.accept_len);
        let arena = c.take_span(layout.total)?;
        c.skip_pad()?;
        let scanner = Self::checked(locals, arena)?;
        Ok((scanner, c.consumed()))
    }
}
