//! Tagged scanner (image type 4).
//!
//! Dense per-(state, letter) jump and action tables plus per-state tags, the
//! shape a matching engine wants when transitions carry side effects. Arena
//! sections:
//!
//! ```text
//! letters  u32 × 256              byte value → letter class
//! jumps    u32 × states × letters byte offset of the target row,
//!                                 relative to the jump section base
//! actions  u32 × states × letters bit mask of pattern ids fired by the
//!                                 transition
//! tags     u16 × states           opaque per-state data; bit 0 = final
//! ```
//!
//! Unlike the dense variant, rows are relative to the jump section, not the
//! arena, so `Row(0)` is state 0.

use std::io::{Read, Write};

use sagitta_wire::{
    Header, ImageError, ImageReader, ImageWriter, MapCursor, Scalar, Table, TypeCode, align_up,
};

use crate::arena::Arena;
use crate::ids::{Row, StateId};
use crate::letters::{ALPHABET, LetterTable, LettersView};
use crate::settings::CELL_BYTES;

pub(crate) const LOCALS_LEN: u32 = 16;

/// Tag bit marking a final state.
pub const TAG_FINAL: u16 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Locals {
    states: u32,
    letters: u32,
    patterns: u32,
    /// Byte offset of the initial row, relative to the jump section.
    initial: u32,
}

impl Locals {
    fn to_bytes(self) -> [u8; LOCALS_LEN as usize] {
        let mut bytes = [0u8; LOCALS_LEN as usize];
        bytes[0..4].copy_from_slice(&self.states.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.letters.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.patterns.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.initial.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            states: u32::load(&bytes[0..]),
            letters: u32::load(&bytes[4..]),
            patterns: u32::load(&bytes[8..]),
            initial: u32::load(&bytes[12..]),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Layout {
    jumps: usize,
    actions: usize,
    tags: usize,
    total: usize,
}

impl Layout {
    const fn of(states: u32, letters: u32) -> Self {
        let cells = states as usize * letters as usize;
        let jumps = align_up(ALPHABET * CELL_BYTES);
        let actions = align_up(jumps + cells * CELL_BYTES);
        let tags = align_up(actions + cells * CELL_BYTES);
        let total = align_up(tags + states as usize * 2);
        Self {
            jumps,
            actions,
            tags,
            total,
        }
    }
}

/// Dense jump/action/tag scanner.
#[derive(Clone, Debug)]
pub struct TaggedScanner<B = Arena> {
    locals: Locals,
    layout: Layout,
    arena: B,
}

impl<B: AsRef<[u8]>> TaggedScanner<B> {
    pub fn states(&self) -> u32 {
        self.locals.states
    }

    pub fn letters(&self) -> u32 {
        self.locals.letters
    }

    pub fn patterns(&self) -> u32 {
        self.locals.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.locals.states == 0
    }

    fn bytes(&self) -> &[u8] {
        self.arena.as_ref()
    }

    fn letters_view(&self) -> LettersView<'_> {
        LettersView::new(&self.bytes()[..ALPHABET * CELL_BYTES])
    }

    fn tags(&self) -> Table<'_, u16> {
        let off = self.layout.tags;
        Table::new(&self.bytes()[off..off + self.locals.states as usize * 2])
    }

    fn row_bytes(&self) -> usize {
        self.locals.letters as usize * CELL_BYTES
    }

    pub fn letter_of(&self, byte: u8) -> u32 {
        self.letters_view().class_of(byte)
    }

    pub fn initial_row(&self) -> Row {
        assert!(!self.is_empty(), "empty scanner has no rows");
        Row(self.locals.initial)
    }

    pub fn next_row(&self, row: Row, byte: u8) -> Row {
        self.next_row_for_class(row, self.letter_of(byte))
    }

    /// Row the given row transitions to on any byte of `class`.
    pub fn next_row_for_class(&self, row: Row, class: u32) -> Row {
        debug_assert!(class < self.locals.letters);
        let off = self.layout.jumps + row.byte_offset() + class as usize * CELL_BYTES;
        Row(u32::load(&self.bytes()[off..]))
    }

    /// Pattern-id bit mask fired by taking the transition out of `row` on
    /// `byte`.
    pub fn action(&self, row: Row, byte: u8) -> u32 {
        self.action_for_class(row, self.letter_of(byte))
    }

    /// Action mask for the transition out of `row` on any byte of `class`.
    pub fn action_for_class(&self, row: Row, class: u32) -> u32 {
        debug_assert!(class < self.locals.letters);
        let off = self.layout.actions + row.byte_offset() + class as usize * CELL_BYTES;
        u32::load(&self.bytes()[off..])
    }

    /// Opaque per-state tag; see [`TAG_FINAL`].
    pub fn tag(&self, row: Row) -> u16 {
        self.tags().get(self.state_of(row).0 as usize)
    }

    pub fn is_final_row(&self, row: Row) -> bool {
        self.tag(row) & TAG_FINAL != 0
    }

    pub fn state_of(&self, row: Row) -> StateId {
        StateId((row.byte_offset() / self.row_bytes()) as u32)
    }

    pub fn row_of(&self, state: StateId) -> Row {
        debug_assert!(state.0 < self.locals.states);
        Row((state.0 as usize * self.row_bytes()) as u32)
    }

    /// (name, offset, byte length) of each arena section, for dumps.
    pub(crate) fn sections(&self) -> [(&'static str, usize, usize); 4] {
        let cells = self.locals.states as usize * self.locals.letters as usize;
        [
            ("letters", 0, ALPHABET * CELL_BYTES),
            ("jumps", self.layout.jumps, cells * CELL_BYTES),
            ("actions", self.layout.actions, cells * CELL_BYTES),
            ("tags", self.layout.tags, self.locals.states as usize * 2),
        ]
    }

    /// Serialize as a type-4 image.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<(), ImageError> {
        let mut w = ImageWriter::new(out);
        w.put_header(&Header::new(TypeCode::Tagged, LOCALS_LEN))?;
        w.put_bytes(&self.locals.to_bytes())?;
        w.pad()?;

        let bytes = self.bytes();
        let cells = self.locals.states as usize * self.locals.letters as usize;
        w.put_bytes(&bytes[..ALPHABET * CELL_BYTES])?;
        w.pad()?;
        w.put_bytes(&bytes[self.layout.jumps..self.layout.jumps + cells * CELL_BYTES])?;
        w.pad()?;
        w.put_bytes(&bytes[self.layout.actions..self.layout.actions + cells * CELL_BYTES])?;
        w.pad()?;
        w.put_bytes(&bytes[self.layout.tags..self.layout.tags + self.locals.states as usize * 2])?;
        w.pad()?;
        Ok(())
    }

    fn checked(locals: Locals, arena: B) -> Result<Self, ImageError> {
        if locals.states > 0 && (locals.letters == 0 || locals.letters as usize > ALPHABET) {
            return Err(ImageError::BadIndex { at: 0 });
        }
        let layout = Layout::of(locals.states, locals.letters);
        if arena.as_ref().len() != layout.total {
            return Err(ImageError::Truncated);
        }

        let scanner = Self {
            locals,
            layout,
            arena,
        };
        if locals.states == 0 {
            if locals.initial != 0 {
                return Err(ImageError::BadIndex { at: 0 });
            }
            return Ok(scanner);
        }

        scanner.letters_view().validate(locals.letters)?;
        scanner.check_row(locals.initial)?;
        let cells = locals.states as usize * locals.letters as usize;
        let jumps: Table<'_, u32> =
            Table::new(&scanner.bytes()[layout.jumps..layout.jumps + cells * CELL_BYTES]);
        for cell in jumps.iter() {
            scanner.check_row(cell)?;
        }
        Ok(scanner)
    }

    fn check_row(&self, offset: u32) -> Result<(), ImageError> {
        let offset = offset as usize;
        if !offset.is_multiple_of(self.row_bytes())
            || offset / self.row_bytes() >= self.locals.states as usize
        {
            return Err(ImageError::BadIndex { at: offset });
        }
        Ok(())
    }
}

impl TaggedScanner<Arena> {
    /// Assemble a scanner from compiler output.
    ///
    /// `jumps` and `actions` are row-major, `states × letters.class_count()`
    /// entries; `tags` has one entry per state.
    pub fn from_parts(
        letters: &LetterTable,
        jumps: &[StateId],
        actions: &[u32],
        tags: &[u16],
        initial: StateId,
    ) -> Self {
        let states = tags.len() as u32;
        let letter_count = letters.class_count();
        let cells = (states * letter_count) as usize;
        assert_eq!(jumps.len(), cells, "jump table shape mismatch");
        assert_eq!(actions.len(), cells, "action table shape mismatch");
        assert!(states == 0 || initial.0 < states, "initial state out of range");

        let patterns = actions
            .iter()
            .map(|&mask| 32 - mask.leading_zeros())
            .max()
            .unwrap_or(0);
        let layout = Layout::of(states, letter_count);
        let row_bytes = (letter_count as usize * CELL_BYTES) as u32;

        let mut arena = Arena::with_capacity(layout.total);
        letters.encode(&mut arena);
        arena.pad();
        for target in jumps {
            debug_assert!(target.0 < states);
            arena.put(target.0 * row_bytes);
        }
        arena.pad();
        for &mask in actions {
            arena.put(mask);
        }
        arena.pad();
        for &tag in tags {
            arena.put(tag);
        }
        arena.pad();
        debug_assert_eq!(arena.pos(), layout.total);

        Self {
            locals: Locals {
                states,
                letters: letter_count,
                patterns,
                initial: if states == 0 { 0 } else { initial.0 * row_bytes },
            },
            layout,
            arena,
        }
    }

    /// Stream-load a type-4 image into freshly allocated storage.
    pub fn load<R: Read>(input: &mut R) -> Result<Self, ImageError> {
        let mut r = ImageReader::new(input);
        r.take_header()?.validate_for(TypeCode::Tagged, LOCALS_LEN)?;

        let mut buf = [0u8; LOCALS_LEN as usize];
        r.take_bytes(&mut buf)?;
        r.skip_pad()?;
        let locals = Locals::from_bytes(&buf);
        if locals.states > 0 && (locals.letters == 0 || locals.letters as usize > ALPHABET) {
            return Err(ImageError::BadIndex { at: 0 });
        }

        let layout = Layout::of(locals.states, locals.letters);
        let cells = locals.states as usize * locals.letters as usize;
        let mut arena = Arena::with_capacity(layout.total);

        let mut section = vec![0u8; ALPHABET * CELL_BYTES];
        r.take_bytes(&mut section)?;
        r.skip_pad()?;
        arena.put_bytes(&section);
        arena.pad();

        section.resize(cells * CELL_BYTES, 0);
        r.take_bytes(&mut section)?;
        r.skip_pad()?;
        arena.put_bytes(&section);
        arena.pad();

        r.take_bytes(&mut section)?;
        r.skip_pad()?;
        arena.put_bytes(&section);
        arena.pad();

        section.resize(locals.states as usize * 2, 0);
        r.take_bytes(&mut section)?;
        r.skip_pad()?;
        arena.put_bytes(&section);
        arena.pad();

        debug_assert_eq!(arena.pos(), layout.total);
        Self::checked(locals, arena)
    }
}

impl Default for TaggedScanner<Arena> {
    fn default() -> Self {
        Self::from_parts(&LetterTable::identity(), &[], &[], &[], StateId(0))
    }
}

impl<'a> TaggedScanner<&'a [u8]> {
    /// Map a type-4 image in place. Returns the scanner and the bytes
    /// consumed.
    pub fn map(bytes: &'a [u8]) -> Result<(Self, usize), ImageError> {
        let mut c = MapCursor::new(bytes)?;
        c.take_header()?.validate_for(TypeCode::Tagged, LOCALS_LEN)?;

        let locals = Locals::from_bytes(c.take_span(LOCALS_LEN as usize)?);
        c.skip_pad()?;
        if locals.states > 0 && (locals.letters == 0 || locals.letters as usize > ALPHABET) {
            return Err(ImageError::BadIndex { at: 0 });
        }

        let layout = Layout::of(locals.states, locals.letters);
        let cells = locals.states as usize * locals.letters as usize;
        let start = c.consumed();
        c.take_span(ALPHABET * CELL_BYTES)?;
        c.skip_pad()?;
        c.take_span(cells * CELL_BYTES)?;
        c.skip_pad()?;
        c.take_span(cells * CELL_BYTES)?;
        c.skip_pad()?;
        c.take_span(locals.states as usize * 2)?;
        c.skip_pad()?;
        let arena = &bytes[start..c.consumed()];

        let scanner = Self::checked(locals, arena)?;
        Ok((scanner, c.consumed()))
    }
}
