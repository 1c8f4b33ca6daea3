//! Flat single-pattern scanner (image type 2).
//!
//! The no-frills variant: no letter classes, one jump row of 256 cells per
//! state, a finality flag per state. Arena sections:
//!
//! ```text
//! finals  u32 × states        0 or 1
//! jumps   u32 × states × 256  arena byte offset of the target row
//! ```
//!
//! An empty flat scanner has no wire representation; [`FlatScanner::save`]
//! refuses it with [`ImageError::EmptyScanner`].

use std::io::{Read, Write};

use sagitta_wire::{
    Header, ImageError, ImageReader, ImageWriter, MapCursor, Scalar, Table, TypeCode, align_up,
};

use crate::arena::Arena;
use crate::ids::{Row, StateId};
use crate::letters::ALPHABET;
use crate::settings::CELL_BYTES;

pub(crate) const LOCALS_LEN: u32 = 8;

const ROW_BYTES: usize = ALPHABET * CELL_BYTES;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Locals {
    states: u32,
    /// Arena byte offset of the initial state's row.
    initial: u32,
}

impl Locals {
    fn to_bytes(self) -> [u8; LOCALS_LEN as usize] {
        let mut bytes = [0u8; LOCALS_LEN as usize];
        bytes[0..4].copy_from_slice(&self.states.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.initial.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            states: u32::load(&bytes[0..]),
            initial: u32::load(&bytes[4..]),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Layout {
    jumps: usize,
    total: usize,
}

impl Layout {
    const fn of(states: u32) -> Self {
        let jumps = align_up(states as usize * CELL_BYTES);
        let total = align_up(jumps + states as usize * ROW_BYTES);
        Self { jumps, total }
    }
}

/// Single-pattern scanner over raw bytes.
#[derive(Clone, Debug)]
pub struct FlatScanner<B = Arena> {
    locals: Locals,
    layout: Layout,
    arena: B,
}

impl<B: AsRef<[u8]>> FlatScanner<B> {
    pub fn states(&self) -> u32 {
        self.locals.states
    }

    /// A default-constructed scanner awaiting its first load.
    pub fn is_empty(&self) -> bool {
        self.locals.states == 0
    }

    fn bytes(&self) -> &[u8] {
        self.arena.as_ref()
    }

    fn finals(&self) -> Table<'_, u32> {
        Table::new(&self.bytes()[..self.locals.states as usize * CELL_BYTES])
    }

    pub fn initial_row(&self) -> Row {
        assert!(!self.is_empty(), "empty scanner has no rows");
        Row(self.locals.initial)
    }

    pub fn next_row(&self, row: Row, byte: u8) -> Row {
        let off = row.byte_offset() + byte as usize * CELL_BYTES;
        Row(u32::load(&self.bytes()[off..]))
    }

    pub fn state_of(&self, row: Row) -> StateId {
        StateId(((row.byte_offset() - self.layout.jumps) / ROW_BYTES) as u32)
    }

    pub fn row_of(&self, state: StateId) -> Row {
        debug_assert!(state.0 < self.locals.states);
        Row((self.layout.jumps + state.0 as usize * ROW_BYTES) as u32)
    }

    pub fn is_final_row(&self, row: Row) -> bool {
        self.finals().get(self.state_of(row).0 as usize) != 0
    }

    /// (name, offset, byte length) of each arena section, for dumps.
    pub(crate) fn sections(&self) -> [(&'static str, usize, usize); 2] {
        [
            ("finals", 0, self.locals.states as usize * CELL_BYTES),
            (
                "jumps",
                self.layout.jumps,
                self.locals.states as usize * ROW_BYTES,
            ),
        ]
    }

    /// Serialize as a type-2 image.
    ///
    /// Unlike the dense variant there is no empty flag on the wire; saving
    /// an empty instance is an error, not an empty image.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<(), ImageError> {
        if self.is_empty() {
            return Err(ImageError::EmptyScanner);
        }
        let mut w = ImageWriter::new(out);
        w.put_header(&Header::new(TypeCode::Flat, LOCALS_LEN))?;
        w.put_bytes(&self.locals.to_bytes())?;
        w.pad()?;
        w.put_bytes(self.bytes())?;
        w.pad()?;
        Ok(())
    }

    fn checked(locals: Locals, arena: B) -> Result<Self, ImageError> {
        if locals.states == 0 {
            return Err(ImageError::EmptyScanner);
        }
        let layout = Layout::of(locals.states);
        if arena.as_ref().len() != layout.total {
            return Err(ImageError::Truncated);
        }

        let scanner = Self {
            locals,
            layout,
            arena,
        };
        for (at, flag) in scanner.finals().iter().enumerate() {
            if flag > 1 {
                return Err(ImageError::BadIndex { at });
            }
        }
        scanner.check_row(locals.initial)?;
        let jumps: Table<'_, u32> = Table::new(&scanner.bytes()[layout.jumps..layout.total]);
        for cell in jumps.iter() {
            scanner.check_row(cell)?;
        }
        Ok(scanner)
    }

    fn check_row(&self, offset: u32) -> Result<(), ImageError> {
        let offset = offset as usize;
        let in_section = offset >= self.layout.jumps && offset < self.layout.total;
        if !in_section
            || !(offset - self.layout.jumps).is_multiple_of(ROW_BYTES)
            || (offset - self.layout.jumps) / ROW_BYTES >= self.locals.states as usize
        {
            return Err(ImageError::BadIndex { at: offset });
        }
        Ok(())
    }
}

impl FlatScanner<Arena> {
    /// Placeholder instance; any save attempt fails with
    /// [`ImageError::EmptyScanner`] until a real scanner is loaded into it.
    pub const fn empty() -> Self {
        Self {
            locals: Locals {
                states: 0,
                initial: 0,
            },
            layout: Layout { jumps: 0, total: 0 },
            arena: Arena::new(),
        }
    }

    /// Assemble a scanner from compiler output. `jumps` is row-major,
    /// `states × 256` target states.
    pub fn from_parts(finals: &[bool], jumps: &[StateId], initial: StateId) -> Self {
        let states = finals.len() as u32;
        assert!(states > 0, "flat scanner cannot be empty");
        assert_eq!(
            jumps.len(),
            states as usize * ALPHABET,
            "jump table shape mismatch"
        );
        assert!(initial.0 < states, "initial state out of range");

        let layout = Layout::of(states);
        let mut arena = Arena::with_capacity(layout.total);
        for &f in finals {
            arena.put(f as u32);
        }
        arena.pad();
        for target in jumps {
            debug_assert!(target.0 < states);
            arena.put((layout.jumps + target.0 as usize * ROW_BYTES) as u32);
        }
        arena.pad();
        debug_assert_eq!(arena.pos(), layout.total);

        Self {
            locals: Locals {
                states,
                initial: (layout.jumps + initial.0 as usize * ROW_BYTES) as u32,
            },
            layout,
            arena,
        }
    }

    /// Stream-load a type-2 image into freshly allocated storage.
    pub fn load<R: Read>(input: &mut R) -> Result<Self, ImageError> {
        let mut r = ImageReader::new(input);
        r.take_header()?.validate_for(TypeCode::Flat, LOCALS_LEN)?;

        let mut buf = [0u8; LOCALS_LEN as usize];
        r.take_bytes(&mut buf)?;
        r.skip_pad()?;
        let locals = Locals::from_bytes(&buf);
        if locals.states == 0 {
            return Err(ImageError::EmptyScanner);
        }

        let layout = Layout::of(locals.states);
        let mut bytes = vec![0u8; layout.total];
        r.take_bytes(&mut bytes)?;
        r.skip_pad()?;
        Self::checked(locals, Arena::from_vec(bytes))
    }
}

impl Default for FlatScanner<Arena> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> FlatScanner<&'a [u8]> {
    /// Map a type-2 image in place. Returns the scanner and the bytes
    /// consumed.
    pub fn map(bytes: &'a [u8]) -> Result<(Self, usize), ImageError> {
        let mut c = MapCursor::new(bytes)?;
        c.take_header()?.validate_for(TypeCode::Flat, LOCALS_LEN)?;

        let locals = Locals::from_bytes(c.take_span(LOCALS_LEN as usize)?);
        c.skip_pad()?;
        if locals.states == 0 {
            return Err(ImageError::EmptyScanner);
        }

        let layout = Layout::of(locals.states);
        let arena = c.take_span(layout.total)?;
        c.skip_pad()?;
        let scanner = Self::checked(locals, arena)?;
        Ok((scanner, c.consumed()))
    }
}
