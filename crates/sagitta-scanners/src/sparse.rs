//! Sparse CSR scanner (image type 3).
//!
//! Stores, per (state, letter) pair, a variable-length list of target
//! states, which makes it the only variant that can carry a
//! nondeterministic automaton. The lists are kept in compressed sparse row
//! form (a cumulative index plus one concatenated payload), so empty lists
//! cost eight bytes of index and nothing else. Arena sections:
//!
//! ```text
//! letters  u32 × 256                      byte value → letter class
//! finals   u8  × states
//! index    u64 × (states × letters + 1)   entry k = total elements of
//!                                         lists 0..k; entry 0 = 0
//! payload  u32 × index[last]              non-empty lists, concatenated
//! ```
//!
//! List `(state, letter)` is `payload[index[k]..index[k + 1]]` with
//! `k = state × letters + letter`. The index is not trusted on load: it
//! must start at zero and be non-decreasing, and the payload block is sized
//! by its final entry.

use std::io::{Read, Write};

use sagitta_wire::{
    Header, ImageError, ImageReader, ImageWriter, MapCursor, Scalar, Table, TypeCode, align_up,
};

use crate::arena::Arena;
use crate::ids::StateId;
use crate::letters::{ALPHABET, LetterTable, LettersView};
use crate::settings::CELL_BYTES;

pub(crate) const LOCALS_LEN: u32 = 12;

const INDEX_BYTES: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Locals {
    states: u32,
    letters: u32,
    /// Plain state id; nothing to relocate in this variant.
    initial: u32,
}

impl Locals {
    fn to_bytes(self) -> [u8; LOCALS_LEN as usize] {
        let mut bytes = [0u8; LOCALS_LEN as usize];
        bytes[0..4].copy_from_slice(&self.states.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.letters.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.initial.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            states: u32::load(&bytes[0..]),
            letters: u32::load(&bytes[4..]),
            initial: u32::load(&bytes[8..]),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Layout {
    finals: usize,
    index: usize,
    payload: usize,
    total: usize,
}

impl Layout {
    /// `total_elements` is the payload length in elements, i.e. the final
    /// index entry.
    const fn of(states: u32, letters: u32, total_elements: u64) -> Self {
        let lists = states as usize * letters as usize;
        let finals = align_up(ALPHABET * CELL_BYTES);
        let index = align_up(finals + states as usize);
        let payload = align_up(index + (lists + 1) * INDEX_BYTES);
        let total = align_up(payload + total_elements as usize * CELL_BYTES);
        Self {
            finals,
            index,
            payload,
            total,
        }
    }
}

/// CSR transition-list scanner.
#[derive(Clone, Debug)]
pub struct SparseScanner<B = Arena> {
    locals: Locals,
    layout: Layout,
    storage: B,
}

impl<B: AsRef<[u8]>> SparseScanner<B> {
    pub fn states(&self) -> u32 {
        self.locals.states
    }

    pub fn letters(&self) -> u32 {
        self.locals.letters
    }

    pub fn is_empty(&self) -> bool {
        self.locals.states == 0
    }

    pub fn initial(&self) -> StateId {
        StateId(self.locals.initial)
    }

    fn bytes(&self) -> &[u8] {
        self.storage.as_ref()
    }

    fn letters_view(&self) -> LettersView<'_> {
        LettersView::new(&self.bytes()[..ALPHABET * CELL_BYTES])
    }

    fn index(&self) -> Table<'_, u64> {
        let lists = self.locals.states as usize * self.locals.letters as usize;
        let off = self.layout.index;
        Table::new(&self.bytes()[off..off + (lists + 1) * INDEX_BYTES])
    }

    fn payload(&self) -> Table<'_, u32> {
        let lists = self.locals.states as usize * self.locals.letters as usize;
        let len = self.index().get(lists) as usize * CELL_BYTES;
        let off = self.layout.payload;
        Table::new(&self.bytes()[off..off + len])
    }

    pub fn letter_of(&self, byte: u8) -> u32 {
        self.letters_view().class_of(byte)
    }

    pub fn is_final(&self, state: StateId) -> bool {
        assert!(state.0 < self.locals.states, "state out of range");
        self.bytes()[self.layout.finals + state.0 as usize] != 0
    }

    /// Target states reachable from `state` on `byte`.
    pub fn transitions(&self, state: StateId, byte: u8) -> impl Iterator<Item = StateId> + '_ {
        self.transitions_for_class(state, self.letter_of(byte))
    }

    /// Target states reachable from `state` on any byte of `class`.
    pub fn transitions_for_class(
        &self,
        state: StateId,
        class: u32,
    ) -> impl Iterator<Item = StateId> + '_ {
        assert!(state.0 < self.locals.states, "state out of range");
        assert!(class < self.locals.letters, "class out of range");
        let k = (state.0 * self.locals.letters + class) as usize;
        let index = self.index();
        let payload = self.payload();
        let start = index.get(k) as usize;
        let end = index.get(k + 1) as usize;
        (start..end).map(move |i| StateId(payload.get(i)))
    }

    /// (name, offset, byte length) of each storage section, for dumps.
    pub(crate) fn sections(&self) -> [(&'static str, usize, usize); 4] {
        let lists = self.locals.states as usize * self.locals.letters as usize;
        [
            ("letters", 0, ALPHABET * CELL_BYTES),
            ("finals", self.layout.finals, self.locals.states as usize),
            ("index", self.layout.index, (lists + 1) * INDEX_BYTES),
            (
                "payload",
                self.layout.payload,
                self.index().get(lists) as usize * CELL_BYTES,
            ),
        ]
    }

    /// Serialize as a type-3 image.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<(), ImageError> {
        let mut w = ImageWriter::new(out);
        w.put_header(&Header::new(TypeCode::Sparse, LOCALS_LEN))?;
        w.put_bytes(&self.locals.to_bytes())?;
        w.pad()?;

        let bytes = self.bytes();
        let lists = self.locals.states as usize * self.locals.letters as usize;
        w.put_bytes(&bytes[..ALPHABET * CELL_BYTES])?;
        w.pad()?;
        w.put_bytes(&bytes[self.layout.finals..self.layout.finals + self.locals.states as usize])?;
        w.pad()?;
        w.put_bytes(&bytes[self.layout.index..self.layout.index + (lists + 1) * INDEX_BYTES])?;
        w.pad()?;
        let payload_len = self.index().get(lists) as usize * CELL_BYTES;
        w.put_bytes(&bytes[self.layout.payload..self.layout.payload + payload_len])?;
        w.pad()?;
        Ok(())
    }

    fn checked(locals: Locals, total_elements: u64, storage: B) -> Result<Self, ImageError> {
        if locals.states > 0 && (locals.letters == 0 || locals.letters as usize > ALPHABET) {
            return Err(ImageError::BadIndex { at: 0 });
        }
        let layout = Layout::of(locals.states, locals.letters, total_elements);
        if storage.as_ref().len() != layout.total {
            return Err(ImageError::Truncated);
        }

        let scanner = Self {
            locals,
            layout,
            storage,
        };

        // The cumulative index is attacker-controlled input: verify it
        // starts at zero and never decreases before anything dereferences
        // it.
        let index = scanner.index();
        if index.get(0) != 0 {
            return Err(ImageError::BadIndex { at: 0 });
        }
        let mut prev = 0u64;
        for (at, value) in index.iter().enumerate() {
            if value < prev {
                return Err(ImageError::BadIndex { at });
            }
            prev = value;
        }
        debug_assert_eq!(prev, total_elements);

        if locals.states == 0 {
            if locals.initial != 0 {
                return Err(ImageError::BadIndex { at: 0 });
            }
            return Ok(scanner);
        }
        if locals.initial >= locals.states {
            return Err(ImageError::BadIndex {
                at: locals.initial as usize,
            });
        }
        scanner.letters_view().validate(locals.letters)?;
        for (at, target) in scanner.payload().iter().enumerate() {
            if target >= locals.states {
                return Err(ImageError::BadIndex { at });
            }
        }
        Ok(scanner)
    }
}

impl SparseScanner<Arena> {
    /// Assemble a scanner from compiler output.
    ///
    /// `lists` holds the per-(state, letter) target lists in row-major
    /// order, `finals.len() × letters.class_count()` of them.
    pub fn from_parts(
        letters: &LetterTable,
        finals: &[bool],
        lists: &[Vec<StateId>],
        initial: StateId,
    ) -> Self {
        let states = finals.len() as u32;
        let letter_count = letters.class_count();
        assert_eq!(
            lists.len(),
            (states * letter_count) as usize,
            "transition list shape mismatch"
        );
        assert!(
            states == 0 && initial.0 == 0 || initial.0 < states,
            "initial state out of range"
        );

        let total: u64 = lists.iter().map(|l| l.len() as u64).sum();
        let layout = Layout::of(states, letter_count, total);

        let mut storage = Arena::with_capacity(layout.total);
        letters.encode(&mut storage);
        storage.pad();
        for &f in finals {
            storage.put(f as u8);
        }
        storage.pad();
        let mut running = 0u64;
        storage.put(running);
        for list in lists {
            running += list.len() as u64;
            storage.put(running);
        }
        storage.pad();
        for list in lists {
            for target in list {
                debug_assert!(target.0 < states);
                storage.put(target.0);
            }
        }
        storage.pad();
        debug_assert_eq!(storage.pos(), layout.total);

        Self {
            locals: Locals {
                states,
                letters: letter_count,
                initial: initial.0,
            },
            layout,
            storage,
        }
    }

    /// The empty scanner: no states, no transitions.
    pub fn empty() -> Self {
        Self::from_parts(&LetterTable::identity(), &[], &[], StateId(0))
    }

    /// Stream-load a type-3 image into freshly allocated storage.
    pub fn load<R: Read>(input: &mut R) -> Result<Self, ImageError> {
        let mut r = ImageReader::new(input);
        r.take_header()?.validate_for(TypeCode::Sparse, LOCALS_LEN)?;

        let mut buf = [0u8; LOCALS_LEN as usize];
        r.take_bytes(&mut buf)?;
        r.skip_pad()?;
        let locals = Locals::from_bytes(&buf);
        if locals.states > 0 && (locals.letters == 0 || locals.letters as usize > ALPHABET) {
            return Err(ImageError::BadIndex { at: 0 });
        }

        let lists = locals.states as usize * locals.letters as usize;
        let mut storage = Arena::new();

        let mut section = vec![0u8; ALPHABET * CELL_BYTES];
        r.take_bytes(&mut section)?;
        r.skip_pad()?;
        storage.put_bytes(&section);
        storage.pad();

        section.resize(locals.states as usize, 0);
        r.take_bytes(&mut section)?;
        r.skip_pad()?;
        storage.put_bytes(&section);
        storage.pad();

        section.resize((lists + 1) * INDEX_BYTES, 0);
        r.take_bytes(&mut section)?;
        r.skip_pad()?;
        // The payload length is only knowable from the final index entry,
        // which is untrusted; it must not be allowed to wrap the length
        // arithmetic.
        let total = u64::load(&section[lists * INDEX_BYTES..]);
        let payload_len = usize::try_from(total)
            .ok()
            .and_then(|elements| elements.checked_mul(CELL_BYTES))
            .ok_or(ImageError::BadIndex { at: lists })?;
        storage.put_bytes(&section);
        storage.pad();

        section.resize(payload_len, 0);
        r.take_bytes(&mut section)?;
        r.skip_pad()?;
        storage.put_bytes(&section);
        storage.pad();

        Self::checked(locals, total, storage)
    }
}

impl Default for SparseScanner<Arena> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> SparseScanner<&'a [u8]> {
    /// Map a type-3 image in place. Returns the scanner and the bytes
    /// consumed.
    pub fn map(bytes: &'a [u8]) -> Result<(Self, usize), ImageError> {
        let mut c = MapCursor::new(bytes)?;
        c.take_header()?.validate_for(TypeCode::Sparse, LOCALS_LEN)?;

        let locals = Locals::from_bytes(c.take_span(LOCALS_LEN as usize)?);
        c.skip_pad()?;
        if locals.states > 0 && (locals.letters == 0 || locals.letters as usize > ALPHABET) {
            return Err(ImageError::BadIndex { at: 0 });
        }

        let lists = locals.states as usize * locals.letters as usize;
        let start = c.consumed();
        c.take_span(ALPHABET * CELL_BYTES)?;
        c.skip_pad()?;
        c.take_span(locals.states as usize)?;
        c.skip_pad()?;
        let index = c.take_span((lists + 1) * INDEX_BYTES)?;
        c.skip_pad()?;
        let total = u64::load(&index[lists * INDEX_BYTES..]);
        let payload_len = usize::try_from(total)
            .ok()
            .and_then(|elements| elements.checked_mul(CELL_BYTES))
            .ok_or(ImageError::BadIndex { at: lists })?;
        c.take_span(payload_len)?;
        c.skip_pad()?;
        let storage = &bytes[start..c.consumed()];

        let scanner = Self::checked(locals, total, storage)?;
        Ok((scanner, c.consumed()))
    }
}
