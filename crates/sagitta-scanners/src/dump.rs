//! Human-readable image dump for debugging.
//!
//! Output is deterministic so it can be snapshot-tested. Transition tables
//! are only expanded for small automata; big ones get their section table
//! and counts.

use std::fmt::Write as _;

use sagitta_wire::{ImageError, TypeCode};

use crate::dense::DenseScanner;
use crate::flat::FlatScanner;
use crate::probe::probe;
use crate::sparse::SparseScanner;
use crate::tagged::TaggedScanner;

/// Largest state count whose transitions are printed in full.
const EXPAND_LIMIT: u32 = 16;

/// Render an image held in an aligned buffer.
pub fn dump(bytes: &[u8]) -> Result<String, ImageError> {
    let header = probe(bytes)?;
    let Some(type_code) = TypeCode::from_u32(header.type_code) else {
        return Err(ImageError::Type {
            expected: 0,
            found: header.type_code,
        });
    };

    let mut out = String::new();
    let name = match type_code {
        TypeCode::Dense => "dense",
        TypeCode::Flat => "flat",
        TypeCode::Sparse => "sparse",
        TypeCode::Tagged => "tagged",
    };
    writeln!(out, "[header]").unwrap();
    writeln!(out, "type = {name} ({})", header.type_code).unwrap();
    writeln!(out, "version = {}", header.version).unwrap();
    writeln!(out, "locals = {} bytes", header.locals_len).unwrap();

    match type_code {
        TypeCode::Dense => dump_dense(&mut out, bytes)?,
        TypeCode::Flat => dump_flat(&mut out, bytes)?,
        TypeCode::Sparse => dump_sparse(&mut out, bytes)?,
        TypeCode::Tagged => dump_tagged(&mut out, bytes)?,
    }
    Ok(out)
}

fn dump_sections(out: &mut String, sections: &[(&str, usize, usize)]) {
    writeln!(out, "\n[sections]").unwrap();
    let width = sections.iter().map(|(n, _, _)| n.len()).max().unwrap_or(0) + 2;
    for (name, off, len) in sections {
        writeln!(out, "{name:<width$}{off:#06x}  {len}").unwrap();
    }
}

fn dump_dense(out: &mut String, bytes: &[u8]) -> Result<(), ImageError> {
    let (sc, _) = DenseScanner::map(bytes)?;
    writeln!(out, "\n[locals]").unwrap();
    if sc.is_empty() {
        writeln!(out, "empty = true").unwrap();
        return Ok(());
    }
    writeln!(out, "states = {}", sc.states()).unwrap();
    writeln!(out, "letters = {}", sc.letters()).unwrap();
    writeln!(out, "patterns = {}", sc.patterns()).unwrap();
    writeln!(out, "initial = state {}", sc.state_of(sc.initial_row()).0).unwrap();
    dump_sections(out, &sc.sections());

    if sc.states() <= EXPAND_LIMIT {
        writeln!(out, "\n[states]").unwrap();
        for s in 0..sc.states() {
            let row = sc.row_of(crate::StateId(s));
            let targets: Vec<u32> = (0..sc.letters())
                .map(|class| sc.state_of(sc.next_row_for_class(row, class)).0)
                .collect();
            let marker = if sc.is_final_row(row) { "*" } else { " " };
            let accepts: Vec<u32> = sc.accepted(row).map(|p| p.0).collect();
            if accepts.is_empty() {
                writeln!(out, "{s} {marker} -> {targets:?}").unwrap();
            } else {
                writeln!(out, "{s} {marker} -> {targets:?}  accept {accepts:?}").unwrap();
            }
        }
    }
    Ok(())
}

fn dump_flat(out: &mut String, bytes: &[u8]) -> Result<(), ImageError> {
    let (sc, _) = FlatScanner::map(bytes)?;
    writeln!(out, "\n[locals]").unwrap();
    writeln!(out, "states = {}", sc.states()).unwrap();
    writeln!(out, "initial = state {}", sc.state_of(sc.initial_row()).0).unwrap();
    dump_sections(out, &sc.sections());

    if sc.states() <= EXPAND_LIMIT {
        writeln!(out, "\n[states]").unwrap();
        for s in 0..sc.states() {
            let row = sc.row_of(crate::StateId(s));
            let marker = if sc.is_final_row(row) { " *" } else { "" };
            writeln!(out, "{s}{marker}").unwrap();
        }
    }
    Ok(())
}

fn dump_sparse(out: &mut String, bytes: &[u8]) -> Result<(), ImageError> {
    let (sc, _) = SparseScanner::map(bytes)?;
    writeln!(out, "\n[locals]").unwrap();
    writeln!(out, "states = {}", sc.states()).unwrap();
    writeln!(out, "letters = {}", sc.letters()).unwrap();
    writeln!(out, "initial = state {}", sc.initial().0).unwrap();
    dump_sections(out, &sc.sections());

    if !sc.is_empty() && sc.states() <= EXPAND_LIMIT {
        writeln!(out, "\n[states]").unwrap();
        for s in 0..sc.states() {
            let state = crate::StateId(s);
            let marker = if sc.is_final(state) { "*" } else { " " };
            for class in 0..sc.letters() {
                let targets: Vec<u32> =
                    sc.transitions_for_class(state, class).map(|t| t.0).collect();
                if !targets.is_empty() {
                    writeln!(out, "{s} {marker} class {class} -> {targets:?}").unwrap();
                }
            }
        }
    }
    Ok(())
}

fn dump_tagged(out: &mut String, bytes: &[u8]) -> Result<(), ImageError> {
    let (sc, _) = TaggedScanner::map(bytes)?;
    writeln!(out, "\n[locals]").unwrap();
    writeln!(out, "states = {}", sc.states()).unwrap();
    writeln!(out, "letters = {}", sc.letters()).unwrap();
    writeln!(out, "patterns = {}", sc.patterns()).unwrap();
    if sc.is_empty() {
        writeln!(out, "empty = true").unwrap();
        return Ok(());
    }
    writeln!(out, "initial = state {}", sc.state_of(sc.initial_row()).0).unwrap();
    dump_sections(out, &sc.sections());

    if sc.states() <= EXPAND_LIMIT {
        writeln!(out, "\n[states]").unwrap();
        for s in 0..sc.states() {
            let row = sc.row_of(crate::StateId(s));
            let targets: Vec<u32> = (0..sc.letters())
                .map(|class| sc.state_of(sc.next_row_for_class(row, class)).0)
                .collect();
            let marker = if sc.is_final_row(row) { "*" } else { " " };
            writeln!(out, "{s} {marker} tag={:#06x} -> {targets:?}", sc.tag(row)).unwrap();
        }
    }
    Ok(())
}
