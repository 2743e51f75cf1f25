//! Textual object-file format emitted by the assembler.
//!
//! An `.ob` file starts with a header line holding the code and data
//! image sizes, followed by one line per memory word: the address as a
//! zero-padded 7-digit decimal number and the word value as a 6-digit
//! octal number. Code words come first, starting at address 100, with
//! the data image directly behind them.
//!
//! The companion `.ext` and `.ent` files share one line format: a symbol
//! name followed by a 7-digit address. Both are written even when empty.

use std::fs::File;
use std::io::prelude::*;
use std::io::BufWriter;
use std::path::Path;

use icpu::constants::{IC_ORIGIN, WORD_MASK};
use icpu::Word;

/// Finalized code and data images of one translation unit.
#[derive(Debug, PartialEq)]
pub struct ObjectFile {
    code: Vec<Word>,
    data: Vec<Word>,
}

impl ObjectFile {
    pub fn from(code: Vec<Word>, data: Vec<Word>) -> ObjectFile {
        ObjectFile { code, data }
    }

    pub fn copy_from(code: &[Word], data: &[Word]) -> ObjectFile {
        ObjectFile {
            code: Vec::from(code),
            data: Vec::from(data),
        }
    }

    pub fn code(&self) -> &[Word] {
        &self.code[..]
    }

    pub fn data(&self) -> &[Word] {
        &self.data[..]
    }
}

/// One `.ext` or `.ent` line: a symbol name and the address it refers to.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolRef {
    pub name: String,
    pub address: u32,
}

impl SymbolRef {
    pub fn from(name: &str, address: u32) -> SymbolRef {
        SymbolRef {
            name: name.to_owned(),
            address,
        }
    }
}

pub fn write_object<W: Write>(writer: &mut W, object: &ObjectFile) -> std::io::Result<()> {
    writeln!(writer, "{} {}", object.code.len(), object.data.len())?;

    let words = object.code.iter().chain(object.data.iter());
    for (slot, word) in words.enumerate() {
        writeln!(
            writer,
            "{:07} {:06o}",
            IC_ORIGIN + slot as u32,
            word & WORD_MASK
        )?;
    }
    Ok(())
}

pub fn write_refs<W: Write>(writer: &mut W, refs: &[SymbolRef]) -> std::io::Result<()> {
    for symbol_ref in refs.iter() {
        writeln!(writer, "{} {:07}", symbol_ref.name, symbol_ref.address)?;
    }
    Ok(())
}

pub trait WriteObExt: Write + Sized {
    fn write_object(&mut self, object: &ObjectFile) -> std::io::Result<()> {
        write_object(self, object)
    }

    fn write_refs(&mut self, refs: &[SymbolRef]) -> std::io::Result<()> {
        write_refs(self, refs)
    }
}

impl<W: Write + Sized> WriteObExt for W {}

pub fn write_object_file<P: AsRef<Path>>(path: P, object: &ObjectFile) -> std::io::Result<()> {
    BufWriter::new(File::create(path)?).write_object(object)
}

pub fn write_refs_file<P: AsRef<Path>>(path: P, refs: &[SymbolRef]) -> std::io::Result<()> {
    BufWriter::new(File::create(path)?).write_refs(refs)
}
