//! Two-pass assembler for the [icpu](../icpu/index.html) teaching machine.
//!
//! The assembler turns a source file written in the machine's assembly
//! dialect into a textual object file, plus listings of the symbols the
//! unit imports and exports. The pipeline has three stages, all exposed
//! here as library functions driven by the `iasm` binary:
//!
//! 1. [`expand`](fn.expand.html) copies the source with every macro
//!    invocation replaced by its body (the `.am` file),
//! 2. a first pass over the expanded text builds the symbol table and
//!    the code and data images, leaving a reserved slot wherever a
//!    direct operand's address is not known yet,
//! 3. a second pass fills the reserved slots, records external use
//!    sites and promotes `.entry` declarations.
//!
//! [`assemble`](fn.assemble.html) runs the two passes and either returns
//! the finalized [`Assembly`](struct.Assembly.html) or every
//! [`Diagnostic`](struct.Diagnostic.html) collected along the way.
//! Output files are only written from a clean result.
//!
//! # Assembly Dialect
//!
//! Each line holds at most one statement, optionally preceded by a
//! label declaration (`name:`). Lines are at most 80 characters long.
//! A line whose first non-blank character is `;` is a comment.
//!
//! ## Directives
//!
//! Keyword   | Description | Example
//! ----------|-------------|--------
//! `.data`   | comma-separated integers appended to the data image | `.data 7, -57, +17`
//! `.string` | a double-quoted string, stored as one word per character plus a 0 terminator | `.string "abcd"`
//! `.entry`  | exports a symbol defined in this unit | `.entry MAIN`
//! `.extern` | imports a symbol defined elsewhere | `.extern K`
//!
//! ## Addressing Modes
//!
//! Mode | Form    | Meaning
//! -----|---------|--------
//! 0    | `#n`    | immediate literal
//! 1    | `label` | direct: the symbol's address
//! 2    | `*rN`   | register indirect
//! 3    | `rN`    | register
//!
//! ## Mnemonics
//!
//! Mnemonic | Operands | Description
//! ---------|----------|------------
//! `mov`    | 2        | copy source to destination
//! `cmp`    | 2        | compare operands
//! `add`    | 2        | integer addition
//! `sub`    | 2        | integer subtraction
//! `lea`    | 2        | load effective address of a label
//! `clr`    | 1        | clear destination
//! `not`    | 1        | bitwise complement
//! `inc`    | 1        | increment
//! `dec`    | 1        | decrement
//! `jmp`    | 1        | unconditional jump
//! `bne`    | 1        | branch if not equal
//! `jsr`    | 1        | jump to subroutine
//! `red`    | 1        | read a character
//! `prn`    | 1        | print an operand
//! `rts`    | 0        | return from subroutine
//! `stop`   | 0        | halt
//!
//! ## Macros
//!
//! A macro is defined with `macr <name>`, closed with `endmacr`, and
//! invoked by naming it at the start of a line:
//!
//! ```text
//! macr twice
//! inc r1
//! inc r1
//! endmacr
//! twice
//! ```
//!
//! Bodies are copied verbatim and exactly once; macros neither nest nor
//! take parameters.

mod diagnostics;
mod first_pass;
mod images;
mod labels;
mod parser;
mod preprocessor;
mod second_pass;
mod source;
mod symbols;

#[cfg(test)]
mod test;

use std::collections::HashSet;

use obfile::{ObjectFile, SymbolRef};

use symbols::SymbolKind;

pub use diagnostics::Diagnostic;
pub use preprocessor::expand;

/// The finalized output of one translation unit.
pub struct Assembly {
    pub object: ObjectFile,
    /// Use sites of external symbols, in address order (`.ext`).
    pub externals: Vec<SymbolRef>,
    /// Exported symbols, in address order (`.ent`).
    pub entries: Vec<SymbolRef>,
}

/// Runs both passes over macro-expanded source. `file` is the name used
/// in diagnostics. On any error the collected diagnostics are returned
/// instead of an `Assembly`.
pub fn assemble(file: &str, source_text: &str) -> Result<Assembly, Vec<Diagnostic>> {
    let first = first_pass::run(file, source_text);
    let first_pass::FirstPassResult {
        icf,
        mut code,
        data,
        mut symbols,
        mut diagnostics,
        fatal,
        ..
    } = first;

    // Data addresses start where the code ends.
    symbols.rebase(SymbolKind::Data, icf as i32);

    if !fatal {
        let failed: HashSet<u32> = diagnostics.iter().map(|d| d.line).collect();
        diagnostics.extend(second_pass::run(
            file,
            source_text,
            &mut code,
            &mut symbols,
            &failed,
        ));
    }

    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    let externals = symbol_refs(&symbols, SymbolKind::ExternalRef);
    let entries = symbol_refs(&symbols, SymbolKind::Entry);

    Ok(Assembly {
        object: ObjectFile::from(code.finalize(), data.finalize()),
        externals,
        entries,
    })
}

fn symbol_refs(symbols: &symbols::SymbolTable, kind: SymbolKind) -> Vec<SymbolRef> {
    symbols
        .of_kind(kind)
        .map(|symbol| SymbolRef::from(&symbol.name, symbol.value as u32))
        .collect()
}
