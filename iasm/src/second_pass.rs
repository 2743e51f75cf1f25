use std::collections::HashSet;

use icpu::constants::IC_ORIGIN;
use icpu::{DataWord, MachineWord};

use crate::diagnostics::Diagnostic;
use crate::images::CodeImage;
use crate::parser::{self, Operand, Statement};
use crate::source::{self, SourceLine};
use crate::symbols::{SymbolKind, SymbolTable};

/// Walks the expanded source a second time, in IC lockstep with the
/// first pass: fills every reserved direct-address slot, records
/// external use sites and promotes `.entry` declarations.
///
/// `skip` holds the numbers of lines the first pass rejected; they
/// emitted nothing, so they are stepped over here as well.
pub fn run(
    file: &str,
    source_text: &str,
    code: &mut CodeImage,
    symbols: &mut SymbolTable,
    skip: &HashSet<u32>,
) -> Vec<Diagnostic> {
    let mut pass = SecondPass {
        file,
        ic: IC_ORIGIN,
        code,
        symbols,
        diagnostics: Vec::new(),
    };

    for line in source::lines(source_text) {
        if line.is_blank() || line.is_comment() || skip.contains(&line.number) {
            continue;
        }
        pass.process_line(&line);
    }

    pass.diagnostics
}

struct SecondPass<'a> {
    file: &'a str,
    ic: u32,
    code: &'a mut CodeImage,
    symbols: &'a mut SymbolTable,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SecondPass<'a> {
    fn report(&mut self, line: &SourceLine, message: String) {
        self.diagnostics
            .push(Diagnostic::new(self.file, line.number, message));
    }

    fn process_line(&mut self, line: &SourceLine) {
        let parsed = match parser::parse_line(line.content) {
            Ok(parsed) => parsed,
            // Already reported by the first pass.
            Err(_) => return,
        };

        match parsed.statement {
            Some(Statement::Entry(name)) => self.process_entry(line, name),
            Some(Statement::Instruction { operands, .. }) => {
                self.process_instruction(line, &operands)
            }
            _ => {}
        }
    }

    /// `.entry NAME` re-inserts an existing `Code` or `Data` symbol as an
    /// `Entry` with the same (already rebased) value.
    fn process_entry(&mut self, line: &SourceLine, name: &str) {
        if self.symbols.contains(name, SymbolKind::Entry) {
            return;
        }
        if self.symbols.contains(name, SymbolKind::External) {
            return self.report(
                line,
                format!("`{}` is declared .extern and cannot be an entry", name),
            );
        }

        let value = match self.symbols.primary(name) {
            Some(symbol) => symbol.value,
            None => {
                return self.report(line, format!(".entry names undefined symbol `{}`", name));
            }
        };
        self.symbols.attach(name, value, SymbolKind::Entry);
    }

    fn process_instruction(&mut self, line: &SourceLine, operands: &[Operand]) {
        let length = match self.code.at(self.ic) {
            Some(MachineWord::Code { length, .. }) => length,
            // The first pass emitted nothing for this line.
            _ => return,
        };

        let mut direct = operands.iter().filter_map(|operand| match operand {
            Operand::Direct(name) => Some(*name),
            _ => None,
        });

        for offset in 1..length {
            let address = self.ic + offset;
            if self.code.at(address).is_some() {
                continue;
            }

            let name = match direct.next() {
                Some(name) => name,
                None => unreachable!(),
            };
            let resolved = self
                .symbols
                .primary(name)
                .map(|symbol| (symbol.value, symbol.kind));

            let word = match resolved {
                Some((_, SymbolKind::External)) => {
                    self.symbols
                        .attach(name, address as i32, SymbolKind::ExternalRef);
                    DataWord::external()
                }
                Some((value, _)) => DataWord::relocatable(value),
                None => {
                    self.report(line, format!("undefined symbol `{}`", name));
                    continue;
                }
            };
            self.code.fill(address, MachineWord::Data(word));
        }

        self.ic += length;
    }
}
