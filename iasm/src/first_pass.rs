use icpu::constants::{ARE_ABSOLUTE, IC_ORIGIN, IMAGE_CAPACITY};
use icpu::{enum_to_u32, register_index, CodeWord, DataWord, MachineWord, Mnemonic, Value};

use crate::diagnostics::Diagnostic;
use crate::images::{CodeImage, DataImage};
use crate::labels;
use crate::parser::{self, Operand, Statement};
use crate::source::{self, SourceLine, MAX_LINE_LENGTH};
use crate::symbols::{SymbolKind, SymbolTable};

/// Everything the first pass learned about one translation unit.
///
/// Data symbols still hold their data-image offsets; the caller rebases
/// them by `icf` before running the second pass.
pub struct FirstPassResult {
    pub icf: u32,
    pub dcf: u32,
    pub code: CodeImage,
    pub data: DataImage,
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when the file cannot meaningfully be processed further
    /// (image overflow); the second pass is skipped.
    pub fatal: bool,
}

struct FirstPass<'i> {
    file: &'i str,
    ic: u32,
    dc: u32,
    code: CodeImage,
    data: DataImage,
    symbols: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    fatal: bool,
}

pub fn run(file: &str, source_text: &str) -> FirstPassResult {
    let mut pass = FirstPass {
        file,
        ic: IC_ORIGIN,
        dc: 0,
        code: CodeImage::new(),
        data: DataImage::new(),
        symbols: SymbolTable::new(),
        diagnostics: Vec::new(),
        fatal: false,
    };

    for line in source::lines(source_text) {
        if line.is_blank() || line.is_comment() {
            continue;
        }
        if line.too_long() {
            pass.report(
                &line,
                format!("line is longer than {} characters", MAX_LINE_LENGTH),
            );
            continue;
        }

        pass.process_line(&line);

        if pass.code.len() + pass.data.len() > IMAGE_CAPACITY {
            pass.report(
                &line,
                format!("program does not fit the {}-word memory", IMAGE_CAPACITY),
            );
            pass.fatal = true;
            break;
        }
    }

    FirstPassResult {
        icf: pass.ic,
        dcf: pass.dc,
        code: pass.code,
        data: pass.data,
        symbols: pass.symbols,
        diagnostics: pass.diagnostics,
        fatal: pass.fatal,
    }
}

impl<'i> FirstPass<'i> {
    fn report(&mut self, line: &SourceLine, message: String) {
        self.diagnostics
            .push(Diagnostic::new(self.file, line.number, message));
    }

    /// Handles one line. A line either takes full effect (symbols and
    /// image words committed together) or none at all, so a failed line
    /// never advances IC or DC.
    fn process_line(&mut self, line: &SourceLine) {
        let parsed = match parser::parse_line(line.content) {
            Ok(parsed) => parsed,
            Err(message) => return self.report(line, message),
        };

        if let Some(name) = parsed.label {
            if let Err(problem) = labels::validate(name) {
                return self.report(line, format!("bad label name: {}", problem));
            }
        }

        match parsed.statement {
            None => {
                if parsed.label.is_some() {
                    self.report(line, "label is not followed by anything".to_owned());
                }
            }
            Some(Statement::Data(values)) => self.process_data(line, parsed.label, &values),
            Some(Statement::String(text)) => self.process_string(line, parsed.label, text),
            Some(Statement::Extern(name)) => self.process_extern(line, name),
            Some(Statement::Entry(_)) => {
                // Resolved by the second pass; only the label rule is
                // checked here.
                if parsed.label.is_some() {
                    self.report(line, "label is not allowed on an .entry line".to_owned());
                }
            }
            Some(Statement::Instruction { mnemonic, operands }) => {
                self.process_instruction(line, parsed.label, mnemonic, &operands)
            }
        }
    }

    fn process_data(&mut self, line: &SourceLine, label: Option<&str>, values: &[Value]) {
        if let Some(name) = label {
            if let Err(message) = self.symbols.define(name, self.dc as i32, SymbolKind::Data) {
                return self.report(line, message);
            }
        }

        for &value in values {
            self.data.push(value);
        }
        self.dc += values.len() as u32;
    }

    fn process_string(&mut self, line: &SourceLine, label: Option<&str>, text: &str) {
        if let Some(name) = label {
            if let Err(message) = self.symbols.define(name, self.dc as i32, SymbolKind::Data) {
                return self.report(line, message);
            }
        }

        for byte in text.bytes() {
            self.data.push(Value::from(byte));
        }
        self.data.push(0);
        self.dc += text.len() as u32 + 1;
    }

    fn process_extern(&mut self, line: &SourceLine, name: &str) {
        // A label in front of .extern is accepted and ignored.
        if let Err(problem) = labels::validate(name) {
            return self.report(line, format!("bad symbol name in .extern: {}", problem));
        }
        if let Err(message) = self.symbols.define(name, 0, SymbolKind::External) {
            self.report(line, message);
        }
    }

    fn process_instruction(
        &mut self,
        line: &SourceLine,
        label: Option<&str>,
        mnemonic: &str,
        operands: &[Operand],
    ) {
        let name = mnemonic;
        let mnemonic: Mnemonic = match name.parse() {
            Ok(mnemonic) => mnemonic,
            Err(_) => return self.report(line, format!("unknown mnemonic `{}`", name)),
        };

        if operands.len() != mnemonic.operand_count() {
            return self.report(
                line,
                format!(
                    "`{}` takes {} operand(s), found {}",
                    name,
                    mnemonic.operand_count(),
                    operands.len()
                ),
            );
        }

        let (src, dest) = match *operands {
            [] => (None, None),
            [dest] => (None, Some(dest)),
            [src, dest] => (Some(src), Some(dest)),
            _ => unreachable!(),
        };

        if let Some(operand) = src {
            if !mnemonic.src_modes().contains(&operand.mode()) {
                return self.report(
                    line,
                    format!(
                        "`{}` does not accept a {} source operand",
                        name,
                        operand.mode()
                    ),
                );
            }
        }
        if let Some(operand) = dest {
            if !mnemonic.dest_modes().contains(&operand.mode()) {
                return self.report(
                    line,
                    format!(
                        "`{}` does not accept a {} destination operand",
                        name,
                        operand.mode()
                    ),
                );
            }
        }

        if let Some(name) = label {
            if let Err(message) = self.symbols.define(name, self.ic as i32, SymbolKind::Code) {
                return self.report(line, message);
            }
        }

        let word = encode(mnemonic, src, dest);
        let extras = extra_words(src, dest);

        self.code.push(MachineWord::Code {
            length: 1 + extras.len() as u32,
            word,
        });
        self.ic += 1;

        for extra in extras {
            match extra {
                Some(data_word) => self.code.push(MachineWord::Data(data_word)),
                None => self.code.reserve(),
            }
            self.ic += 1;
        }
    }
}

/// Builds the instruction's code word. Only plain register operands set
/// the register fields; indirect operands keep them 0 and put the index
/// into their operand word instead.
fn encode(mnemonic: Mnemonic, src: Option<Operand>, dest: Option<Operand>) -> CodeWord {
    let mut word = CodeWord {
        are: ARE_ABSOLUTE,
        opcode: mnemonic.opcode(),
        funct: mnemonic.funct(),
        ..Default::default()
    };

    if let Some(operand) = src {
        word.src_addressing = enum_to_u32(operand.mode()) as u8;
        if let Operand::Register(id) = operand {
            word.src_register = register_index(id);
        }
    }
    if let Some(operand) = dest {
        word.dest_addressing = enum_to_u32(operand.mode()) as u8;
        if let Operand::Register(id) = operand {
            word.dest_register = register_index(id);
        }
    }

    word
}

/// The operand words following the code word, in image order. `None`
/// marks a slot whose symbol address the second pass fills in.
///
/// When both operands carry a register index (register or register
/// indirect) they share a single word. A plain register operand on its
/// own contributes nothing: its index already sits in the code word.
fn extra_words(src: Option<Operand>, dest: Option<Operand>) -> Vec<Option<DataWord>> {
    if let (Some(a), Some(b)) = (src, dest) {
        if a.uses_register_word() && b.uses_register_word() {
            return vec![Some(DataWord::registers(
                operand_register(a),
                operand_register(b),
            ))];
        }
    }

    let mut words = Vec::new();
    for (operand, is_dest) in src.iter().map(|op| (op, false)).chain(dest.iter().map(|op| (op, true))) {
        match operand {
            Operand::Immediate(value) => words.push(Some(DataWord::absolute(*value))),
            Operand::Direct(_) => words.push(None),
            Operand::Indirect(id) => {
                let index = register_index(*id);
                words.push(Some(if is_dest {
                    DataWord::registers(0, index)
                } else {
                    DataWord::registers(index, 0)
                }));
            }
            Operand::Register(_) => {}
        }
    }
    words
}

fn operand_register(operand: Operand) -> u8 {
    match operand {
        Operand::Register(id) | Operand::Indirect(id) => register_index(id),
        _ => 0,
    }
}
