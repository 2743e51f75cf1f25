use matches::debug_assert_matches;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use icpu::{AddressingMode, RegisterId, Value};

#[derive(Parser)]
#[grammar = "asm.pest"]
pub struct AsmParser;

/// One parsed source line: an optional label declaration followed by an
/// optional directive or instruction.
#[derive(Debug, PartialEq)]
pub struct Line<'i> {
    pub label: Option<&'i str>,
    pub statement: Option<Statement<'i>>,
}

#[derive(Debug, PartialEq)]
pub enum Statement<'i> {
    Data(Vec<Value>),
    String(&'i str),
    Entry(&'i str),
    Extern(&'i str),
    Instruction {
        mnemonic: &'i str,
        operands: Vec<Operand<'i>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand<'i> {
    Immediate(Value),
    Direct(&'i str),
    Indirect(RegisterId),
    Register(RegisterId),
}

impl<'i> Operand<'i> {
    pub fn mode(&self) -> AddressingMode {
        match self {
            Operand::Immediate(_) => AddressingMode::Immediate,
            Operand::Direct(_) => AddressingMode::Direct,
            Operand::Indirect(_) => AddressingMode::Indirect,
            Operand::Register(_) => AddressingMode::Register,
        }
    }

    /// True for the operand kinds whose register index can share the
    /// combined register operand word.
    pub fn uses_register_word(&self) -> bool {
        match self {
            Operand::Indirect(_) | Operand::Register(_) => true,
            _ => false,
        }
    }
}

/// Parses one line of expanded source. The error value is a bare message;
/// callers attach the file name and line number.
pub fn parse_line(input: &str) -> Result<Line, String> {
    let pair = AsmParser::parse(Rule::line, input)
        .map_err(|err| {
            let column = match err.location {
                InputLocation::Pos(pos) => pos + 1,
                InputLocation::Span((start, _)) => start + 1,
            };
            format!("unrecognized syntax at column {}", column)
        })?
        .next()
        .unwrap();

    process_line(pair)
}

fn process_line(pair: Pair<Rule>) -> Result<Line, String> {
    debug_assert_matches!(pair.as_rule(), Rule::line);

    let mut label = None;
    let mut statement = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::label_decl => {
                label = Some(inner.into_inner().next().unwrap().as_str());
            }
            Rule::statement => statement = Some(process_statement(inner)?),
            Rule::EOI => {}
            _ => unreachable!(),
        }
    }

    Ok(Line { label, statement })
}

fn process_statement(pair: Pair<Rule>) -> Result<Statement, String> {
    debug_assert_matches!(pair.as_rule(), Rule::statement);
    let inner = pair.into_inner().next().unwrap();

    match inner.as_rule() {
        Rule::directive => process_directive(inner),
        Rule::instruction => process_instruction(inner),
        _ => unreachable!(),
    }
}

fn process_directive(pair: Pair<Rule>) -> Result<Statement, String> {
    let inner = pair.into_inner().next().unwrap();

    match inner.as_rule() {
        Rule::data_stmt => process_data(inner),
        Rule::string_stmt => process_string(inner),
        Rule::entry_stmt => process_symbol_directive(inner, ".entry", Statement::Entry),
        Rule::extern_stmt => process_symbol_directive(inner, ".extern", Statement::Extern),
        Rule::unknown_stmt => {
            let name = inner.into_inner().next().unwrap().as_str();
            Err(format!("unknown directive `{}`", name))
        }
        _ => unreachable!(),
    }
}

fn process_data(pair: Pair<Rule>) -> Result<Statement, String> {
    let pairs: Vec<Pair<Rule>> = pair.into_inner().collect();

    // Report stray text before any comma-shape complaint about the list
    // in front of it; the text is the actual culprit.
    if let Some(trailing) = pairs.iter().find(|p| p.as_rule() == Rule::trailing) {
        return Err(format!(
            "unexpected `{}` in .data value list",
            trailing.as_str().trim()
        ));
    }

    let mut values = None;
    for inner in pairs {
        match inner.as_rule() {
            Rule::data_kw => {}
            Rule::int_list => values = Some(process_int_list(inner)?),
            _ => unreachable!(),
        }
    }

    values
        .map(Statement::Data)
        .ok_or_else(|| ".data directive is missing its value list".to_owned())
}

fn process_string(pair: Pair<Rule>) -> Result<Statement, String> {
    let mut text = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::string_kw => {}
            Rule::string => text = Some(inner.into_inner().next().unwrap().as_str()),
            Rule::trailing => {
                let found = inner.as_str().trim();
                return Err(if text.is_some() {
                    format!("unexpected `{}` after string literal", found)
                } else if found.starts_with('"') {
                    "unterminated string literal".to_owned()
                } else {
                    format!("expected a double-quoted string, found `{}`", found)
                });
            }
            _ => unreachable!(),
        }
    }

    text.map(Statement::String)
        .ok_or_else(|| ".string directive is missing its string literal".to_owned())
}

fn process_symbol_directive<'i>(
    pair: Pair<'i, Rule>,
    directive: &str,
    build: fn(&'i str) -> Statement<'i>,
) -> Result<Statement<'i>, String> {
    let mut name = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::entry_kw | Rule::extern_kw => {}
            Rule::identifier => name = Some(inner.as_str()),
            Rule::trailing => {
                let found = inner.as_str().trim();
                return Err(if name.is_some() {
                    format!("unexpected `{}` after {} symbol", found, directive)
                } else {
                    format!("invalid symbol name `{}` in {}", found, directive)
                });
            }
            _ => unreachable!(),
        }
    }

    name.map(build)
        .ok_or_else(|| format!("{} directive is missing its symbol name", directive))
}

fn process_instruction(pair: Pair<Rule>) -> Result<Statement, String> {
    let pairs: Vec<Pair<Rule>> = pair.into_inner().collect();
    let have_operands = pairs.iter().any(|p| p.as_rule() == Rule::operands);

    if let Some(trailing) = pairs.iter().find(|p| p.as_rule() == Rule::trailing) {
        let found = trailing.as_str().trim();
        let rest = found.trim_start_matches(',').trim_start();
        return Err(if found.starts_with(',') || !have_operands {
            format!("illegal operand `{}`", rest)
        } else {
            format!("expected comma before `{}`", rest)
        });
    }

    let mut mnemonic = "";
    let mut operands = Vec::new();

    for inner in pairs {
        match inner.as_rule() {
            Rule::mnemonic => mnemonic = inner.as_str(),
            Rule::operands => operands = process_operands(inner)?,
            _ => unreachable!(),
        }
    }

    Ok(Statement::Instruction { mnemonic, operands })
}

fn process_int_list(pair: Pair<Rule>) -> Result<Vec<Value>, String> {
    debug_assert_matches!(pair.as_rule(), Rule::int_list);

    let pairs: Vec<Pair<Rule>> = pair.into_inner().collect();
    let mut values = Vec::new();

    for (at, inner) in pairs.iter().enumerate() {
        match inner.as_rule() {
            Rule::sep => check_separator(inner, at, pairs.len())?,
            Rule::integer => values.push(process_int(inner)?),
            _ => unreachable!(),
        }
    }

    Ok(values)
}

fn process_operands(pair: Pair<Rule>) -> Result<Vec<Operand>, String> {
    debug_assert_matches!(pair.as_rule(), Rule::operands);

    let pairs: Vec<Pair<Rule>> = pair.into_inner().collect();
    let mut operands = Vec::new();

    for (at, inner) in pairs.iter().enumerate() {
        match inner.as_rule() {
            Rule::sep => check_separator(inner, at, pairs.len())?,
            Rule::operand => operands.push(process_operand(inner.clone())?),
            _ => unreachable!(),
        }
    }

    Ok(operands)
}

fn check_separator(pair: &Pair<Rule>, at: usize, total: usize) -> Result<(), String> {
    if pair.as_str().matches(',').count() > 1 {
        Err("consecutive commas".to_owned())
    } else if at == 0 {
        Err("illegal comma before the first operand".to_owned())
    } else if at == total - 1 {
        Err("illegal comma after the last operand".to_owned())
    } else {
        Ok(())
    }
}

fn process_operand(pair: Pair<Rule>) -> Result<Operand, String> {
    debug_assert_matches!(pair.as_rule(), Rule::operand);
    let inner = pair.into_inner().next().unwrap();

    Ok(match inner.as_rule() {
        Rule::immediate => {
            Operand::Immediate(process_int(&inner.into_inner().next().unwrap())?)
        }
        Rule::indirect => Operand::Indirect(process_register(&inner.into_inner().next().unwrap())),
        Rule::register => Operand::Register(process_register(&inner)),
        Rule::symbol => Operand::Direct(inner.as_str()),
        _ => unreachable!(),
    })
}

fn process_register(pair: &Pair<Rule>) -> RegisterId {
    // The grammar only admits r0-r7 here.
    pair.as_str().parse().unwrap()
}

fn process_int(pair: &Pair<Rule>) -> Result<Value, String> {
    pair.as_str()
        .parse::<i32>()
        .map(|value| value as Value)
        .map_err(|err| format!("parsing integer `{}` failed: {}", pair.as_str(), err))
}
