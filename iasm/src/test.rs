use icpu::constants::ARE_ABSOLUTE;
use icpu::{CodeWord, DataWord};
use obfile::SymbolRef;

use crate::{assemble, expand, Assembly, Diagnostic};


fn assemble_clean(source: &str) -> Assembly {
    match assemble("test.am", source) {
        Ok(assembly) => assembly,
        Err(diagnostics) => panic!("unexpected diagnostics: {:?}", diagnostics),
    }
}

fn assemble_failed(source: &str) -> Vec<Diagnostic> {
    match assemble("test.am", source) {
        Ok(_) => panic!("expected diagnostics"),
        Err(diagnostics) => diagnostics,
    }
}

fn stop_word() -> CodeWord {
    CodeWord {
        are: ARE_ABSOLUTE,
        opcode: 15,
        ..Default::default()
    }
}

#[test]
fn immediate_and_register_operands() {
    let assembly = assemble_clean("START: mov #-5, r3\nstop\n");

    let mov = CodeWord {
        are: ARE_ABSOLUTE,
        dest_addressing: 3,
        dest_register: 3,
        ..Default::default()
    };

    assert_eq!(
        assembly.object.code(),
        &[mov.pack(), DataWord::absolute(-5).pack(), stop_word().pack()]
    );
    assert!(assembly.object.data().is_empty());
}

#[test]
fn forward_reference_is_patched() {
    let assembly = assemble_clean("mov r1, X\nstop\nX: .data 7\n");

    let mov = CodeWord {
        are: ARE_ABSOLUTE,
        src_addressing: 3,
        src_register: 1,
        dest_addressing: 1,
        ..Default::default()
    };

    // X sits at DC 0 and is rebased to ICF = 103.
    assert_eq!(
        assembly.object.code(),
        &[
            mov.pack(),
            DataWord::relocatable(103).pack(),
            stop_word().pack()
        ]
    );
    assert_eq!(assembly.object.data(), &[7]);
}

#[test]
fn external_reference_is_recorded() {
    let assembly = assemble_clean(".extern K\njmp K\nstop\n");

    let jmp = CodeWord {
        are: ARE_ABSOLUTE,
        opcode: 9,
        funct: 1,
        dest_addressing: 1,
        ..Default::default()
    };

    assert_eq!(
        assembly.object.code(),
        &[jmp.pack(), DataWord::external().pack(), stop_word().pack()]
    );
    assert_eq!(assembly.externals, vec![SymbolRef::from("K", 101)]);
    assert!(assembly.entries.is_empty());
}

#[test]
fn register_pair_shares_one_word() {
    let assembly = assemble_clean("add r2, r5\nstop\n");

    let add = CodeWord {
        are: ARE_ABSOLUTE,
        opcode: 2,
        funct: 1,
        src_addressing: 3,
        src_register: 2,
        dest_addressing: 3,
        dest_register: 5,
        ..Default::default()
    };

    assert_eq!(
        assembly.object.code(),
        &[add.pack(), DataWord::registers(2, 5).pack(), stop_word().pack()]
    );
}

#[test]
fn two_immediates_take_two_extra_words() {
    let assembly = assemble_clean("cmp #1, #2\nstop\n");

    let cmp = CodeWord {
        are: ARE_ABSOLUTE,
        opcode: 1,
        ..Default::default()
    };

    assert_eq!(
        assembly.object.code(),
        &[
            cmp.pack(),
            DataWord::absolute(1).pack(),
            DataWord::absolute(2).pack(),
            stop_word().pack()
        ]
    );
}

#[test]
fn string_directive_emits_terminated_bytes() {
    let assembly = assemble_clean("STR: .string \"ab\"\nstop\n");

    assert_eq!(assembly.object.code().len(), 1);
    assert_eq!(assembly.object.data(), &[97, 98, 0]);
}

#[test]
fn data_only_object_file() {
    let assembly = assemble_clean(".data 1,2,3\n");

    let mut buffer = Vec::new();
    obfile::write_object(&mut buffer, &assembly.object).unwrap();

    assert_eq!(
        String::from_utf8(buffer).unwrap(),
        "0 3\n\
         0000100 000001\n\
         0000101 000002\n\
         0000102 000003\n"
    );
}

#[test]
fn negative_data_value_prints_truncated() {
    let assembly = assemble_clean(".data -5\n");

    let mut buffer = Vec::new();
    obfile::write_object(&mut buffer, &assembly.object).unwrap();

    assert_eq!(String::from_utf8(buffer).unwrap(), "0 1\n0000100 077773\n");
}

#[test]
fn macro_invocations_assemble_expanded() {
    let (expanded, diagnostics) =
        expand("test.as", "macr M\ninc r0\ninc r1\nendmacr\nM\nM\nstop\n");

    assert!(diagnostics.is_empty());
    assert_eq!(expanded, "inc r0\ninc r1\ninc r0\ninc r1\nstop\n");

    let assembly = assemble_clean(&expanded);
    assert_eq!(assembly.object.code().len(), 5);
}

#[test]
fn entry_is_promoted() {
    let assembly = assemble_clean("MAIN: clr r1\nstop\n.entry MAIN\n");

    assert_eq!(assembly.entries, vec![SymbolRef::from("MAIN", 100)]);
    assert!(assembly.externals.is_empty());
}

#[test]
fn entry_before_definition_is_promoted() {
    let assembly = assemble_clean(".entry X\nstop\nX: .data 4\n");

    assert_eq!(assembly.entries, vec![SymbolRef::from("X", 101)]);
}

#[test]
fn full_program_object_output() {
    let source = "\
; sample program
MAIN: mov #3, r1
LOOP: cmp r1, K
bne LOOP
prn STR
add r1, r2
stop
STR: .string \"hi\"
.data 6, -9
.extern K
.entry MAIN
";
    let assembly = assemble_clean(source);

    let mov = CodeWord {
        are: ARE_ABSOLUTE,
        dest_addressing: 3,
        dest_register: 1,
        ..Default::default()
    };
    let cmp = CodeWord {
        are: ARE_ABSOLUTE,
        opcode: 1,
        src_addressing: 3,
        src_register: 1,
        dest_addressing: 1,
        ..Default::default()
    };
    let bne = CodeWord {
        are: ARE_ABSOLUTE,
        opcode: 9,
        funct: 2,
        dest_addressing: 1,
        ..Default::default()
    };
    let prn = CodeWord {
        are: ARE_ABSOLUTE,
        opcode: 12,
        dest_addressing: 1,
        ..Default::default()
    };
    let add = CodeWord {
        are: ARE_ABSOLUTE,
        opcode: 2,
        funct: 1,
        src_addressing: 3,
        src_register: 1,
        dest_addressing: 3,
        dest_register: 2,
        ..Default::default()
    };

    assert_eq!(
        assembly.object.code(),
        &[
            mov.pack(),
            DataWord::absolute(3).pack(),
            cmp.pack(),
            DataWord::external().pack(),
            bne.pack(),
            DataWord::relocatable(102).pack(),
            prn.pack(),
            DataWord::relocatable(111).pack(),
            add.pack(),
            DataWord::registers(1, 2).pack(),
            stop_word().pack(),
        ]
    );
    assert_eq!(assembly.object.data(), &[104, 105, 0, 6, -9i16 as u16]);
    assert_eq!(assembly.externals, vec![SymbolRef::from("K", 103)]);
    assert_eq!(assembly.entries, vec![SymbolRef::from("MAIN", 100)]);
}

#[test]
fn duplicate_label_is_reported_and_processing_continues() {
    let diagnostics = assemble_failed("LAB: clr r1\nLAB: clr r2\nfoo r3\n");

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].line, 2);
    assert!(diagnostics[0].message.contains("LAB"));
    assert_eq!(diagnostics[1].line, 3);
    assert!(diagnostics[1].message.contains("foo"));
}

#[test]
fn diagnostic_display_format() {
    let diagnostic = Diagnostic::new("prog.am", 3, "undefined symbol `X`".to_owned());

    assert_eq!(
        diagnostic.to_string(),
        "Error In prog.am:3: undefined symbol `X`"
    );
}

#[test]
fn undefined_symbol_is_reported() {
    let diagnostics = assemble_failed("jmp NOWHERE\nstop\n");

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("NOWHERE"));
}

#[test]
fn entry_of_extern_is_reported() {
    let diagnostics = assemble_failed(".extern K\n.entry K\nstop\n");

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 2);
}

#[test]
fn entry_of_undefined_symbol_is_reported() {
    let diagnostics = assemble_failed(".entry GHOST\nstop\n");

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("GHOST"));
}

#[test]
fn labeled_entry_line_is_reported() {
    let diagnostics = assemble_failed("X: clr r1\nY: .entry X\nstop\n");

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 2);
}

#[test]
fn label_alone_is_reported() {
    let diagnostics = assemble_failed("X:\nstop\n");

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 1);
}

#[test]
fn wrong_operand_count_is_reported() {
    let diagnostics = assemble_failed("mov #1\nstop\n");

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("mov"));
}

#[test]
fn rejected_addressing_mode_is_reported() {
    // lea does not take an immediate source, jmp no register target.
    let diagnostics = assemble_failed("lea #5, r1\njmp r2\nstop\n");

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].line, 1);
    assert_eq!(diagnostics[1].line, 2);
}

#[test]
fn overlong_line_is_reported() {
    let source = format!("mov {}, r1\nstop\n", "A".repeat(90));
    let diagnostics = assemble_failed(&source);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 1);
}

#[test]
fn bad_label_names_are_reported() {
    assert_eq!(assemble_failed("1X: stop\n")[0].line, 1);
    assert!(assemble_failed("mov: stop\n")[0].message.contains("reserved"));

    let long = format!("{}: stop\n", "A".repeat(40));
    assert!(assemble_failed(&long)[0].message.contains("characters"));
}

#[test]
fn comma_shape_errors_are_reported() {
    assert_eq!(assemble_failed(".data 1,,2\nstop\n").len(), 1);
    assert_eq!(assemble_failed(".data ,1\nstop\n").len(), 1);
    assert_eq!(assemble_failed(".data 1,\nstop\n").len(), 1);
    assert_eq!(assemble_failed("mov r1,, r2\nstop\n").len(), 1);
}

#[test]
fn unknown_directive_is_reported() {
    let diagnostics = assemble_failed(".word 5\nstop\n");

    assert!(diagnostics[0].message.contains(".word"));
}

#[test]
fn unterminated_string_is_reported() {
    let diagnostics = assemble_failed(".string \"abc\nstop\n");

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 1);
}
