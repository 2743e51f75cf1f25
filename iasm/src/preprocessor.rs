use std::collections::HashMap;

use crate::diagnostics::Diagnostic;
use crate::labels;
use crate::source;

/// Lines retained per macro body; anything beyond the cap is dropped
/// with a diagnostic.
pub const MACRO_BODY_CAP: usize = 64;

const MACRO_START: &str = "macr";
const MACRO_END: &str = "endmacr";

struct Definition<'i> {
    /// `None` when the `macr` line itself was rejected; the body is then
    /// consumed and discarded.
    name: Option<&'i str>,
    body: Vec<&'i str>,
}

/// Expands `macr` definitions, producing the text written to the `.am`
/// file and consumed by both assembler passes.
///
/// A definition opens with `macr <name>` and closes with `endmacr`;
/// neither line is emitted. Between them every line is collected
/// verbatim. Outside a definition, a line whose first token names a
/// known macro is replaced by the whole stored body; bodies are not
/// re-scanned, so definitions neither nest nor expand recursively.
pub fn expand(file: &str, source_text: &str) -> (String, Vec<Diagnostic>) {
    let mut macros: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut output = String::new();
    let mut diagnostics = Vec::new();
    let mut current: Option<Definition> = None;

    for line in source::lines(source_text) {
        let mut tokens = line.content.split_whitespace();
        let head = tokens.next();

        if current.is_some() {
            if head == Some(MACRO_END) {
                let definition = current.take().unwrap();
                if let Some(name) = definition.name {
                    macros.insert(name, definition.body);
                }
            } else {
                let definition = current.as_mut().unwrap();
                if definition.body.len() == MACRO_BODY_CAP {
                    diagnostics.push(Diagnostic::new(
                        file,
                        line.number,
                        format!("macro body exceeds {} lines; line dropped", MACRO_BODY_CAP),
                    ));
                } else {
                    definition.body.push(line.content);
                }
            }
            continue;
        }

        match head {
            Some(MACRO_START) => {
                let name = match tokens.next() {
                    Some(name) => match check_name(name) {
                        Ok(()) => Some(name),
                        Err(problem) => {
                            diagnostics.push(Diagnostic::new(
                                file,
                                line.number,
                                format!("bad macro name: {}", problem),
                            ));
                            None
                        }
                    },
                    None => {
                        diagnostics.push(Diagnostic::new(
                            file,
                            line.number,
                            "macro definition is missing a name".to_owned(),
                        ));
                        None
                    }
                };
                current = Some(Definition {
                    name,
                    body: Vec::new(),
                });
            }
            Some(name) if macros.contains_key(name) => {
                for body_line in &macros[name] {
                    output.push_str(body_line);
                    output.push('\n');
                }
            }
            _ => {
                output.push_str(line.content);
                output.push('\n');
            }
        }
    }

    (output, diagnostics)
}

fn check_name(name: &str) -> Result<(), String> {
    if name == MACRO_START || name == MACRO_END {
        return Err(format!("`{}` cannot name a macro", name));
    }
    labels::validate(name)
}

#[cfg(test)]
mod test {
    use super::*;

    fn expand_clean(source: &str) -> String {
        let (output, diagnostics) = expand("test.as", source);
        assert!(diagnostics.is_empty());
        output
    }

    #[test]
    fn definition_is_not_emitted() {
        let source = "macr M\ninc r0\nendmacr\nstop\n";

        assert_eq!(expand_clean(source), "stop\n");
    }

    #[test]
    fn invocation_copies_the_body() {
        let source = "macr M\ninc r0\ninc r1\nendmacr\nM\nstop\nM\n";

        assert_eq!(expand_clean(source), "inc r0\ninc r1\nstop\ninc r0\ninc r1\n");
    }

    #[test]
    fn body_is_not_rescanned() {
        // N's body invokes M, but bodies are copied verbatim: the inner
        // M is expanded only when N's copy is read again by a later
        // tool, not here.
        let source = "macr M\ninc r0\nendmacr\nmacr N\nM\nendmacr\nN\n";

        assert_eq!(expand_clean(source), "M\n");
    }

    #[test]
    fn invocation_must_lead_the_line() {
        let source = "macr M\ninc r0\nendmacr\nclr M\n";

        assert_eq!(expand_clean(source), "clr M\n");
    }

    #[test]
    fn missing_name_is_reported() {
        let (_, diagnostics) = expand("test.as", "macr\ninc r0\nendmacr\n");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 1);
    }

    #[test]
    fn reserved_name_is_reported_and_body_discarded() {
        let (output, diagnostics) = expand("test.as", "macr mov\ninc r0\nendmacr\nmov r1, r2\n");

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(output, "mov r1, r2\n");
    }

    #[test]
    fn overlong_body_is_truncated() {
        let mut source = String::from("macr M\n");
        for _ in 0..MACRO_BODY_CAP + 2 {
            source.push_str("inc r0\n");
        }
        source.push_str("endmacr\nM\n");

        let (output, diagnostics) = expand("test.as", &source);

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(output.lines().count(), MACRO_BODY_CAP);
    }

    #[test]
    fn expansion_is_idempotent() {
        let source = "macr M\ninc r0\ninc r1\nendmacr\nM\nstop\n";
        let (first, _) = expand("test.as", source);
        let (second, _) = expand("test.am", &first);

        assert_eq!(first, second);
    }
}
