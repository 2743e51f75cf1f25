use icpu::{Directive, Mnemonic, RegisterId};

/// Longest accepted label or macro name.
pub const MAX_NAME_LENGTH: usize = 31;

/// A name is reserved when it collides with anything the parser could
/// read as a token of the language: a mnemonic, a register, a directive
/// name or a register-indirect form.
pub fn is_reserved_word(name: &str) -> bool {
    name.parse::<Mnemonic>().is_ok()
        || name.parse::<RegisterId>().is_ok()
        || name.parse::<Directive>().is_ok()
        || is_indirect_form(name)
}

fn is_indirect_form(name: &str) -> bool {
    name.starts_with('*') && name[1..].parse::<RegisterId>().is_ok()
}

/// Checks a label or macro name: a letter followed by letters and
/// digits, at most [`MAX_NAME_LENGTH`](constant.MAX_NAME_LENGTH.html)
/// characters, and not a reserved word. The error value is a bare
/// message; callers put it in context.
pub fn validate(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().map_or(false, |c| c.is_ascii_alphabetic());

    if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric()) {
        Err(format!("`{}` is not a valid name", name))
    } else if name.len() > MAX_NAME_LENGTH {
        Err(format!(
            "`{}` is longer than {} characters",
            name, MAX_NAME_LENGTH
        ))
    } else if is_reserved_word(name) {
        Err(format!("`{}` is a reserved word", name))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert!(validate("LOOP").is_ok());
        assert!(validate("x1y2").is_ok());
        assert!(validate("Mov").is_ok());
        assert!(validate("r10").is_ok());
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(validate("").is_err());
        assert!(validate("1abc").is_err());
        assert!(validate("a_b").is_err());
        assert!(validate("a.b").is_err());
    }

    #[test]
    fn rejects_overlong_names() {
        let name = "a".repeat(MAX_NAME_LENGTH);
        assert!(validate(&name).is_ok());
        assert!(validate(&format!("{}a", name)).is_err());
    }

    #[test]
    fn rejects_reserved_words() {
        assert!(validate("mov").is_err());
        assert!(validate("stop").is_err());
        assert!(validate("r3").is_err());
        assert!(validate("data").is_err());
        assert!(validate("entry").is_err());
    }
}
