/// Longest legal source line, terminator excluded.
pub const MAX_LINE_LENGTH: usize = 80;

/// One physical line of a source file, with its 1-based line number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceLine<'i> {
    pub number: u32,
    pub content: &'i str,
}

impl<'i> SourceLine<'i> {
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Comment lines start with `;` as their first non-blank character.
    pub fn is_comment(&self) -> bool {
        self.content.trim_start().starts_with(';')
    }

    pub fn too_long(&self) -> bool {
        self.content.chars().count() > MAX_LINE_LENGTH
    }
}

pub fn lines(source: &str) -> impl Iterator<Item = SourceLine> {
    source.lines().enumerate().map(|(at, content)| SourceLine {
        number: at as u32 + 1,
        content,
    })
}
