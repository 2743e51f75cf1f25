use matches::debug_assert_matches;

/// Role of a symbol-table entry.
///
/// `Code`, `Data` and `External` are primary definitions; at most one of
/// them may exist per name. `Entry` shadows an existing `Code` or `Data`
/// definition to mark it exported, and `ExternalRef` records one use
/// site of an `External` name, so both may repeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Code,
    Data,
    External,
    ExternalRef,
    Entry,
}

impl SymbolKind {
    fn is_primary(self) -> bool {
        match self {
            SymbolKind::Code | SymbolKind::Data | SymbolKind::External => true,
            SymbolKind::ExternalRef | SymbolKind::Entry => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub value: i32,
    pub kind: SymbolKind,
}

/// The symbol table of one translation unit.
///
/// Entries are kept ordered by ascending value at all times, which is the
/// order the output files want, so emission can iterate directly.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            symbols: Vec::new(),
        }
    }

    /// Adds a primary definition. Fails when the name already has one.
    pub fn define(&mut self, name: &str, value: i32, kind: SymbolKind) -> Result<(), String> {
        debug_assert!(kind.is_primary());

        if self.primary(name).is_some() {
            return Err(format!("symbol `{}` is already defined", name));
        }
        self.insert(name, value, kind);
        Ok(())
    }

    /// Adds an auxiliary `Entry` or `ExternalRef` record. The caller is
    /// responsible for the matching primary definition.
    pub fn attach(&mut self, name: &str, value: i32, kind: SymbolKind) {
        debug_assert_matches!(kind, SymbolKind::Entry | SymbolKind::ExternalRef);
        self.insert(name, value, kind);
    }

    fn insert(&mut self, name: &str, value: i32, kind: SymbolKind) {
        let at = self
            .symbols
            .iter()
            .take_while(|symbol| symbol.value <= value)
            .count();
        self.symbols.insert(
            at,
            Symbol {
                name: name.to_owned(),
                value,
                kind,
            },
        );
    }

    /// The primary (`Code`, `Data` or `External`) entry for a name.
    pub fn primary(&self, name: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|symbol| symbol.kind.is_primary() && symbol.name == name)
    }

    pub fn contains(&self, name: &str, kind: SymbolKind) -> bool {
        self.symbols
            .iter()
            .any(|symbol| symbol.kind == kind && symbol.name == name)
    }

    /// Shifts the value of every entry of `kind` and restores value
    /// order. Used to rebase data symbols above the code segment once
    /// the final instruction counter is known.
    pub fn rebase(&mut self, kind: SymbolKind, offset: i32) {
        for symbol in &mut self.symbols {
            if symbol.kind == kind {
                symbol.value += offset;
            }
        }
        self.symbols.sort_by_key(|symbol| symbol.value);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn of_kind(&self, kind: SymbolKind) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(move |symbol| symbol.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
