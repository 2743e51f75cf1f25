use icpu::constants::IC_ORIGIN;
use icpu::{MachineWord, Value, Word};

/// The instruction image, indexed by `IC - 100`. A `None` slot is space
/// reserved by the first pass for a direct-address operand; the second
/// pass fills every one of them (or reports the symbol as undefined).
#[derive(Debug, Default)]
pub struct CodeImage {
    slots: Vec<Option<MachineWord>>,
}

impl CodeImage {
    pub fn new() -> CodeImage {
        CodeImage { slots: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn push(&mut self, word: MachineWord) {
        self.slots.push(Some(word));
    }

    /// Reserves the next slot for a word that is not known yet.
    pub fn reserve(&mut self) {
        self.slots.push(None);
    }

    /// The word at an absolute address, `None` when the slot is reserved
    /// or out of range.
    pub fn at(&self, address: u32) -> Option<MachineWord> {
        self.slots
            .get((address - IC_ORIGIN) as usize)
            .copied()
            .flatten()
    }

    pub fn fill(&mut self, address: u32, word: MachineWord) {
        self.slots[(address - IC_ORIGIN) as usize] = Some(word);
    }

    /// Number of still-reserved slots.
    pub fn unresolved(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    /// Packs every slot for output. Must only be called once all
    /// reserved slots have been filled.
    pub fn finalize(self) -> Vec<Word> {
        self.slots
            .into_iter()
            .map(|slot| slot.unwrap().pack())
            .collect()
    }
}

/// The data image: the raw values collected from `.data` and `.string`
/// directives, in declaration order.
#[derive(Debug, Default)]
pub struct DataImage {
    values: Vec<Value>,
}

impl DataImage {
    pub fn new() -> DataImage {
        DataImage { values: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn values(&self) -> &[Value] {
        &self.values[..]
    }

    pub fn finalize(self) -> Vec<Word> {
        self.values.into_iter().map(|value| value as Word).collect()
    }
}
