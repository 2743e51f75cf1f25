use num::traits::ToPrimitive;
use num_derive::{FromPrimitive, ToPrimitive};
use util::EnumFromStr;
use util_derive::EnumFromStr;

/// Operand addressing modes and the 2-bit codes they encode to.
///
/// | Code | Source form | Meaning                                      |
/// |------|-------------|----------------------------------------------|
/// | 0    | `#n`        | immediate literal                            |
/// | 1    | `label`     | direct; the symbol's address follows the code word |
/// | 2    | `*rN`       | register indirect; the register index goes into the following word |
/// | 3    | `rN`        | register; the index sits in the code word itself |
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum AddressingMode {
    Immediate,
    Direct,
    Indirect,
    Register,
}

/// The eight general purpose registers, spelled `r0`-`r7` in source.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive, EnumFromStr)]
pub enum RegisterId {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

/// Instruction mnemonics.
///
/// Several mnemonics share an opcode and are told apart by `funct`; the
/// full encoding is given by [`opcode`](#method.opcode) and
/// [`funct`](#method.funct), the permitted operand shapes by
/// [`operand_count`](#method.operand_count), [`src_modes`](#method.src_modes)
/// and [`dest_modes`](#method.dest_modes).
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
pub enum Mnemonic {
    /// Copy source into destination. `mov <src>, <dest>`
    MOV,
    /// Compare two operands. `cmp <src>, <dest>`
    CMP,
    /// Integer addition. `add <src>, <dest>`
    ADD,
    /// Integer subtraction. `sub <src>, <dest>`
    SUB,
    /// Load effective address of a label. `lea <label>, <dest>`
    LEA,
    /// Clear destination. `clr <dest>`
    CLR,
    /// Bitwise complement. `not <dest>`
    NOT,
    /// Increment. `inc <dest>`
    INC,
    /// Decrement. `dec <dest>`
    DEC,
    /// Unconditional jump. `jmp <target>`
    JMP,
    /// Branch if not equal. `bne <target>`
    BNE,
    /// Jump to subroutine. `jsr <target>`
    JSR,
    /// Read a character into the destination. `red <dest>`
    RED,
    /// Print an operand. `prn <op>`
    PRN,
    /// Return from subroutine. `rts`
    RTS,
    /// Halt the machine. `stop`
    STOP,
}

/// Assembler directives, written with a leading `.` in source.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
pub enum Directive {
    DATA,
    STRING,
    ENTRY,
    EXTERN,
}

const ANY: &[AddressingMode] = &[
    AddressingMode::Immediate,
    AddressingMode::Direct,
    AddressingMode::Indirect,
    AddressingMode::Register,
];

const WRITABLE: &[AddressingMode] = &[
    AddressingMode::Direct,
    AddressingMode::Indirect,
    AddressingMode::Register,
];

const MEMORY: &[AddressingMode] = &[AddressingMode::Direct, AddressingMode::Indirect];

const NONE: &[AddressingMode] = &[];

impl Mnemonic {
    pub fn opcode(self) -> u8 {
        match self {
            Mnemonic::MOV => 0,
            Mnemonic::CMP => 1,
            Mnemonic::ADD | Mnemonic::SUB => 2,
            Mnemonic::LEA => 4,
            Mnemonic::CLR | Mnemonic::NOT | Mnemonic::INC | Mnemonic::DEC => 5,
            Mnemonic::JMP | Mnemonic::BNE | Mnemonic::JSR => 9,
            Mnemonic::RED => 11,
            Mnemonic::PRN => 12,
            Mnemonic::RTS => 14,
            Mnemonic::STOP => 15,
        }
    }

    pub fn funct(self) -> u8 {
        match self {
            Mnemonic::ADD | Mnemonic::CLR | Mnemonic::JMP => 1,
            Mnemonic::SUB | Mnemonic::NOT | Mnemonic::BNE => 2,
            Mnemonic::INC | Mnemonic::JSR => 3,
            Mnemonic::DEC => 4,
            _ => 0,
        }
    }

    pub fn operand_count(self) -> usize {
        match self {
            Mnemonic::MOV | Mnemonic::CMP | Mnemonic::ADD | Mnemonic::SUB | Mnemonic::LEA => 2,
            Mnemonic::RTS | Mnemonic::STOP => 0,
            _ => 1,
        }
    }

    /// Addressing modes accepted for the source operand. Empty for
    /// mnemonics without a source operand.
    pub fn src_modes(self) -> &'static [AddressingMode] {
        match self {
            Mnemonic::MOV | Mnemonic::CMP | Mnemonic::ADD | Mnemonic::SUB => ANY,
            Mnemonic::LEA => MEMORY,
            _ => NONE,
        }
    }

    /// Addressing modes accepted for the destination operand.
    pub fn dest_modes(self) -> &'static [AddressingMode] {
        match self {
            Mnemonic::CMP | Mnemonic::PRN => ANY,
            Mnemonic::MOV
            | Mnemonic::ADD
            | Mnemonic::SUB
            | Mnemonic::LEA
            | Mnemonic::CLR
            | Mnemonic::NOT
            | Mnemonic::INC
            | Mnemonic::DEC
            | Mnemonic::RED => WRITABLE,
            Mnemonic::JMP | Mnemonic::BNE | Mnemonic::JSR => MEMORY,
            Mnemonic::RTS | Mnemonic::STOP => NONE,
        }
    }
}

#[inline]
pub fn enum_to_u32<T: ToPrimitive + Copy>(val: T) -> u32 {
    val.to_u32().unwrap()
}

macro_rules! impl_enum_display {
    ($e:ty) => {
        impl std::fmt::Display for $e {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                std::fmt::Debug::fmt(self, f)
            }
        }
    };
}

impl_enum_display!(AddressingMode);
impl_enum_display!(RegisterId);
impl_enum_display!(Mnemonic);
impl_enum_display!(Directive);

#[inline]
pub fn register_index(id: RegisterId) -> u8 {
    enum_to_u32(id) as u8
}
