use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Alu,
    Jump,
    Dispatch,
    Byte,
}

/// A 48 bit microinstruction, kept in the low bits of a u64.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MicroInstruction(pub u64);

impl MicroInstruction {
    /// `len` bits starting at bit `pos`.
    pub fn field(&self, pos: u32, len: u32) -> u32 {
        ((self.0 >> pos) & ((1u64 << len) - 1)) as u32
    }

    pub fn bit(&self, pos: u32) -> bool {
        (self.0 >> pos) & 1 != 0
    }

    pub fn operation(&self) -> Operation {
        match self.field(43, 2) {
            0 => Operation::Alu,
            1 => Operation::Jump,
            2 => Operation::Dispatch,
            _ => Operation::Byte,
        }
    }

    pub fn popj(&self) -> bool {
        self.bit(42)
    }

    pub fn a_address(&self) -> u32 {
        self.field(32, 10)
    }

    pub fn m_address(&self) -> u32 {
        self.field(26, 5)
    }

    /// M source is the functional register file rather than M memory.
    pub fn m_functional(&self) -> bool {
        self.bit(31)
    }

    /// Bits 10..11, selects the variant of jump, dispatch and byte forms.
    pub fn form(&self) -> u32 {
        self.field(10, 2)
    }

    /// Bits 14..25, shared by ALU and byte operations.
    pub fn destination(&self) -> u32 {
        self.field(14, 12)
    }

    pub fn alu_op(&self) -> u32 {
        self.field(3, 6)
    }

    pub fn carry_in(&self) -> bool {
        self.bit(2)
    }

    pub fn q_control(&self) -> u32 {
        self.field(0, 2)
    }

    pub fn output_select(&self) -> u32 {
        self.field(12, 2)
    }

    /// Low five bits, the rotate count of M.
    pub fn rotation(&self) -> u32 {
        self.field(0, 5)
    }
}

impl fmt::Display for MicroInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mnemonic = match self.operation() {
            Operation::Alu => "ALU",
            Operation::Jump => "JUMP",
            Operation::Dispatch => "DISP",
            Operation::Byte => "BYTE",
        };
        write!(
            f,
            "{:<4} a=0o{:04o} m={}0o{:02o} {:016o}{}",
            mnemonic,
            self.a_address(),
            if self.m_functional() { "mf:" } else { "" },
            self.m_address(),
            self.0,
            if self.popj() { " popj" } else { "" },
        )
    }
}
