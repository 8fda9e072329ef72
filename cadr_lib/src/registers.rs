use crate::ring::Ring;
use std::fmt;

pub const A_MEMORY_SIZE: usize = 1024;
pub const M_MEMORY_SIZE: usize = 32;
pub const MF_MEMORY_SIZE: usize = 32;
pub const SPC_STACK_SIZE: usize = 32;
pub const PDL_SIZE: usize = 1024;
pub const DISPATCH_MEMORY_SIZE: usize = 2048;
pub const INSTRUCTION_MEMORY_SIZE: usize = 16384;
pub const PROM_SIZE: usize = 512;

/* fixed slots of the functional register file */
pub const MF_DISPATCH_CONSTANT: usize = 0;
pub const MF_LC: usize = 1;
pub const MF_PDL_INDEX: usize = 0o13;
pub const MF_PDL_POINTER: usize = 0o14;
pub const MF_OA_LO: usize = 0o16;
pub const MF_OA_HI: usize = 0o17;
pub const MF_VMA: usize = 0o20;
pub const MF_MD: usize = 0o30;

/* interrupt control register */
pub const IC_SEQUENCE_BREAK: u32 = 1 << 26;
pub const IC_INTERRUPT_ENABLE: u32 = 1 << 27;
pub const IC_BUS_RESET: u32 = 1 << 28;
pub const IC_LC_BYTE_MODE: u32 = 1 << 29;

/* location counter */
pub const LC_MASK: u32 = 0o377777777;
pub const LC_NEED_FETCH: u32 = 1 << 31;

pub const PDL_MASK: u32 = 0o1777;

/// Register files of the processor.
#[derive(Clone, PartialEq, Eq)]
pub struct MachineRegisters {
    pub amem: Vec<u32>,
    pub mmem: [u32; M_MEMORY_SIZE],
    pub mfmem: [u32; MF_MEMORY_SIZE],
    pub spc: Ring<u32, SPC_STACK_SIZE>,
    pub pdl: Ring<u32, PDL_SIZE>,
    pub dmem: Vec<u32>,
    pub imem: Vec<u64>,
    pub prom: Vec<u64>,
    pub q: u32,
    pub opc: u32,
    pub interrupt_control: u32,
    pub prom_enabled: bool,
    pub oa_lo_pending: bool,
    pub oa_hi_pending: bool,
}

impl Default for MachineRegisters {
    fn default() -> Self {
        Self {
            amem: vec![0; A_MEMORY_SIZE],
            mmem: [0; M_MEMORY_SIZE],
            mfmem: [0; MF_MEMORY_SIZE],
            spc: Ring::new(),
            pdl: Ring::new(),
            dmem: vec![0; DISPATCH_MEMORY_SIZE],
            imem: vec![0; INSTRUCTION_MEMORY_SIZE],
            prom: vec![0; PROM_SIZE],
            q: 0,
            opc: 0,
            interrupt_control: 0,
            prom_enabled: true,
            oa_lo_pending: false,
            oa_hi_pending: false,
        }
    }
}

impl MachineRegisters {
    pub fn read_a(&self, addr: u32) -> u32 {
        self.amem[addr as usize % A_MEMORY_SIZE]
    }

    pub fn write_a(&mut self, addr: u32, value: u32) {
        self.amem[addr as usize % A_MEMORY_SIZE] = value;
    }

    pub fn read_m(&self, addr: u32) -> u32 {
        self.mmem[addr as usize % M_MEMORY_SIZE]
    }

    pub fn write_m(&mut self, addr: u32, value: u32) {
        self.mmem[addr as usize % M_MEMORY_SIZE] = value;
    }

    pub fn read_dispatch(&self, addr: u32) -> u32 {
        self.dmem[addr as usize % DISPATCH_MEMORY_SIZE]
    }

    pub fn write_dispatch(&mut self, addr: u32, value: u32) {
        self.dmem[addr as usize % DISPATCH_MEMORY_SIZE] = value;
    }

    pub fn read_instruction(&self, addr: u32) -> u64 {
        self.imem[addr as usize % INSTRUCTION_MEMORY_SIZE]
    }

    pub fn write_instruction(&mut self, addr: u32, value: u64) {
        self.imem[addr as usize % INSTRUCTION_MEMORY_SIZE] = value;
    }

    pub fn read_prom(&self, addr: u32) -> u64 {
        self.prom[addr as usize % PROM_SIZE]
    }

    pub fn lc(&self) -> u32 {
        self.mfmem[MF_LC]
    }

    pub fn set_lc(&mut self, value: u32) {
        self.mfmem[MF_LC] = value;
    }

    pub fn md(&self) -> u32 {
        self.mfmem[MF_MD]
    }

    pub fn set_md(&mut self, value: u32) {
        self.mfmem[MF_MD] = value;
    }

    pub fn vma(&self) -> u32 {
        self.mfmem[MF_VMA]
    }

    pub fn set_vma(&mut self, value: u32) {
        self.mfmem[MF_VMA] = value;
    }

    pub fn pdl_pointer(&self) -> u32 {
        self.mfmem[MF_PDL_POINTER] & PDL_MASK
    }

    pub fn set_pdl_pointer(&mut self, value: u32) {
        self.mfmem[MF_PDL_POINTER] = value & PDL_MASK;
    }

    pub fn pdl_index(&self) -> u32 {
        self.mfmem[MF_PDL_INDEX] & PDL_MASK
    }

    pub fn set_pdl_index(&mut self, value: u32) {
        self.mfmem[MF_PDL_INDEX] = value & PDL_MASK;
    }

    pub fn byte_mode(&self) -> bool {
        self.interrupt_control & IC_LC_BYTE_MODE != 0
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupt_control & IC_INTERRUPT_ENABLE != 0
    }

    pub fn sequence_break(&self) -> bool {
        self.interrupt_control & IC_SEQUENCE_BREAK != 0
    }

    pub fn format_interrupt_control(&self) -> String {
        let flags = [
            (IC_LC_BYTE_MODE, 'B'),
            (IC_BUS_RESET, 'R'),
            (IC_INTERRUPT_ENABLE, 'I'),
            (IC_SEQUENCE_BREAK, 'S'),
        ];

        flags
            .iter()
            .map(|(bit, c)| {
                if self.interrupt_control & bit != 0 {
                    *c
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    }
}

impl fmt::Debug for MachineRegisters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Registers [LC=0o{:o}][VMA=0o{:o}][MD=0o{:o}][Q=0o{:o}][OPC=0o{:o}][PDL={}/{}][SPC={}][IC={}]",
            self.lc() & LC_MASK,
            self.vma(),
            self.md(),
            self.q,
            self.opc,
            self.pdl_pointer(),
            self.pdl_index(),
            self.spc.head(),
            self.format_interrupt_control(),
        )
    }
}
