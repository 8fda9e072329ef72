use std::fmt;

pub const MAGIC: Tag = Tag(*b"LMDF");
pub const VERSION: u32 = 1;

/// Four character segment identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const PDL_INDEX: Tag = Tag(*b"PDLI");
    pub const PDL_POINTER: Tag = Tag(*b"PDLP");
    pub const LC: Tag = Tag(*b"LCLV");
    pub const LC_HISTORY: Tag = Tag(*b"LCHL");
    pub const MICRO_PC: Tag = Tag(*b"MCPC");
    pub const MICRO_STACK_POINTER: Tag = Tag(*b"USTP");
    pub const MD: Tag = Tag(*b"RMD_");
    pub const VMA: Tag = Tag(*b"RVMA");
    pub const Q: Tag = Tag(*b"RQ__");
    pub const OPC: Tag = Tag(*b"ROPC");
    pub const OA_LO: Tag = Tag(*b"ROAL");
    pub const OA_HI: Tag = Tag(*b"ROAH");
    pub const INTERRUPT_CONTROL: Tag = Tag(*b"RIC_");
    pub const INTERRUPT_STATUS: Tag = Tag(*b"ISTS");
    pub const DISPATCH_MEMORY: Tag = Tag(*b"DMEM");
    pub const INSTRUCTION_MEMORY: Tag = Tag(*b"IMEM");
    pub const MICRO_STACK: Tag = Tag(*b"USTK");
    pub const PC_HISTORY: Tag = Tag(*b"PCHL");
    pub const PDL_HISTORY: Tag = Tag(*b"PDHL");
    pub const L1_MAP: Tag = Tag(*b"L1MP");
    pub const L2_MAP: Tag = Tag(*b"L2MP");
    pub const PDL: Tag = Tag(*b"PDLM");
    pub const A_MEMORY: Tag = Tag(*b"AMEM");
    pub const M_MEMORY: Tag = Tag(*b"MMEM");
    pub const PHYSICAL_MEMORY: Tag = Tag(*b"PMEM");
    pub const EOF: Tag = Tag(*b"EOF_");
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic()) {
            write!(f, "{}", String::from_utf8_lossy(&self.0))
        } else {
            write!(f, "0x{}", hex::encode(self.0))
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}
