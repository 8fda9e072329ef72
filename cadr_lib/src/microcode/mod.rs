use crate::history::History;
use crate::interrupt::InterruptController;
use crate::memory::MemoryTranslationUnit;
use crate::registers::MachineRegisters;

mod alu;
mod byte;
mod dispatch;
mod engine;
mod instruction;
mod jump;
mod lc;
mod regfile;

pub use alu::{alu_compute, AluResult};
pub use engine::{Datapath, MicrocodeEngine};
pub use instruction::{MicroInstruction, Operation};
pub use regfile::{MfDestination, MfSource};

/// Everything the engine mutates while it runs.
#[derive(Debug, Default)]
pub struct MachineState {
    pub registers: MachineRegisters,
    pub mmu: MemoryTranslationUnit,
    pub interrupts: InterruptController,
    pub history: History,
}

impl MachineState {
    pub fn new(ram_pages: u32) -> Self {
        Self {
            mmu: MemoryTranslationUnit::new(ram_pages),
            ..Self::default()
        }
    }
}

pub fn rol32(value: u32, count: u32) -> u32 {
    value.rotate_left(count & 0o37)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn rotate_inverse(value: u32, count in 0u32..32) {
            prop_assert_eq!(value, rol32(rol32(value, count), 32 - count));
        }
    }

    #[test]
    fn test_rol32() {
        assert_eq!(0x0000_0003, rol32(0x8000_0001, 1));
        assert_eq!(0x1234_5678, rol32(0x1234_5678, 0));
    }
}
