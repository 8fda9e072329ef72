//! Macro instruction location counter.

use super::*;
use crate::history::LcRecord;
use crate::registers::*;
use log::debug;

impl MicrocodeEngine {
    /// Byte position selected by LC inside the fetched word, for the dispatch
    /// and byte forms that take their position from LC.
    pub(super) fn lc_byte_position(&self, ir: MicroInstruction) -> u32 {
        let lc = self.state.registers.lc();
        let ir4 = ir.field(4, 1);
        let lc1 = (lc >> 1) & 1;

        if self.state.registers.byte_mode() {
            let ir3 = ir.field(3, 1);
            let lc0 = lc & 1;

            ir.field(0, 3) | ((ir4 ^ (lc1 ^ lc0)) << 4) | ((ir3 ^ lc0) << 3)
        } else {
            ir.field(0, 4) | (((ir4 ^ lc1) == 0) as u32) << 4
        }
    }

    fn record_lc_history(&mut self) {
        let lc = self.state.registers.lc();
        let instruction = self
            .state
            .mmu
            .peek((lc & LC_MASK) >> 2)
            .map(|word| if lc & 2 != 0 { word >> 16 } else { word & 0xffff })
            .unwrap_or_default();

        self.state.history.lc.record(LcRecord { lc, instruction });
    }

    /// Moves LC to the next macro instruction, fetching the next word when
    /// the current one is used up. Without a fetch, bit 1 of the returned
    /// micro address is forced on so the caller skips the fetch sequence.
    pub(super) fn advance_lc(&mut self, return_pc: u32) -> u32 {
        self.record_lc_history();
        let mut return_pc = return_pc;
        let byte_mode = self.state.registers.byte_mode();
        let old_lc = self.state.registers.lc() & LC_MASK;
        let step = if byte_mode { 1 } else { 2 };
        let mut lc = self.state.registers.lc().wrapping_add(step);

        if lc & LC_NEED_FETCH != 0 {
            lc &= !LC_NEED_FETCH;
            self.state.registers.set_lc(lc);
            self.state.registers.set_vma(old_lc >> 2);
            self.start_read(old_lc >> 2);
            debug!("advance lc: fetch at vma 0o{:o}", old_lc >> 2);
        } else {
            return_pc |= 2;
        }

        let lc0b = byte_mode && lc & 1 != 0;
        let lc1 = lc & 2 != 0;
        if !lc0b && !lc1 {
            lc |= LC_NEED_FETCH;
        }
        self.state.registers.set_lc(lc);

        return_pc
    }
}
