use super::engine::{NPC_MASK, SPC_ADVANCE_LC};
use super::*;
use log::{debug, info, warn};

impl MicrocodeEngine {
    fn jump_condition(&self, ir: MicroInstruction) -> bool {
        let m = self.datapath.m_data;
        let a = self.datapath.a_data;

        if !ir.bit(5) {
            return rol32(m, ir.rotation()) & 1 != 0;
        }

        let registers = &self.state.registers;
        let page_fault = self.state.mmu.faults().page_fault;
        let interrupt = registers.interrupts_enabled() && self.state.interrupts.pending();

        match ir.field(0, 4) {
            1 => m < a,
            2 => m <= a,
            3 => m == a,
            4 => page_fault,
            5 => page_fault || interrupt,
            6 => page_fault || interrupt || registers.sequence_break(),
            7 => true,
            other => {
                warn!(
                    "unknown jump condition 0o{:o} at 0o{:o}",
                    other, self.pipeline.p0_pc
                );
                false
            }
        }
    }

    pub(super) fn jump(&mut self, ir: MicroInstruction) {
        let mut target = ir.field(12, 14);
        let r = ir.bit(9);
        let p = ir.bit(8);
        let n = ir.bit(7);
        let invert = ir.bit(6);

        match ir.form() {
            1 => {
                info!("halted at micro pc 0o{:o}", self.pipeline.p0_pc);
                self.halted = true;
                return;
            }
            3 => warn!("jump with form 3 at 0o{:o}", self.pipeline.p0_pc),
            _ => (),
        }

        // P and R together write the instruction memory
        if p && r {
            let word = (((self.datapath.a_data & 0o177777) as u64) << 32) | self.datapath.m_data as u64;
            debug!("imem[0o{:o}] <- 0o{:o}", target, word);
            self.state.registers.write_instruction(target, word);
            return;
        }

        let condition = self.jump_condition(ir) != invert;

        if p && condition {
            let npc = if n {
                self.pipeline.npc.wrapping_sub(1)
            } else {
                self.pipeline.npc
            };
            self.state.registers.spc.push(npc);
        }
        if r && condition {
            target = self.state.registers.spc.pop();
            if target & SPC_ADVANCE_LC != 0 {
                target = self.advance_lc(target);
            }
            target &= NPC_MASK;
        }
        if condition {
            if n {
                self.pipeline.inhibit = true;
            }
            self.pipeline.npc = target;
            self.datapath.popj = false;
        }
    }
}
