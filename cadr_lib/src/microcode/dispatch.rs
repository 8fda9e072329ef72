use super::engine::{NPC_MASK, SPC_ADVANCE_LC};
use super::*;
use log::debug;

/* dispatch memory word */
const DISPATCH_N: u32 = 1 << 14;
const DISPATCH_P: u32 = 1 << 15;
const DISPATCH_R: u32 = 1 << 16;

/// Right justified mask of `len` bits.
fn dispatch_mask(len: u32) -> u32 {
    if len == 0 {
        0
    } else {
        !0u32 >> (31 - ((len - 1) & 0o37))
    }
}

impl MicrocodeEngine {
    pub(super) fn dispatch(&mut self, ir: MicroInstruction) {
        let mut pos = ir.field(0, 5);
        let len = ir.field(5, 3);
        let map = ir.field(8, 2);
        let mut disp_addr = ir.field(12, 11);
        let enable_ish = ir.bit(24);
        let n_plus1 = ir.bit(25);
        let disp_const = ir.field(32, 10);

        match ir.form() {
            2 => {
                debug!("dmem[0o{:o}] <- 0o{:o}", disp_addr, self.datapath.a_data);
                self.state
                    .registers
                    .write_dispatch(disp_addr, self.datapath.a_data);
                return;
            }
            3 => pos = self.lc_byte_position(ir),
            _ => (),
        }

        let m_data = rol32(self.datapath.m_data, pos);
        disp_addr |= m_data & dispatch_mask(len);

        if map != 0 {
            let t = self.state.mmu.translate(self.state.registers.md());
            disp_addr |= match map {
                1 => t.status_bit18(),
                2 => t.status_bit19(),
                _ => t.status_bit18() | t.status_bit19(),
            };
        }
        disp_addr &= 0o3777;

        let entry = self.state.registers.read_dispatch(disp_addr);
        self.state.registers.mfmem[crate::registers::MF_DISPATCH_CONSTANT] = disp_const;
        let mut target = entry & NPC_MASK;
        let n = entry & DISPATCH_N != 0;
        let p = entry & DISPATCH_P != 0;
        let r = entry & DISPATCH_R != 0;
        debug!(
            "dispatch[0o{:o}] -> 0o{:o}{}{}{}",
            disp_addr,
            target,
            if n { " N" } else { "" },
            if p { " P" } else { "" },
            if r { " R" } else { "" },
        );

        if n_plus1 && n {
            self.pipeline.npc = self.pipeline.npc.wrapping_sub(1);
        }
        if enable_ish {
            self.advance_lc(0);
        }
        if n {
            self.pipeline.inhibit = true;
        }
        if p && r {
            return;
        }
        if p {
            let npc = if n {
                self.pipeline.npc.wrapping_sub(1)
            } else {
                self.pipeline.npc
            };
            self.state.registers.spc.push(npc);
        }
        if r {
            target = self.state.registers.spc.pop();
            if target & SPC_ADVANCE_LC != 0 {
                target = self.advance_lc(target);
            }
            target &= NPC_MASK;
        }

        self.pipeline.npc = target;
        self.datapath.popj = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ACCESS_BIT, WRITE_BIT};
    use crate::microcode::engine::tests::get_engine;
    use crate::microcode::instruction::tests::*;

    fn dispatch_op(form: u64, len: u64, pos: u64, addr: u64) -> u64 {
        op(Operation::Dispatch) | (form << 10) | (len << 5) | pos | (addr << 12) | m_source(1) | a_source(1)
    }

    #[test]
    fn test_mask() {
        assert_eq!(0, dispatch_mask(0));
        assert_eq!(1, dispatch_mask(1));
        assert_eq!(0o177, dispatch_mask(7));
    }

    #[test]
    fn test_table_load_form() {
        let mut engine = get_engine(&[dispatch_op(2, 0, 0, 0o1234)]);
        engine.state.registers.write_a(1, 0o377777);
        engine.step();
        engine.step();
        assert_eq!(0o377777, engine.state.registers.read_dispatch(0o1234));
        assert_eq!(2, engine.npc());
        assert!(!engine.pipeline.inhibit);
    }

    #[test]
    fn test_table_load_low_entry() {
        let mut engine = get_engine(&[dispatch_op(2, 0, 0, 5)]);
        engine.state.registers.write_a(1, 0x1234);
        engine.step();
        engine.step();
        assert_eq!(0x1234, engine.state.registers.read_dispatch(5));
        assert_eq!(0, engine.state.registers.read_dispatch(4));
        assert_eq!(0, engine.state.registers.read_dispatch(6));
        assert_eq!(2, engine.npc());
        assert_eq!(0, engine.state.registers.spc.head());
    }

    #[test]
    fn test_dispatch_on_field() {
        // two bits of M at position 4 select among four entries at 0o100
        let mut engine = get_engine(&[dispatch_op(0, 2, 28, 0o100) | (0o55 << 32)]);
        engine.state.registers.write_m(1, 0b10 << 4);
        engine.state.registers.write_dispatch(0o102, 0o2000);
        engine.step();
        engine.step();
        assert_eq!(0o2000, engine.npc());
        assert_eq!(0o55, engine.state.registers.mfmem[0]);
    }

    #[test]
    fn test_call_through_dispatch() {
        let mut engine = get_engine(&[dispatch_op(0, 0, 0, 0o10)]);
        engine.state.registers.write_dispatch(0o10, DISPATCH_P | DISPATCH_N | 0o500);
        engine.step();
        engine.step();
        assert_eq!(0o500, engine.npc());
        assert!(engine.pipeline.inhibit);
        // N returns to the instruction after the dispatch
        assert_eq!(1, engine.state.registers.spc.top());
    }

    #[test]
    fn test_return_through_dispatch() {
        let mut engine = get_engine(&[dispatch_op(0, 0, 0, 0o10)]);
        engine.state.registers.write_dispatch(0o10, DISPATCH_R);
        engine.state.registers.spc.push(0o321);
        engine.step();
        engine.step();
        assert_eq!(0o321, engine.npc());
    }

    #[test]
    fn test_map_status_bits() {
        let mut engine = get_engine(&[dispatch_op(0, 0, 0, 0o10) | (3 << 8)]);
        engine.state.mmu.map.write_l2(0, ACCESS_BIT | WRITE_BIT | (1 << 19));
        engine.state.registers.write_dispatch(0o11, 0o700);
        engine.step();
        engine.step();
        assert_eq!(0o700, engine.npc());
    }
}
