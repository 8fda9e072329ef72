use super::*;
use log::{debug, warn};

/// Mask of `width_m1 + 1` bits starting at `pos`, wrapping at bit 31.
fn field_mask(pos: u32, width_m1: u32) -> u32 {
    let left_index = (pos + width_m1) & 0o37;
    let left_mask = !0u32 >> (31 - left_index);
    let right_mask = !0u32 << pos;

    left_mask & right_mask
}

impl MicrocodeEngine {
    pub(super) fn byte(&mut self, ir: MicroInstruction) {
        let dest = ir.destination();
        let mode = ir.field(12, 2);
        let width_m1 = ir.field(5, 5);
        let pos = match ir.form() {
            3 => self.lc_byte_position(ir),
            _ => ir.field(0, 5),
        };

        let mask = field_mask(if mode & 2 != 0 { pos } else { 0 }, width_m1);
        let a = self.datapath.a_data;
        let m = self.datapath.m_data;

        let out = match mode {
            // load byte and deposit byte rotate M first
            1 | 3 => (rol32(m, pos) & mask) | (a & !mask),
            2 => (m & mask) | (a & !mask),
            _ => {
                warn!("byte operation with mode 0 at 0o{:o}", self.pipeline.p0_pc);
                0
            }
        };
        debug!(
            "byte mode {} pos 0o{:o} mask 0o{:o} -> 0o{:o}",
            mode, pos, mask, out
        );

        self.write_dest(dest, out);
    }
}
