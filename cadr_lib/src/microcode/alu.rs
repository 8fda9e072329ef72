use super::*;
use log::{debug, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub out: u32,
    pub carry: u32,
}

/* 33 bit sum, bit 32 is the carry out */
fn add33(x: u32, y: u32, carry_in: bool) -> AluResult {
    let sum = x as u64 + y as u64 + carry_in as u64;

    AluResult {
        out: sum as u32,
        carry: ((sum >> 32) & 1) as u32,
    }
}

/* x - y - 1 + carry_in, computed the way the adder does it */
fn sub33(x: u32, y: u32, carry_in: bool) -> AluResult {
    add33(x, !y, carry_in)
}

fn abs32(value: u32) -> u32 {
    (value as i32).unsigned_abs()
}

fn logic(op: u32, m: u32, a: u32) -> u32 {
    match op {
        0o00 => 0,
        0o01 => m & a,
        0o02 => m & !a,
        0o03 => m,
        0o04 => !m & a,
        0o05 => a,
        0o06 => m ^ a,
        0o07 => m | a,
        0o10 => !a & !m,
        0o11 => (m == a) as u32,
        0o12 => !a,
        0o13 => m | !a,
        0o14 => !m,
        0o15 => !m | a,
        0o16 => !m | !a,
        _ => !0,
    }
}

/// Addend pair of the arithmetic functions, the sum also takes the carry in.
fn arithmetic_operands(op: u32, m: u32, a: u32) -> (u32, u32) {
    match op {
        0o21 => (m & a, !0),
        0o22 => (m & !a, !0),
        0o23 => (m, !0),
        0o24 => (m | !a, 0),
        0o25 => (m | !a, m & a),
        0o26 => (m, !a),
        0o27 => (m | !a, m),
        0o30 => (m | a, 0),
        0o31 => (m, a),
        0o32 => (m | a, m & !a),
        0o33 => (m | a, m),
        0o34 => (m, 0),
        0o35 => (m, m & a),
        0o36 => (m, m | !a),
        _ => (m, m),
    }
}

/// Computes one ALU function. `previous` is the ALU output of the last
/// operation, used by the remainder correction step. Unknown functions
/// return `None`.
pub fn alu_compute(
    op: u32,
    m: u32,
    a: u32,
    carry_in: bool,
    q: u32,
    previous: u32,
) -> Option<AluResult> {
    let q_low = q & 1 != 0;

    let result = match op {
        0o00..=0o17 => AluResult {
            out: logic(op, m, a),
            carry: 0,
        },
        // all ones, or zero with carry in; never carries out
        0o20 => AluResult {
            out: if carry_in { 0 } else { !0 },
            carry: 0,
        },
        0o21..=0o37 => {
            let (x, y) = arithmetic_operands(op, m, a);
            add33(x, y, carry_in)
        }
        // multiply step
        0o40 if q_low => add33(a, m, carry_in),
        0o40 => AluResult {
            out: m,
            carry: m >> 31,
        },
        // divide step
        0o41 if q_low => sub33(m, abs32(a), !carry_in),
        0o41 => add33(m, abs32(a), carry_in),
        // remainder correction
        0o45 if q_low => AluResult {
            out: previous,
            carry: 0,
        },
        0o45 => add33(previous, abs32(a), carry_in),
        // first divide step
        0o51 => sub33(m, abs32(a), !carry_in),
        _ => return None,
    };

    Some(result)
}

impl MicrocodeEngine {
    pub(super) fn alu(&mut self, ir: MicroInstruction) {
        let op = ir.alu_op();
        let datapath = &mut self.datapath;
        let q = self.state.registers.q;

        match alu_compute(
            op,
            datapath.m_data,
            datapath.a_data,
            ir.carry_in(),
            q,
            datapath.alu_out,
        ) {
            Some(result) => {
                datapath.alu_out = result.out;
                datapath.alu_carry = result.carry;
            }
            None => {
                warn!("unknown alu op 0o{:o} at 0o{:o}", op, self.pipeline.p0_pc);
                datapath.alu_out = 0;
                datapath.alu_carry = 0;
            }
        }

        datapath.old_q = q;
        let alu_out = datapath.alu_out;
        self.state.registers.q = match ir.q_control() {
            1 => (q << 1) | (alu_out & 0x8000_0000 == 0) as u32,
            2 => (q >> 1) | ((alu_out & 1) << 31),
            3 => alu_out,
            _ => q,
        };

        let out = match ir.output_select() {
            0 => {
                debug!("alu output select 0 at 0o{:o}", self.pipeline.p0_pc);
                rol32(datapath.m_data, ir.rotation())
            }
            1 => alu_out,
            2 => (alu_out >> 1) | (datapath.alu_carry << 31),
            _ => (alu_out << 1) | (datapath.old_q >> 31),
        };

        self.write_dest(ir.destination(), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::microcode::engine::tests::get_engine;
    use crate::microcode::instruction::tests::*;

    #[test]
    fn test_add_with_carry_in() {
        assert_eq!(
            Some(AluResult { out: 1, carry: 1 }),
            alu_compute(0o31, 0xFFFF_FFFF, 1, true, 0, 0)
        );
        assert_eq!(
            Some(AluResult { out: 5, carry: 0 }),
            alu_compute(0o31, 2, 3, false, 0, 0)
        );
    }

    #[test]
    fn test_minus_one() {
        assert_eq!(
            Some(AluResult { out: !0, carry: 0 }),
            alu_compute(0o20, 5, 3, false, 0, 0)
        );
        assert_eq!(
            Some(AluResult { out: 0, carry: 0 }),
            alu_compute(0o20, 5, 3, true, 0, 0)
        );
    }

    #[test]
    fn test_equality() {
        assert_eq!(1, alu_compute(0o11, 7, 7, false, 0, 0).unwrap().out);
        assert_eq!(0, alu_compute(0o11, 7, 6, true, 0, 0).unwrap().out);
    }

    #[test]
    fn test_subtract() {
        // M-A-1 without carry in, M-A with it; no borrow sets the carry
        assert_eq!(
            Some(AluResult { out: 1, carry: 1 }),
            alu_compute(0o26, 5, 3, false, 0, 0)
        );
        assert_eq!(
            Some(AluResult { out: 2, carry: 1 }),
            alu_compute(0o26, 5, 3, true, 0, 0)
        );
        assert_eq!(
            Some(AluResult {
                out: 0xFFFF_FFFE,
                carry: 0
            }),
            alu_compute(0o26, 3, 5, true, 0, 0)
        );
    }

    #[test]
    fn test_logic_table() {
        let (m, a) = (0b1100, 0b1010);
        assert_eq!(0b1000, logic(0o01, m, a));
        assert_eq!(0b0100, logic(0o02, m, a));
        assert_eq!(0b0110, logic(0o06, m, a));
        assert_eq!(0b1110, logic(0o07, m, a));
        assert_eq!(!0b1110, logic(0o10, m, a));
        assert_eq!(!0, logic(0o17, m, a));
    }

    #[test]
    fn test_multiply_and_divide_steps() {
        // Q bit 0 clear: pass M through, carry is its sign
        assert_eq!(
            Some(AluResult {
                out: 0x8000_0000,
                carry: 1
            }),
            alu_compute(0o40, 0x8000_0000, 9, false, 0, 0)
        );
        assert_eq!(
            Some(AluResult { out: 12, carry: 0 }),
            alu_compute(0o40, 3, 9, false, 1, 0)
        );
        // divide steps work on the magnitude of A
        assert_eq!(7, alu_compute(0o41, 10, -3i32 as u32, false, 1, 0).unwrap().out);
        assert_eq!(13, alu_compute(0o41, 10, -3i32 as u32, false, 0, 0).unwrap().out);
        assert_eq!(7, alu_compute(0o51, 10, 3, false, 0, 0).unwrap().out);
        assert_eq!(
            Some(AluResult { out: 4, carry: 0 }),
            alu_compute(0o45, 0, 3, false, 1, 4)
        );
        assert_eq!(7, alu_compute(0o45, 0, 3, false, 0, 4).unwrap().out);
        assert_eq!(None, alu_compute(0o42, 0, 0, false, 0, 0));
    }

    fn alu_op(function: u64, q_control: u64, output: u64, dest: u64) -> u64 {
        function_bits(function) | q_control | (output << 12) | destination(dest) | a_source(1) | m_source(2)
    }

    fn function_bits(function: u64) -> u64 {
        op(Operation::Alu) | (function << 3)
    }

    #[test]
    fn test_q_control_and_output_select() {
        let program = [
            alu_op(0o31, 3, 1, 0o4010), // Q <- M+A
            alu_op(0o31, 1, 2, 0o4011), // Q << 1, out = (M+A) >> 1
            alu_op(0o03, 2, 3, 0o4012), // Q >> 1, out = M << 1 | old Q sign
        ];
        let mut engine = get_engine(&program);
        engine.state.registers.write_a(1, 0x4000_0000);
        engine.state.registers.write_m(2, 0xC000_0000);

        engine.step();
        engine.step();
        assert_eq!(0x0000_0000, engine.state.registers.q);
        assert_eq!(1, engine.datapath().alu_carry);

        engine.step();
        // M+A wraps to 0 with carry: Q gets 0 << 1 | 1, carry shifts back in
        assert_eq!(1, engine.state.registers.q);
        assert_eq!(0x8000_0000, engine.state.registers.read_a(0o11));

        engine.state.registers.q = 0x8000_0000;
        engine.step();
        // M = 0xC000_0000 has bit 0 clear, old Q sign shifts in
        assert_eq!(0x4000_0000, engine.state.registers.q);
        assert_eq!(0x8000_0001, engine.state.registers.read_a(0o12));
    }

    #[test]
    fn test_unknown_op_outputs_zero() {
        let mut engine = get_engine(&[alu_op(0o77, 0, 1, 0o4010)]);
        engine.state.registers.write_a(0o10, 5);
        engine.step();
        engine.step();
        assert_eq!(0, engine.state.registers.read_a(0o10));
    }
}
