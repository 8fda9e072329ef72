use super::*;
use crate::registers::*;
use log::{debug, info, trace};
use std::fmt;

pub(super) const NPC_MASK: u32 = 0o37777;
/* set in a micro stack entry when returning through it advances LC */
pub(super) const SPC_ADVANCE_LC: u32 = 1 << 14;
const MD_READ_DELAY: u8 = 2;

#[derive(Debug, Default, Clone, Copy)]
pub(super) struct Pipeline {
    pub p0: MicroInstruction,
    pub p0_pc: u32,
    pub p1: MicroInstruction,
    pub p1_pc: u32,
    pub npc: u32,
    pub inhibit: bool,
}

/// Operand and result latches of the current step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Datapath {
    pub a_data: u32,
    pub m_data: u32,
    pub alu_out: u32,
    pub alu_carry: u32,
    pub old_q: u32,
    pub popj: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingRead {
    value: u32,
    delay: u8,
}

/// The microcode sequencer: a two stage fetch/execute pipeline over the
/// machine state.
pub struct MicrocodeEngine {
    pub state: MachineState,
    pub(super) pipeline: Pipeline,
    pub(super) datapath: Datapath,
    pending_md: Option<PendingRead>,
    pub(super) halted: bool,
    prom_disabled: bool,
    cycles: u64,
}

impl Default for MicrocodeEngine {
    fn default() -> Self {
        Self::new(MachineState::default())
    }
}

impl MicrocodeEngine {
    pub fn new(state: MachineState) -> Self {
        Self {
            state,
            pipeline: Pipeline::default(),
            datapath: Datapath::default(),
            pending_md: None,
            halted: false,
            prom_disabled: false,
            cycles: 0,
        }
    }

    /// Empties the pipeline and restarts fetching at micro address 0.
    pub fn reset(&mut self) {
        self.pipeline = Pipeline::default();
        self.datapath = Datapath::default();
        self.pending_md = None;
        self.halted = false;
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn npc(&self) -> u32 {
        self.pipeline.npc
    }

    pub fn set_npc(&mut self, npc: u32) {
        self.pipeline.npc = npc & NPC_MASK;
    }

    /// Micro address of the instruction executed by the last step.
    pub fn pc(&self) -> u32 {
        self.pipeline.p0_pc
    }

    pub fn datapath(&self) -> Datapath {
        self.datapath
    }

    /// True once after the Unibus mode register switched the PROM off.
    pub fn take_prom_disabled(&mut self) -> bool {
        std::mem::take(&mut self.prom_disabled)
    }

    fn fetch(&self, addr: u32) -> MicroInstruction {
        let registers = &self.state.registers;
        if registers.prom_enabled {
            MicroInstruction(registers.read_prom(addr))
        } else {
            MicroInstruction(registers.read_instruction(addr))
        }
    }

    fn advance_pipeline(&mut self) {
        let next = self.fetch(self.pipeline.npc);
        let pipeline = &mut self.pipeline;
        pipeline.p0 = pipeline.p1;
        pipeline.p0_pc = pipeline.p1_pc;
        pipeline.p1 = next;
        pipeline.p1_pc = pipeline.npc;
        pipeline.npc = pipeline.npc.wrapping_add(1);
    }

    fn land_pending_read(&mut self) {
        if let Some(mut pending) = self.pending_md.take() {
            pending.delay -= 1;
            if pending.delay == 0 {
                self.state.registers.set_md(pending.value);
            } else {
                self.pending_md = Some(pending);
            }
        }
    }

    fn merge_oa(&mut self) {
        let registers = &mut self.state.registers;
        if registers.oa_lo_pending {
            debug!("merging oa lo 0o{:o}", registers.mfmem[MF_OA_LO]);
            registers.oa_lo_pending = false;
            self.pipeline.p0.0 |= registers.mfmem[MF_OA_LO] as u64;
        }
        if registers.oa_hi_pending {
            debug!("merging oa hi 0o{:o}", registers.mfmem[MF_OA_HI]);
            registers.oa_hi_pending = false;
            self.pipeline.p0.0 |= (registers.mfmem[MF_OA_HI] as u64) << 26;
        }
    }

    /// Executes one microinstruction.
    pub fn step(&mut self) {
        if self.halted {
            return;
        }
        self.cycles += 1;

        self.advance_pipeline();
        self.land_pending_read();
        if self.pipeline.inhibit {
            debug!("inhibit, npc 0o{:o}", self.pipeline.npc);
            self.pipeline.inhibit = false;
            self.advance_pipeline();
        }
        self.merge_oa();
        self.state.history.pc.record(self.pipeline.p0_pc);

        let ir = self.pipeline.p0;
        trace!("0o{:05o} {}", self.pipeline.p0_pc, ir);
        self.datapath.popj = ir.popj();
        self.datapath.a_data = self.state.registers.read_a(ir.a_address());
        self.datapath.m_data = if ir.m_functional() {
            self.mfread(ir.m_address())
        } else {
            self.state.registers.read_m(ir.m_address())
        };

        match ir.operation() {
            Operation::Alu => self.alu(ir),
            Operation::Jump => self.jump(ir),
            Operation::Dispatch => self.dispatch(ir),
            Operation::Byte => self.byte(ir),
        }

        if self.datapath.popj {
            let mut npc = self.state.registers.spc.pop();
            if npc & SPC_ADVANCE_LC != 0 {
                debug!("popj advances lc");
                npc = self.advance_lc(npc);
            }
            self.pipeline.npc = npc & NPC_MASK;
        }
    }

    /// Virtual read on behalf of the microcode. A fault latches the page in
    /// OPC and reads as 0, the jump unit sees it through the fault flags.
    pub(super) fn vm_read(&mut self, vaddr: u32) -> u32 {
        let MachineState {
            registers,
            mmu,
            interrupts,
            ..
        } = &mut self.state;

        match mmu.read(vaddr, interrupts) {
            Ok(word) => word,
            Err(fault) => {
                registers.opc = fault.page;
                0
            }
        }
    }

    pub(super) fn vm_write(&mut self, vaddr: u32, value: u32) {
        let MachineState {
            registers,
            mmu,
            interrupts,
            ..
        } = &mut self.state;

        if let Err(fault) = mmu.write(vaddr, value, interrupts) {
            registers.opc = fault.page;
        }

        if mmu.bus.unibus.take_prom_disable() {
            info!("prom disabled at micro pc 0o{:o}", self.pipeline.p0_pc);
            registers.prom_enabled = false;
            self.prom_disabled = true;
        }
    }

    /// Starts a memory read, MD is loaded two steps later.
    pub(super) fn start_read(&mut self, vaddr: u32) {
        let value = self.vm_read(vaddr);
        self.pending_md = Some(PendingRead {
            value,
            delay: MD_READ_DELAY,
        });
    }

    pub(super) fn write_dest(&mut self, dest: u32, value: u32) {
        if dest & 0o4000 != 0 {
            self.state.registers.write_a(dest & 0o3777, value);
            return;
        }
        self.mfwrite(dest, value);
        self.state.registers.write_m(dest & 0o37, value);
        self.state.registers.write_a(dest & 0o37, value);
    }

    pub fn poll_devices(&mut self) {
        let MachineState {
            mmu, interrupts, ..
        } = &mut self.state;
        mmu.poll_devices(interrupts);
    }
}

impl fmt::Debug for MicrocodeEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MicrocodeEngine")
            .field("pc", &format_args!("0o{:o}", self.pipeline.p0_pc))
            .field("npc", &format_args!("0o{:o}", self.pipeline.npc))
            .field("halted", &self.halted)
            .field("cycles", &self.cycles)
            .field("registers", &self.state.registers)
            .finish()
    }
}
