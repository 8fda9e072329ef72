//! Functional register file: the M side sources and the destinations that
//! have side effects.

use super::*;
use crate::history::{PdlAccess, PdlRecord};
use crate::registers::*;
use log::{debug, warn};

const SPC_DATA_MASK: u32 = 0o777777;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfSource {
    DispatchConstant,
    MicroStack,
    PdlPointer,
    PdlIndex,
    PdlByIndex,
    Opc,
    Q,
    Vma,
    MapData,
    Md,
    Lc,
    MicroStackPop,
    PdlByPointerPop,
    PdlByPointer,
    Zero,
    Unknown(u32),
}

impl MfSource {
    pub fn from_address(addr: u32) -> MfSource {
        match addr & 0o37 {
            0 => MfSource::DispatchConstant,
            1 => MfSource::MicroStack,
            2 => MfSource::PdlPointer,
            3 => MfSource::PdlIndex,
            5 => MfSource::PdlByIndex,
            6 => MfSource::Opc,
            7 => MfSource::Q,
            0o10 => MfSource::Vma,
            0o11 => MfSource::MapData,
            0o12 => MfSource::Md,
            0o13 => MfSource::Lc,
            0o14 => MfSource::MicroStackPop,
            0o15 | 0o26 => MfSource::Zero,
            0o24 => MfSource::PdlByPointerPop,
            0o25 => MfSource::PdlByPointer,
            other => MfSource::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfDestination {
    None,
    Lc,
    InterruptControl,
    PdlByPointer,
    PdlByPointerPush,
    PdlByIndex,
    PdlIndex,
    PdlPointer,
    MicroStackPush,
    OaLow,
    OaHigh,
    Vma,
    VmaStartRead,
    VmaStartWrite,
    VmaWriteMap,
    Md,
    MdStartRead,
    MdStartWrite,
    MdWriteMap,
    Unknown(u32),
}

impl MfDestination {
    /// Decodes the functional part (bits 5..10) of a destination field.
    pub fn from_destination(dest: u32) -> MfDestination {
        match dest >> 5 {
            0 => MfDestination::None,
            1 => MfDestination::Lc,
            2 => MfDestination::InterruptControl,
            0o10 => MfDestination::PdlByPointer,
            0o11 => MfDestination::PdlByPointerPush,
            0o12 => MfDestination::PdlByIndex,
            0o13 => MfDestination::PdlIndex,
            0o14 => MfDestination::PdlPointer,
            0o15 => MfDestination::MicroStackPush,
            0o16 => MfDestination::OaLow,
            0o17 => MfDestination::OaHigh,
            0o20 => MfDestination::Vma,
            0o21 => MfDestination::VmaStartRead,
            0o22 => MfDestination::VmaStartWrite,
            0o23 => MfDestination::VmaWriteMap,
            0o30 => MfDestination::Md,
            0o31 => MfDestination::MdStartRead,
            0o32 => MfDestination::MdStartWrite,
            0o33 => MfDestination::MdWriteMap,
            other => MfDestination::Unknown(other),
        }
    }
}

impl MicrocodeEngine {
    fn trace_pdl(&mut self, access: PdlAccess, index: u32, value: u32) {
        let record = PdlRecord::new(
            access,
            self.pipeline.npc,
            index,
            value,
            self.state.registers.lc(),
        );
        self.state.history.pdl.record(record);
    }

    fn micro_stack_word(&self) -> u32 {
        let spc = &self.state.registers.spc;

        ((spc.head() as u32) << 24) | (spc.top() & SPC_DATA_MASK)
    }

    pub(super) fn mfread(&mut self, addr: u32) -> u32 {
        let source = MfSource::from_address(addr);

        match source {
            MfSource::DispatchConstant => self.state.registers.mfmem[MF_DISPATCH_CONSTANT],
            MfSource::MicroStack => self.micro_stack_word(),
            MfSource::PdlPointer => self.state.registers.pdl_pointer(),
            MfSource::PdlIndex => self.state.registers.pdl_index(),
            MfSource::PdlByIndex => {
                let index = self.state.registers.pdl_index();
                let value = self.state.registers.pdl.get(index as usize);
                self.trace_pdl(PdlAccess::ReadByIndex, index, value);
                value
            }
            MfSource::Opc => self.state.registers.opc,
            MfSource::Q => self.state.registers.q,
            MfSource::Vma => self.state.registers.vma(),
            MfSource::MapData => self.state.mmu.map_data(self.state.registers.md()),
            MfSource::Md => self.state.registers.md(),
            MfSource::Lc => {
                let registers = &self.state.registers;
                if registers.byte_mode() {
                    registers.lc()
                } else {
                    registers.lc() & !1
                }
            }
            MfSource::MicroStackPop => {
                let word = self.micro_stack_word();
                self.state.registers.spc.pop();
                word
            }
            MfSource::PdlByPointerPop => {
                let pointer = self.state.registers.pdl_pointer();
                let value = self.state.registers.pdl.get(pointer as usize);
                self.trace_pdl(PdlAccess::PopByPointer, pointer, value);
                self.state
                    .registers
                    .set_pdl_pointer(pointer.wrapping_sub(1));
                value
            }
            MfSource::PdlByPointer => {
                let pointer = self.state.registers.pdl_pointer();
                let value = self.state.registers.pdl.get(pointer as usize);
                self.trace_pdl(PdlAccess::ReadByPointer, pointer, value);
                value
            }
            MfSource::Zero => 0,
            MfSource::Unknown(index) => {
                warn!("unknown functional source 0o{:o}", index);
                0
            }
        }
    }

    pub(super) fn mfwrite(&mut self, dest: u32, data: u32) {
        let destination = MfDestination::from_destination(dest);

        match destination {
            MfDestination::None => (),
            MfDestination::Lc => {
                let registers = &mut self.state.registers;
                let mut lc = (registers.lc() & !LC_MASK) | (data & LC_MASK);
                if !registers.byte_mode() {
                    lc &= !1;
                }
                registers.set_lc(lc | LC_NEED_FETCH);
                debug!("lc <- 0o{:o}", data & LC_MASK);
            }
            MfDestination::InterruptControl => {
                let registers = &mut self.state.registers;
                registers.interrupt_control = data;
                let flags = 0o17 << 26;
                registers.set_lc((registers.lc() & !flags) | (data & flags));
                debug!("ic <- {}", registers.format_interrupt_control());
            }
            MfDestination::PdlByPointer => {
                let pointer = self.state.registers.pdl_pointer();
                self.trace_pdl(PdlAccess::WriteByPointer, pointer, data);
                self.state.registers.pdl.set(pointer as usize, data);
            }
            MfDestination::PdlByPointerPush => {
                let pointer = self.state.registers.pdl_pointer().wrapping_add(1) & PDL_MASK;
                self.state.registers.set_pdl_pointer(pointer);
                self.trace_pdl(PdlAccess::PushByPointer, pointer, data);
                self.state.registers.pdl.set(pointer as usize, data);
            }
            MfDestination::PdlByIndex => {
                let index = self.state.registers.pdl_index();
                self.trace_pdl(PdlAccess::WriteByIndex, index, data);
                self.state.registers.pdl.set(index as usize, data);
            }
            MfDestination::PdlIndex => self.state.registers.set_pdl_index(data),
            MfDestination::PdlPointer => self.state.registers.set_pdl_pointer(data),
            MfDestination::MicroStackPush => self.state.registers.spc.push(data),
            MfDestination::OaLow => {
                let registers = &mut self.state.registers;
                registers.mfmem[MF_OA_LO] = data & 0o377777777;
                registers.oa_lo_pending = true;
            }
            MfDestination::OaHigh => {
                let registers = &mut self.state.registers;
                registers.mfmem[MF_OA_HI] = data;
                registers.oa_hi_pending = true;
            }
            MfDestination::Vma => self.state.registers.set_vma(data),
            MfDestination::VmaStartRead => {
                self.state.registers.set_vma(data);
                self.start_read(data);
            }
            MfDestination::VmaStartWrite => {
                self.state.registers.set_vma(data);
                let md = self.state.registers.md();
                self.vm_write(data, md);
            }
            MfDestination::VmaWriteMap => {
                self.state.registers.set_vma(data);
                let md = self.state.registers.md();
                self.state.mmu.write_map(md, data);
            }
            MfDestination::Md => self.state.registers.set_md(data),
            MfDestination::MdStartRead => {
                self.state.registers.set_md(data);
                let vma = self.state.registers.vma();
                self.start_read(vma);
            }
            MfDestination::MdStartWrite => {
                self.state.registers.set_md(data);
                let vma = self.state.registers.vma();
                self.vm_write(vma, data);
            }
            MfDestination::MdWriteMap => {
                self.state.registers.set_md(data);
                let vma = self.state.registers.vma();
                self.state.mmu.write_map(data, vma);
            }
            MfDestination::Unknown(code) => {
                warn!("unknown functional destination 0o{:o} <- 0o{:o}", code, data)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ACCESS_BIT;
    use crate::microcode::engine::tests::get_engine;

    #[test]
    fn test_source_table() {
        assert_eq!(MfSource::PdlByIndex, MfSource::from_address(5));
        assert_eq!(MfSource::Unknown(4), MfSource::from_address(4));
        assert_eq!(MfSource::Zero, MfSource::from_address(0o26));
        assert_eq!(MfSource::Md, MfSource::from_address(0o52));
        assert_eq!(MfDestination::MdStartWrite, MfDestination::from_destination(0o32 << 5 | 7));
        assert_eq!(MfDestination::Unknown(0o24), MfDestination::from_destination(0o24 << 5));
    }

    #[test]
    fn test_pdl_push_and_pop() {
        let mut engine = get_engine(&[]);
        engine.mfwrite(0o14 << 5, 0o1777);
        engine.mfwrite(0o11 << 5, 0o42);
        assert_eq!(0, engine.state.registers.pdl_pointer());
        assert_eq!(0o42, engine.mfread(0o25));
        assert_eq!(0o42, engine.mfread(0o24));
        assert_eq!(0o1777, engine.mfread(2));

        engine.mfwrite(0o13 << 5, 0);
        engine.mfwrite(0o12 << 5, 7);
        assert_eq!(7, engine.mfread(5));
        assert_eq!(
            Some(PdlAccess::ReadByIndex),
            engine.state.history.pdl.latest().access()
        );
    }

    #[test]
    fn test_micro_stack_word() {
        let mut engine = get_engine(&[]);
        engine.mfwrite(0o15 << 5, 0o123);
        assert_eq!((1 << 24) | 0o123, engine.mfread(1));
        assert_eq!((1 << 24) | 0o123, engine.mfread(0o14));
        assert_eq!(0, engine.state.registers.spc.head());
    }

    #[test]
    fn test_lc_write_sets_need_fetch() {
        let mut engine = get_engine(&[]);
        engine.mfwrite(1 << 5, 0o101);
        assert_eq!(LC_NEED_FETCH | 0o100, engine.state.registers.lc());
        assert_eq!(LC_NEED_FETCH | 0o100, engine.mfread(0o13));

        engine.mfwrite(2 << 5, IC_LC_BYTE_MODE);
        engine.mfwrite(1 << 5, 0o101);
        assert_eq!(
            LC_NEED_FETCH | IC_LC_BYTE_MODE | 0o101,
            engine.state.registers.lc()
        );
    }

    #[test]
    fn test_memory_write_through_md() {
        let mut engine = get_engine(&[]);
        engine.mfwrite(0o20 << 5, 0o1003);
        engine.mfwrite(0o32 << 5, 0o4444);
        assert_eq!(0o4444, engine.state.mmu.physical.read(2, 3).unwrap());
        assert_eq!(0o4444, engine.state.registers.md());
    }

    #[test]
    fn test_faulting_write_latches_opc() {
        let mut engine = get_engine(&[]);
        engine.state.mmu.map.write_l2(0o20, ACCESS_BIT | 0o33);
        engine.mfwrite(0o30 << 5, 1);
        engine.mfwrite(0o22 << 5, 0o10000);
        assert_eq!(0o33, engine.mfread(6));
        assert!(engine.state.mmu.faults().write_fault);
        assert_eq!(1 << 31, engine.mfread(0o11) & (1 << 31));
    }

    #[test]
    fn test_write_map_through_vma() {
        let mut engine = get_engine(&[]);
        engine.mfwrite(0o30 << 5, 0o20000);
        engine.mfwrite(0o23 << 5, (3 << 27) | (1 << 26));
        assert_eq!(3, engine.state.mmu.map.l1()[1]);
        assert_eq!(3, (engine.mfread(0o11) >> 24) & 0o37);
    }
}
