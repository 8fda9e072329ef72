//! Machine state dump and restore, used for warm boots.
//!
//! A checkpoint is a `LMDF` magic and a version word followed by tagged
//! segments (`[tag][word count][words]`, all little endian) and closed by a
//! zero length `EOF_` segment. Segment order is fixed on output; on input
//! unknown tags are skipped.

use crate::history::{
    LcRecord, PdlRecord, LC_HISTORY_SIZE, PC_HISTORY_SIZE, PDL_HISTORY_SIZE,
};
use crate::memory::{L1_MAP_SIZE, L2_MAP_SIZE, PAGE_SIZE};
use crate::microcode::MachineState;
use crate::registers::*;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

mod error;
mod format;
mod io;

pub use error::{CheckpointError, Result};
pub use format::{Tag, MAGIC, VERSION};
use io::{ReadLeExt, WriteLeExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored { pages: u32 },
    AlreadyRestored,
}

/// Expected word count of the fixed size segments.
fn expected_length(tag: Tag, save_pages: u32) -> Option<usize> {
    let len = match tag {
        Tag::PDL_INDEX
        | Tag::PDL_POINTER
        | Tag::LC
        | Tag::MICRO_PC
        | Tag::MICRO_STACK_POINTER
        | Tag::MD
        | Tag::VMA
        | Tag::Q
        | Tag::OPC
        | Tag::OA_LO
        | Tag::OA_HI
        | Tag::INTERRUPT_CONTROL
        | Tag::INTERRUPT_STATUS => 1,
        Tag::LC_HISTORY => LC_HISTORY_SIZE,
        Tag::DISPATCH_MEMORY => DISPATCH_MEMORY_SIZE,
        Tag::INSTRUCTION_MEMORY => INSTRUCTION_MEMORY_SIZE * 2,
        Tag::MICRO_STACK => SPC_STACK_SIZE,
        Tag::PC_HISTORY => PC_HISTORY_SIZE,
        Tag::PDL_HISTORY => PDL_HISTORY_SIZE * 4,
        Tag::L1_MAP => L1_MAP_SIZE,
        Tag::L2_MAP => L2_MAP_SIZE,
        Tag::PDL => PDL_SIZE,
        Tag::A_MEMORY => A_MEMORY_SIZE,
        Tag::M_MEMORY => M_MEMORY_SIZE,
        Tag::PHYSICAL_MEMORY => save_pages as usize * PAGE_SIZE,
        _ => return None,
    };

    Some(len)
}

fn write_segment<W: Write>(w: &mut W, tag: Tag, words: &[u32]) -> Result<()> {
    w.write_tag(tag)?;
    w.write_u32_le(words.len() as u32)?;
    w.write_words(words)?;

    Ok(())
}

fn write_value<W: Write>(w: &mut W, tag: Tag, value: u32) -> Result<()> {
    write_segment(w, tag, &[value])
}

/// Segments read back from a checkpoint, validated but not yet applied.
struct CheckpointImage {
    segments: HashMap<Tag, Vec<u32>>,
}

impl CheckpointImage {
    fn parse<R: Read>(r: &mut R, save_pages: u32) -> Result<Self> {
        let magic = r.read_tag()?;
        if magic != MAGIC {
            return Err(CheckpointError::invalid_magic(magic.0));
        }
        let version = r.read_u32_le()?;
        if version != VERSION {
            return Err(CheckpointError::UnsupportedVersion(version));
        }

        let mut segments = HashMap::new();
        loop {
            let tag = r.read_tag()?;
            let count = r.read_u32_le()?;
            if tag == Tag::EOF {
                if count != 0 {
                    return Err(CheckpointError::Corrupt("EOF_ segment is not empty"));
                }
                break;
            }
            match expected_length(tag, save_pages) {
                Some(expected) if expected != count as usize => {
                    return Err(CheckpointError::SegmentLength {
                        tag,
                        expected,
                        found: count as usize,
                    })
                }
                Some(_) => {
                    segments.insert(tag, r.read_words(count as usize)?);
                }
                None => {
                    debug!("skipping unknown segment {} ({} words)", tag, count);
                    r.skip_words(count)?;
                }
            }
        }

        if !segments.contains_key(&Tag::PHYSICAL_MEMORY) {
            return Err(CheckpointError::MissingSegment(Tag::PHYSICAL_MEMORY));
        }

        Ok(Self { segments })
    }

    fn value(&self, tag: Tag) -> Option<u32> {
        self.segments.get(&tag).map(|words| words[0])
    }

    fn block(&self, tag: Tag) -> Option<&[u32]> {
        self.segments.get(&tag).map(|words| &words[..])
    }

    fn apply(&self, state: &mut MachineState) -> u32 {
        let registers = &mut state.registers;

        if let Some(words) = self.block(Tag::A_MEMORY) {
            registers.amem.copy_from_slice(words);
        }
        if let Some(words) = self.block(Tag::M_MEMORY) {
            registers.mmem.copy_from_slice(words);
        }
        if let Some(words) = self.block(Tag::DISPATCH_MEMORY) {
            registers.dmem.copy_from_slice(words);
        }
        if let Some(words) = self.block(Tag::INSTRUCTION_MEMORY) {
            for (slot, pair) in registers.imem.iter_mut().zip(words.chunks_exact(2)) {
                *slot = ((pair[1] as u64) << 32) | pair[0] as u64;
            }
        }
        if let Some(words) = self.block(Tag::PDL) {
            registers.pdl.load(words);
        }
        if let Some(words) = self.block(Tag::MICRO_STACK) {
            registers.spc.load(words);
        }
        if let Some(v) = self.value(Tag::MICRO_STACK_POINTER) {
            registers.spc.set_head(v as usize);
        }
        if let Some(v) = self.value(Tag::PDL_INDEX) {
            registers.set_pdl_index(v);
        }
        if let Some(v) = self.value(Tag::PDL_POINTER) {
            registers.set_pdl_pointer(v);
        }
        if let Some(v) = self.value(Tag::LC) {
            registers.set_lc(v);
        }
        if let Some(v) = self.value(Tag::MD) {
            registers.set_md(v);
        }
        if let Some(v) = self.value(Tag::VMA) {
            registers.set_vma(v);
        }
        if let Some(v) = self.value(Tag::Q) {
            registers.q = v;
        }
        if let Some(v) = self.value(Tag::OPC) {
            registers.opc = v;
        }
        if let Some(v) = self.value(Tag::OA_LO) {
            registers.mfmem[MF_OA_LO] = v;
        }
        if let Some(v) = self.value(Tag::OA_HI) {
            registers.mfmem[MF_OA_HI] = v;
        }
        if let Some(v) = self.value(Tag::INTERRUPT_CONTROL) {
            registers.interrupt_control = v;
        }
        if let Some(v) = self.value(Tag::INTERRUPT_STATUS) {
            state.interrupts.set_status(v);
        }

        if let Some(words) = self.block(Tag::PC_HISTORY) {
            state.history.pc.load(words);
        }
        if let Some(words) = self.block(Tag::LC_HISTORY) {
            let records: Vec<LcRecord> = words
                .iter()
                .map(|lc| LcRecord {
                    lc: *lc,
                    instruction: 0,
                })
                .collect();
            state.history.lc.load(&records);
        }
        if let Some(words) = self.block(Tag::PDL_HISTORY) {
            let records: Vec<PdlRecord> = words.chunks_exact(4).map(PdlRecord::from_words).collect();
            state.history.pdl.load(&records);
        }

        if let (Some(l1), Some(l2)) = (self.block(Tag::L1_MAP), self.block(Tag::L2_MAP)) {
            state.mmu.map.load(l1, l2);
        }

        let mut pages = 0;
        if let Some(words) = self.block(Tag::PHYSICAL_MEMORY) {
            for (pn, chunk) in words.chunks_exact(PAGE_SIZE).enumerate() {
                match state.mmu.physical.get_or_create_page(pn as u32) {
                    Ok(page) => {
                        page.load(chunk);
                        pages += 1;
                    }
                    Err(e) => {
                        if chunk.iter().any(|w| *w != 0) {
                            warn!("dropping saved page: {}", e);
                        }
                    }
                }
            }
        }

        pages
    }
}

/// Writes and reads checkpoints of a fixed number of RAM pages.
#[derive(Debug)]
pub struct CheckpointCodec {
    save_pages: u32,
    restored: bool,
}

impl CheckpointCodec {
    pub fn new(save_pages: u32) -> Self {
        Self {
            save_pages,
            restored: false,
        }
    }

    pub fn save_pages(&self) -> u32 {
        self.save_pages
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }

    pub fn dump(&self, state: &MachineState, path: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(state, &mut w)?;
        w.flush()?;
        info!("state dumped to {}", path.display());

        Ok(())
    }

    pub fn write_to<W: Write>(&self, state: &MachineState, w: &mut W) -> Result<()> {
        let registers = &state.registers;
        let history = &state.history;

        w.write_tag(MAGIC)?;
        w.write_u32_le(VERSION)?;

        write_value(w, Tag::PDL_INDEX, registers.pdl_index())?;
        write_value(w, Tag::PDL_POINTER, registers.pdl_pointer())?;
        write_value(w, Tag::LC, registers.lc())?;
        let lcs: Vec<u32> = history.lc.oldest_first().map(|record| record.lc).collect();
        write_segment(w, Tag::LC_HISTORY, &lcs)?;
        write_value(w, Tag::MICRO_PC, history.last_pc())?;
        write_value(w, Tag::MICRO_STACK_POINTER, registers.spc.head() as u32)?;
        write_value(w, Tag::MD, registers.md())?;
        write_value(w, Tag::VMA, registers.vma())?;
        write_value(w, Tag::Q, registers.q)?;
        write_value(w, Tag::OPC, registers.opc)?;
        write_value(w, Tag::OA_LO, registers.mfmem[MF_OA_LO])?;
        write_value(w, Tag::OA_HI, registers.mfmem[MF_OA_HI])?;
        write_value(w, Tag::INTERRUPT_CONTROL, registers.interrupt_control)?;
        write_value(w, Tag::INTERRUPT_STATUS, state.interrupts.status())?;

        write_segment(w, Tag::DISPATCH_MEMORY, &registers.dmem)?;
        let imem: Vec<u32> = registers
            .imem
            .iter()
            .flat_map(|word| [*word as u32, (*word >> 32) as u32])
            .collect();
        write_segment(w, Tag::INSTRUCTION_MEMORY, &imem)?;
        write_segment(w, Tag::MICRO_STACK, registers.spc.as_slice())?;

        let pcs: Vec<u32> = history.pc.oldest_first().collect();
        write_segment(w, Tag::PC_HISTORY, &pcs)?;
        let pdl_actions: Vec<u32> = history
            .pdl
            .oldest_first()
            .flat_map(|record| record.to_words())
            .collect();
        write_segment(w, Tag::PDL_HISTORY, &pdl_actions)?;

        write_segment(w, Tag::L1_MAP, state.mmu.map.l1())?;
        write_segment(w, Tag::L2_MAP, state.mmu.map.l2())?;
        write_segment(w, Tag::PDL, registers.pdl.as_slice())?;
        write_segment(w, Tag::A_MEMORY, &registers.amem)?;
        write_segment(w, Tag::M_MEMORY, &registers.mmem)?;

        w.write_tag(Tag::PHYSICAL_MEMORY)?;
        w.write_u32_le(self.save_pages * PAGE_SIZE as u32)?;
        let zero_page = [0u32; PAGE_SIZE];
        for pn in 0..self.save_pages {
            match state.mmu.physical.page(pn) {
                Some(page) => w.write_words(page.words())?,
                None => w.write_words(&zero_page)?,
            }
        }

        w.write_tag(Tag::EOF)?;
        w.write_u32_le(0)?;

        Ok(())
    }

    /// Loads a checkpoint into `state`. The whole file is read and checked
    /// before anything is written; once a restore succeeded, later calls do
    /// nothing.
    pub fn restore(&mut self, state: &mut MachineState, path: &Path) -> Result<RestoreOutcome> {
        if self.restored {
            info!("state already restored, ignoring {}", path.display());
            return Ok(RestoreOutcome::AlreadyRestored);
        }
        let mut r = BufReader::new(File::open(path)?);
        let outcome = self.read_from(state, &mut r)?;
        info!("state restored from {}", path.display());

        Ok(outcome)
    }

    pub fn read_from<R: Read>(
        &mut self,
        state: &mut MachineState,
        r: &mut R,
    ) -> Result<RestoreOutcome> {
        if self.restored {
            return Ok(RestoreOutcome::AlreadyRestored);
        }
        let image = CheckpointImage::parse(r, self.save_pages)?;
        let pages = image.apply(state);
        self.restored = true;

        Ok(RestoreOutcome::Restored { pages })
    }
}
