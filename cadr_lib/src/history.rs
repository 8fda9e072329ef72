//! Trace rings kept for post mortem inspection and saved with checkpoints.

use crate::ring::Ring;
use std::fmt;

pub const PC_HISTORY_SIZE: usize = 4096;
pub const LC_HISTORY_SIZE: usize = 20000;
pub const PDL_HISTORY_SIZE: usize = 4096;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LcRecord {
    pub lc: u32,
    /// Macro instruction word under LC, if the page was resident.
    pub instruction: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdlAccess {
    ReadByPointer,
    PopByPointer,
    ReadByIndex,
    WriteByPointer,
    PushByPointer,
    WriteByIndex,
}

impl PdlAccess {
    fn code(self) -> u32 {
        match self {
            PdlAccess::ReadByPointer => 1,
            PdlAccess::PopByPointer => 2,
            PdlAccess::ReadByIndex => 3,
            PdlAccess::WriteByPointer => 4,
            PdlAccess::PushByPointer => 5,
            PdlAccess::WriteByIndex => 6,
        }
    }

    fn from_code(code: u32) -> Option<PdlAccess> {
        match code {
            1 => Some(PdlAccess::ReadByPointer),
            2 => Some(PdlAccess::PopByPointer),
            3 => Some(PdlAccess::ReadByIndex),
            4 => Some(PdlAccess::WriteByPointer),
            5 => Some(PdlAccess::PushByPointer),
            6 => Some(PdlAccess::WriteByIndex),
            _ => None,
        }
    }
}

/// One PDL access. The access kind and the micro PC share the first word so
/// a record fits four checkpoint words.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PdlRecord {
    pub access_npc: u32,
    pub index: u32,
    pub value: u32,
    pub lc: u32,
}

impl PdlRecord {
    pub fn new(access: PdlAccess, npc: u32, index: u32, value: u32, lc: u32) -> Self {
        Self {
            access_npc: (access.code() << 24) | (npc & 0o77777777),
            index,
            value,
            lc,
        }
    }

    pub fn access(&self) -> Option<PdlAccess> {
        PdlAccess::from_code(self.access_npc >> 24)
    }

    pub fn npc(&self) -> u32 {
        self.access_npc & 0o77777777
    }

    pub fn to_words(self) -> [u32; 4] {
        [self.access_npc, self.index, self.value, self.lc]
    }

    pub fn from_words(words: &[u32]) -> Self {
        let word = |i: usize| words.get(i).copied().unwrap_or_default();

        Self {
            access_npc: word(0),
            index: word(1),
            value: word(2),
            lc: word(3),
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct History {
    pub pc: Ring<u32, PC_HISTORY_SIZE>,
    pub lc: Ring<LcRecord, LC_HISTORY_SIZE>,
    pub pdl: Ring<PdlRecord, PDL_HISTORY_SIZE>,
}

impl History {
    pub fn last_pc(&self) -> u32 {
        self.pc.latest()
    }

    /// The `count` most recent micro PCs, newest last.
    pub fn recent_pcs(&self, count: usize) -> Vec<u32> {
        let skip = PC_HISTORY_SIZE.saturating_sub(count);

        self.pc.oldest_first().skip(skip).collect()
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "History {{ last pc=0o{:o}, last lc=0o{:o} }}",
            self.pc.latest(),
            self.lc.latest().lc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdl_record_packing() {
        let record = PdlRecord::new(PdlAccess::PushByPointer, 0o17777, 0o12, 0o345, 0o100);
        assert_eq!(Some(PdlAccess::PushByPointer), record.access());
        assert_eq!(0o17777, record.npc());
        assert_eq!(record, PdlRecord::from_words(&record.to_words()));
        assert_eq!(None, PdlRecord::default().access());
    }

    #[test]
    fn test_recent_pcs() {
        let mut history = History::default();
        for pc in 0..10 {
            history.pc.record(pc);
        }
        assert_eq!(9, history.last_pc());
        assert_eq!(vec![7, 8, 9], history.recent_pcs(3));
    }
}
