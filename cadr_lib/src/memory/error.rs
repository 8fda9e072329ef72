use std::error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    // ↓ physical page number at or over the RAM budget
    PageOutOfRange(u32, u32),
    // ↓ word offset past the end of a page
    OffsetOutOfRange(u32),
}

pub type Result<T> = std::result::Result<T, MemoryError>;

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MemoryError::PageOutOfRange(page, budget) => write!(
                f,
                "physical page 0o{:o} is beyond the RAM budget of {} pages",
                page, budget
            ),
            MemoryError::OffsetOutOfRange(offset) => {
                write!(f, "offset 0o{:o} is outside of a page", offset)
            }
        }
    }
}

impl error::Error for MemoryError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Access,
    Write,
    Capacity,
}

/// A virtual access the map refused. `page` is the resolved physical page
/// number, latched by the engine into OPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationFault {
    pub kind: FaultKind,
    pub vaddr: u32,
    pub page: u32,
}

impl fmt::Display for TranslationFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let what = match self.kind {
            FaultKind::Access => "access fault",
            FaultKind::Write => "write fault",
            FaultKind::Capacity => "page beyond physical memory",
        };
        write!(f, "{} at vaddr 0o{:o} (page 0o{:o})", what, self.vaddr, self.page)
    }
}

impl error::Error for TranslationFault {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

impl std::convert::From<(MemoryError, u32)> for TranslationFault {
    fn from((err, vaddr): (MemoryError, u32)) -> TranslationFault {
        let page = match err {
            MemoryError::PageOutOfRange(page, _) => page,
            MemoryError::OffsetOutOfRange(_) => 0,
        };

        TranslationFault {
            kind: FaultKind::Capacity,
            vaddr,
            page,
        }
    }
}
