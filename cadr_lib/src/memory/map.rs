use super::*;
use log::debug;

pub const L1_MAP_SIZE: usize = 2048;
pub const L2_MAP_SIZE: usize = 1024;

const VADDR_MASK: u32 = 0o77777777;
const FRAMEBUFFER_SENTINEL: u32 = ACCESS_BIT | WRITE_BIT | FRAMEBUFFER_PAGE;
const XBUS_SENTINEL: u32 = ACCESS_BIT | WRITE_BIT | XBUS_PAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Mapped,
    Framebuffer,
    Color,
    Xbus,
}

/// Result of running a virtual address through the map.
///
/// `frame` is the raw level 2 word (or a window sentinel): permission bits 23
/// and 22, map status bits 18 and 19, page number in the low 14 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub frame: u32,
    pub offset: u32,
    pub l1: u32,
    pub window: Window,
}

impl Translation {
    pub fn page_number(&self) -> u32 {
        self.frame & PAGE_NUMBER_MASK
    }

    pub fn can_access(&self) -> bool {
        self.frame & ACCESS_BIT != 0
    }

    pub fn can_write(&self) -> bool {
        self.frame & WRITE_BIT != 0
    }

    pub fn status_bit18(&self) -> u32 {
        (self.frame >> 18) & 1
    }

    pub fn status_bit19(&self) -> u32 {
        (self.frame >> 19) & 1
    }
}

/// The two level page map.
#[derive(Clone, PartialEq, Eq)]
pub struct PageMap {
    l1: Vec<u32>,
    l2: Vec<u32>,
}

impl Default for PageMap {
    fn default() -> Self {
        Self {
            l1: vec![0; L1_MAP_SIZE],
            l2: vec![0; L2_MAP_SIZE],
        }
    }
}

impl PageMap {
    pub fn translate(&self, vaddr: u32) -> Translation {
        let v = vaddr & VADDR_MASK;
        let offset = v & 0o377;

        match v & 0o77700000 {
            0o77000000 => {
                return Translation {
                    frame: FRAMEBUFFER_SENTINEL,
                    offset,
                    l1: 0,
                    window: Window::Framebuffer,
                }
            }
            0o77200000 => {
                return Translation {
                    frame: FRAMEBUFFER_SENTINEL,
                    offset,
                    l1: 0,
                    window: Window::Color,
                }
            }
            _ => (),
        }

        if v & 0o77777400 == 0o77377400 {
            return Translation {
                frame: XBUS_SENTINEL,
                offset,
                l1: 0,
                window: Window::Xbus,
            };
        }

        let l1 = self.l1[((v >> 13) & 0o3777) as usize] & 0o37;
        let frame = self.l2[((l1 << 5) | ((v >> 8) & 0o37)) as usize];

        Translation {
            frame,
            offset,
            l1,
            window: Window::Mapped,
        }
    }

    pub fn write_l1(&mut self, index: usize, value: u32) {
        self.l1[index % L1_MAP_SIZE] = value;
    }

    pub fn write_l2(&mut self, index: usize, value: u32) {
        self.l2[index % L2_MAP_SIZE] = value;
    }

    /// Map write micro-operation: MD holds the virtual address to remap, VMA
    /// bit 26 selects a level 1 update (new entry in bits 27..31), bit 25 a
    /// level 2 update with VMA itself as the entry.
    pub fn write_map(&mut self, md: u32, vma: u32) {
        let l1_index = ((md >> 13) & 0o3777) as usize;

        if (vma >> 26) & 1 != 0 {
            self.l1[l1_index] = (vma >> 27) & 0o37;
            debug!("l1[0o{:o}] <- 0o{:o}", l1_index, self.l1[l1_index]);
        }

        if (vma >> 25) & 1 != 0 {
            let l1 = self.l1[l1_index] & 0o37;
            let l2_index = ((l1 << 5) | ((md >> 8) & 0o37)) as usize;
            self.l2[l2_index] = vma;
            debug!("l2[0o{:o}] <- 0o{:o}", l2_index, vma);
        }
    }

    pub fn l1(&self) -> &[u32] {
        &self.l1
    }

    pub fn l2(&self) -> &[u32] {
        &self.l2
    }

    pub fn load(&mut self, l1: &[u32], l2: &[u32]) {
        self.l1.copy_from_slice(&l1[..L1_MAP_SIZE]);
        self.l2.copy_from_slice(&l2[..L2_MAP_SIZE]);
    }
}
