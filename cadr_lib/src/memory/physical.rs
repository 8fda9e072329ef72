use super::*;
use std::collections::BTreeMap;
use std::fmt;

/// One page of RAM, zero filled on creation.
#[derive(Clone, PartialEq, Eq)]
pub struct PhysicalPage {
    words: Box<[u32; PAGE_SIZE]>,
}

impl Default for PhysicalPage {
    fn default() -> Self {
        Self {
            words: Box::new([0x00; PAGE_SIZE]),
        }
    }
}

impl PhysicalPage {
    pub fn words(&self) -> &[u32] {
        &self.words[..]
    }

    pub fn read(&self, offset: u32) -> Result<u32> {
        self.words
            .get(offset as usize)
            .copied()
            .ok_or(MemoryError::OffsetOutOfRange(offset))
    }

    pub fn write(&mut self, offset: u32, word: u32) -> Result<()> {
        match self.words.get_mut(offset as usize) {
            Some(slot) => {
                *slot = word;
                Ok(())
            }
            None => Err(MemoryError::OffsetOutOfRange(offset)),
        }
    }

    pub fn load(&mut self, words: &[u32]) {
        self.words
            .iter_mut()
            .zip(words.iter())
            .for_each(|(slot, word)| *slot = *word);
    }
}

/// Sparse RAM: pages come to life on first reference and never above the
/// configured budget.
pub struct PhysicalMemory {
    pages: BTreeMap<u32, PhysicalPage>,
    budget: u32,
}

impl Default for PhysicalMemory {
    fn default() -> Self {
        Self::new(DEFAULT_RAM_PAGES)
    }
}

impl PhysicalMemory {
    pub fn new(budget: u32) -> Self {
        Self {
            pages: BTreeMap::new(),
            budget,
        }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    fn check(&self, pn: u32) -> Result<()> {
        if pn >= self.budget {
            Err(MemoryError::PageOutOfRange(pn, self.budget))
        } else {
            Ok(())
        }
    }

    pub fn get_or_create_page(&mut self, pn: u32) -> Result<&mut PhysicalPage> {
        self.check(pn)?;

        Ok(self.pages.entry(pn).or_default())
    }

    /// Non allocating lookup.
    pub fn page(&self, pn: u32) -> Option<&PhysicalPage> {
        self.pages.get(&pn)
    }

    pub fn read(&mut self, pn: u32, offset: u32) -> Result<u32> {
        self.get_or_create_page(pn)?.read(offset)
    }

    pub fn write(&mut self, pn: u32, offset: u32, word: u32) -> Result<()> {
        self.get_or_create_page(pn)?.write(offset, word)
    }

    pub fn allocated_pages(&self) -> usize {
        self.pages.len()
    }
}

impl fmt::Debug for PhysicalMemory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PhysicalMemory {{ {} of {} pages allocated }}",
            self.pages.len(),
            self.budget
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_are_created_zeroed() {
        let mut memory = PhysicalMemory::new(16);
        assert_eq!(0, memory.allocated_pages());
        assert_eq!(0, memory.read(3, 0o377).unwrap());
        assert_eq!(1, memory.allocated_pages());
        assert!(memory.page(3).is_some());
        assert!(memory.page(4).is_none());
    }

    #[test]
    fn test_budget_is_a_hard_limit() {
        let mut memory = PhysicalMemory::new(16);
        memory.write(15, 1, 0xcafe).unwrap();
        assert_eq!(
            Err(MemoryError::PageOutOfRange(16, 16)),
            memory.write(16, 1, 0xcafe)
        );
        assert_eq!(Err(MemoryError::PageOutOfRange(17, 16)), memory.read(17, 0));
        assert_eq!(1, memory.allocated_pages());
    }

    #[test]
    fn test_offset_past_page() {
        let mut memory = PhysicalMemory::new(1);
        assert_eq!(
            Err(MemoryError::OffsetOutOfRange(256)),
            memory.write(0, 256, 1)
        );
    }
}
