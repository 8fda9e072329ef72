use super::*;
use log::debug;
use std::fmt;

/// Sticky outcome of the last virtual access, consulted by jump conditions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FaultFlags {
    pub access_fault: bool,
    pub write_fault: bool,
    pub page_fault: bool,
}

/// Virtual memory: the page map in front of RAM and the device pages.
pub struct MemoryTranslationUnit {
    pub map: PageMap,
    pub physical: PhysicalMemory,
    pub bus: DeviceBus,
    faults: FaultFlags,
}

impl Default for MemoryTranslationUnit {
    fn default() -> Self {
        Self::new(DEFAULT_RAM_PAGES)
    }
}

impl MemoryTranslationUnit {
    pub fn new(ram_pages: u32) -> Self {
        Self {
            map: PageMap::default(),
            physical: PhysicalMemory::new(ram_pages),
            bus: DeviceBus::default(),
            faults: FaultFlags::default(),
        }
    }

    pub fn faults(&self) -> FaultFlags {
        self.faults
    }

    pub fn translate(&self, vaddr: u32) -> Translation {
        self.map.translate(vaddr)
    }

    fn fault(&mut self, kind: FaultKind, vaddr: u32, page: u32) -> TranslationFault {
        match kind {
            FaultKind::Write => self.faults.write_fault = true,
            FaultKind::Access | FaultKind::Capacity => self.faults.access_fault = true,
        }
        self.faults.page_fault = true;
        let fault = TranslationFault { kind, vaddr, page };
        debug!("{}", fault);

        fault
    }

    pub fn read(
        &mut self,
        vaddr: u32,
        interrupts: &mut InterruptController,
    ) -> std::result::Result<u32, TranslationFault> {
        self.faults = FaultFlags::default();
        let t = self.map.translate(vaddr);
        let page = t.page_number();

        if !t.can_access() {
            return Err(self.fault(FaultKind::Access, vaddr, page));
        }
        if bus::is_device_page(page) {
            return Ok(self.bus.read(&t, vaddr, interrupts));
        }

        match self.physical.read(page, t.offset) {
            Ok(word) => Ok(word),
            Err(_) => Err(self.fault(FaultKind::Capacity, vaddr, page)),
        }
    }

    pub fn write(
        &mut self,
        vaddr: u32,
        value: u32,
        interrupts: &mut InterruptController,
    ) -> std::result::Result<(), TranslationFault> {
        self.faults = FaultFlags::default();
        let t = self.map.translate(vaddr);
        let page = t.page_number();

        if !t.can_access() {
            return Err(self.fault(FaultKind::Access, vaddr, page));
        }
        if !t.can_write() {
            return Err(self.fault(FaultKind::Write, vaddr, page));
        }
        if bus::is_device_page(page) {
            self.bus.write(&t, vaddr, value, interrupts);
            return Ok(());
        }

        self.physical
            .write(page, t.offset, value)
            .map_err(|_| self.fault(FaultKind::Capacity, vaddr, page))
    }

    pub fn write_map(&mut self, md: u32, vma: u32) {
        self.map.write_map(md, vma);
    }

    /// Reads RAM behind `vaddr` without side effects: no fault flags, no
    /// allocation, no device traffic.
    pub fn peek(&self, vaddr: u32) -> Option<u32> {
        let t = self.map.translate(vaddr);
        if !t.can_access() || t.page_number() >= DEVICE_PAGE_BASE {
            return None;
        }

        self.physical
            .page(t.page_number())
            .and_then(|page| page.read(t.offset).ok())
    }

    /// Map status word for `md`: fault bits 31 and 30, level 1 entry in bits
    /// 24..28 and the translated frame below.
    pub fn map_data(&self, md: u32) -> u32 {
        let t = self.map.translate(md);

        ((self.faults.write_fault as u32) << 31)
            | ((self.faults.access_fault as u32) << 30)
            | ((t.l1 & 0o37) << 24)
            | (t.frame & 0o77777777)
    }

    pub fn poll_devices(&mut self, interrupts: &mut InterruptController) {
        self.bus.poll(interrupts);
    }
}

impl fmt::Debug for MemoryTranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MemoryTranslationUnit")
            .field("physical", &self.physical)
            .field("bus", &self.bus.get_subsystems_info())
            .field("faults", &self.faults)
            .finish()
    }
}
