use super::*;
use log::{debug, info, warn};
use range_map::Range;
use std::fmt;

struct Subsystem {
    device: Box<dyn BusDevice>,
    page: u32,
    offsets: Range<u32>,
    name: String,
}

impl Subsystem {
    pub fn new(
        name: &str,
        page: u32,
        first_offset: u32,
        len: u32,
        device: impl BusDevice + 'static,
    ) -> Subsystem {
        Subsystem {
            name: name.to_owned(),
            device: Box::new(device),
            page,
            offsets: Range {
                start: first_offset,
                end: first_offset + len,
            },
        }
    }

    pub fn contains(&self, page: u32, offset: u32) -> bool {
        self.page == page && self.offsets.contains(offset)
    }
}

impl fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Subsystem {:<12}, page=0o{:o}, offsets=0o{:o} → 0o{:o}",
            self.name,
            self.page,
            self.offsets.start,
            self.offsets.end - 1,
        )
    }
}

/// Registers of the Unibus page the processor itself answers.
#[derive(Debug, Default)]
pub struct UnibusRegisters {
    prom_disable_requested: bool,
    mapping: [u32; 16],
}

impl UnibusRegisters {
    pub fn read(&mut self, offset: u32, interrupts: &mut InterruptController) -> u32 {
        match offset {
            0o40 => interrupts.status(),
            0o140..=0o176 => self.mapping[((offset - 0o140) >> 1) as usize],
            _ => {
                info!("unibus: read of register 0o{:o}", offset);
                0
            }
        }
    }

    pub fn write(&mut self, offset: u32, value: u32, interrupts: &mut InterruptController) {
        match offset {
            0o12 => {
                info!("unibus: mode register <- 0o{:o}", value);
                if value & 0o44 == 0o44 {
                    info!("unibus: disabling prom");
                    self.prom_disable_requested = true;
                }
            }
            0o40 => interrupts.write_control(value),
            0o42 => interrupts.write_stimulus(value),
            0o44 => debug!("unibus: clear bus error 0o{:o}", value),
            0o140..=0o176 => {
                self.mapping[((offset - 0o140) >> 1) as usize] = value;
                debug!("unibus: map register 0o{:o} <- 0o{:o}", offset, value);
            }
            _ => warn!("unibus: write of unknown register 0o{:o} <- 0o{:o}", offset, value),
        }
    }

    /// Reports (once) that the mode register asked for the boot PROM to go away.
    pub fn take_prom_disable(&mut self) -> bool {
        std::mem::take(&mut self.prom_disable_requested)
    }
}

/// Peripherals hanging off the device pages.
#[derive(Debug, Default)]
pub struct DeviceBus {
    stack: Vec<Subsystem>,
    pub unibus: UnibusRegisters,
}

impl DeviceBus {
    /// Attaches a device to `len` register offsets of a device page. Later
    /// attachments shadow earlier ones on overlapping offsets.
    pub fn attach(
        &mut self,
        name: &str,
        page: u32,
        first_offset: u32,
        len: u32,
        device: impl BusDevice + 'static,
    ) {
        self.stack
            .push(Subsystem::new(name, page, first_offset, len, device));
    }

    pub fn get_subsystems_info(&self) -> Vec<String> {
        let mut output: Vec<String> = vec![];

        for sub in self.stack.iter() {
            output.push(format!("#{}: {:?}", output.len(), sub));
        }

        output
    }

    fn find(&mut self, page: u32, offset: u32) -> Option<&mut Subsystem> {
        self.stack
            .iter_mut()
            .rev()
            .find(|sub| sub.contains(page, offset))
    }

    /*
     * Device offsets: the framebuffer sees the low 15 bits of the virtual
     * address, IOB and Unibus registers are addressed by byte so the word
     * offset is doubled, everything else gets the page offset.
     */
    fn device_offset(page: u32, vaddr: u32, offset: u32) -> u32 {
        match page {
            FRAMEBUFFER_PAGE => vaddr & 0o77777,
            IOB_PAGE | UNIBUS_PAGE => offset << 1,
            _ => offset,
        }
    }

    pub fn read(
        &mut self,
        t: &Translation,
        vaddr: u32,
        interrupts: &mut InterruptController,
    ) -> u32 {
        let page = t.page_number();
        if t.window == Window::Color {
            return 0;
        }
        let offset = Self::device_offset(page, vaddr, t.offset);

        if page == UNIBUS_PAGE {
            return self.unibus.read(offset, interrupts);
        }

        match self.find(page, offset) {
            Some(sub) => sub.device.read(offset, interrupts),
            None => {
                debug!("no device at page 0o{:o} offset 0o{:o}", page, offset);
                0
            }
        }
    }

    pub fn write(
        &mut self,
        t: &Translation,
        vaddr: u32,
        value: u32,
        interrupts: &mut InterruptController,
    ) {
        let page = t.page_number();
        if t.window == Window::Color {
            return;
        }
        let offset = Self::device_offset(page, vaddr, t.offset);

        if page == UNIBUS_PAGE {
            return self.unibus.write(offset, value, interrupts);
        }
        if page == TV_REGISTER_PAGE {
            debug!("tv register 0o{:o} <- 0o{:o}", offset, value);
        }

        match self.find(page, offset) {
            Some(sub) => sub.device.write(offset, value, interrupts),
            None => {
                debug!(
                    "no device at page 0o{:o} offset 0o{:o}, dropping 0o{:o}",
                    page, offset, value
                );
            }
        }
    }

    pub fn poll(&mut self, interrupts: &mut InterruptController) {
        self.stack
            .iter_mut()
            .for_each(|sub| sub.device.poll(interrupts));
    }
}

pub fn is_device_page(page: u32) -> bool {
    matches!(
        page,
        FRAMEBUFFER_PAGE | XBUS_PAGE | TV_REGISTER_PAGE | IOB_PAGE | UNIBUS_PAGE
    )
}
