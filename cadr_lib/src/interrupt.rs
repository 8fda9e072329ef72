//! Interrupt status register shared by the Unibus and the Xbus.

use log::info;

pub const UNIBUS_ENABLE: u32 = 0o2000;
pub const VECTOR_FIELD: u32 = 0o1774;
pub const XBUS_INTERRUPT: u32 = 0o40000;
pub const UNIBUS_INTERRUPT: u32 = 0o100000;

const PENDING_MASK: u32 = XBUS_INTERRUPT | UNIBUS_INTERRUPT;
const STATUS_MASK: u32 = 0o177777;
const CONTROL_BITS: u32 = 0o036001;
const STIMULUS_BITS: u32 = 0o101774;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptController {
    status: u32,
    pending: bool,
}

impl InterruptController {
    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn set_status(&mut self, value: u32) {
        self.status = value & STATUS_MASK;
        self.pending = self.status & PENDING_MASK != 0;
    }

    pub fn assert_unibus(&mut self, vector: u32) {
        if self.status & UNIBUS_ENABLE == 0 {
            info!("unibus interrupt 0o{:o} ignored, interrupts disabled", vector);
            return;
        }
        info!("unibus interrupt 0o{:o}", vector);
        self.set_status((self.status & !VECTOR_FIELD) | UNIBUS_INTERRUPT | (vector & VECTOR_FIELD));
    }

    pub fn deassert_unibus(&mut self) {
        if self.status & UNIBUS_INTERRUPT != 0 {
            self.set_status(self.status & !(VECTOR_FIELD | UNIBUS_INTERRUPT));
        }
    }

    pub fn assert_xbus(&mut self) {
        info!("xbus interrupt");
        self.set_status(self.status | XBUS_INTERRUPT);
    }

    pub fn deassert_xbus(&mut self) {
        if self.status & XBUS_INTERRUPT != 0 {
            self.set_status(self.status & !XBUS_INTERRUPT);
        }
    }

    /// Unibus register 0o40: enable and control bits.
    pub fn write_control(&mut self, value: u32) {
        info!("interrupt control <- 0o{:o}", value);
        self.set_status((self.status & !CONTROL_BITS) | (value & CONTROL_BITS));
    }

    /// Unibus register 0o42: software stimulated interrupt and vector.
    pub fn write_stimulus(&mut self, value: u32) {
        info!("interrupt stimulus <- 0o{:o}", value);
        self.set_status((self.status & !STIMULUS_BITS) | (value & STIMULUS_BITS));
    }
}
