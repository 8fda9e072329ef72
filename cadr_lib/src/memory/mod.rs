use crate::interrupt::InterruptController;

mod bus;
mod error;
mod map;
mod mmu;
mod physical;

pub use bus::{DeviceBus, UnibusRegisters};
pub use error::{FaultKind, MemoryError, Result, TranslationFault};
pub use map::{PageMap, Translation, Window, L1_MAP_SIZE, L2_MAP_SIZE};
pub use mmu::{FaultFlags, MemoryTranslationUnit};
pub use physical::{PhysicalMemory, PhysicalPage};

/// Words per physical page.
pub const PAGE_SIZE: usize = 256;
/// Default RAM budget, in pages.
pub const DEFAULT_RAM_PAGES: u32 = 8192;

/* first frame number reserved for devices, nothing above is RAM */
pub const DEVICE_PAGE_BASE: u32 = 0o36000;
pub const FRAMEBUFFER_PAGE: u32 = 0o36000;
pub const XBUS_PAGE: u32 = 0o36777;
pub const TV_REGISTER_PAGE: u32 = 0o37760;
pub const IOB_PAGE: u32 = 0o37764;
pub const UNIBUS_PAGE: u32 = 0o37766;

pub const ACCESS_BIT: u32 = 1 << 23;
pub const WRITE_BIT: u32 = 1 << 22;
pub const PAGE_NUMBER_MASK: u32 = 0o37777;

/*
 * BusDevice
 * this trait defines the register interface of every peripheral reachable
 * through a device page. Calls are synchronous, a device that needs to wait
 * buffers its work and finishes it in `poll`.
 */
pub trait BusDevice {
    fn read(&mut self, offset: u32, interrupts: &mut InterruptController) -> u32;
    fn write(&mut self, offset: u32, value: u32, interrupts: &mut InterruptController);
    fn poll(&mut self, _interrupts: &mut InterruptController) {}
}
