pub mod checkpoint;
pub mod history;
pub mod interrupt;
mod machine;
pub mod memory;
pub mod microcode;
pub mod prom;
mod registers;
pub mod ring;

pub use checkpoint::{CheckpointCodec, CheckpointError, RestoreOutcome};
pub use interrupt::InterruptController;
pub use machine::{Machine, MachineConfig, RunOutcome, POLL_INTERVAL};
pub use memory::{BusDevice, MemoryTranslationUnit};
pub use microcode::{MachineState, MicroInstruction, MicrocodeEngine};
pub use prom::{PromError, PromImage};
pub use registers::*;
