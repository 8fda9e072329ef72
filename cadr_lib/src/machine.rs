use crate::checkpoint::{self, CheckpointCodec, RestoreOutcome};
use crate::memory::{BusDevice, DEFAULT_RAM_PAGES};
use crate::microcode::{MachineState, MicrocodeEngine};
use crate::prom::PromImage;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cycles between two peripheral polls.
pub const POLL_INTERVAL: u64 = 0x10000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    pub ram_pages: u32,
    pub save_pages: u32,
    /// State restored when the microcode switches the PROM off.
    pub warm_boot_state: Option<PathBuf>,
    pub poll_interval: u64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            ram_pages: DEFAULT_RAM_PAGES,
            save_pages: DEFAULT_RAM_PAGES,
            warm_boot_state: None,
            poll_interval: POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Halted,
    Stopped,
    CycleLimit,
}

/// A CADR processor with its boot and warm boot plumbing.
#[derive(Debug)]
pub struct Machine {
    engine: MicrocodeEngine,
    codec: CheckpointCodec,
    config: MachineConfig,
    stop: Arc<AtomicBool>,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        let config = MachineConfig {
            poll_interval: config.poll_interval.max(1),
            ..config
        };
        Self {
            engine: MicrocodeEngine::new(MachineState::new(config.ram_pages)),
            codec: CheckpointCodec::new(config.save_pages),
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn load_prom(&mut self, prom: &PromImage) {
        prom.install(&mut self.engine.state.registers);
        self.engine.state.registers.prom_enabled = true;
        self.engine.reset();
    }

    pub fn attach(
        &mut self,
        name: &str,
        page: u32,
        first_offset: u32,
        len: u32,
        device: impl BusDevice + 'static,
    ) {
        self.engine
            .state
            .mmu
            .bus
            .attach(name, page, first_offset, len, device);
    }

    pub fn engine(&self) -> &MicrocodeEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MicrocodeEngine {
        &mut self.engine
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Flag checked at every poll boundary; setting it ends the current run.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn run(&mut self) -> RunOutcome {
        self.run_until(None)
    }

    pub fn run_for(&mut self, cycles: u64) -> RunOutcome {
        self.run_until(Some(cycles))
    }

    fn run_until(&mut self, limit: Option<u64>) -> RunOutcome {
        let mut executed = 0;
        loop {
            if self.engine.is_halted() {
                return RunOutcome::Halted;
            }
            if limit.map_or(false, |limit| executed >= limit) {
                return RunOutcome::CycleLimit;
            }

            self.engine.step();
            executed += 1;

            if self.engine.take_prom_disabled() {
                self.warm_boot();
            }
            if self.engine.cycles() % self.config.poll_interval == 0 {
                self.engine.poll_devices();
                if self.stop.swap(false, Ordering::SeqCst) {
                    info!("stopped after {} cycles", self.engine.cycles());
                    return RunOutcome::Stopped;
                }
            }
        }
    }

    fn warm_boot(&mut self) {
        let path = match &self.config.warm_boot_state {
            Some(path) => path,
            None => return,
        };
        match self.codec.restore(&mut self.engine.state, path) {
            Ok(RestoreOutcome::Restored { pages }) => {
                info!("warm boot: {} pages restored from {}", pages, path.display())
            }
            Ok(RestoreOutcome::AlreadyRestored) => (),
            Err(e) => warn!(
                "warm boot from {} failed, cold booting: {}",
                path.display(),
                e
            ),
        }
    }

    pub fn dump(&self, path: &Path) -> checkpoint::Result<()> {
        self.codec.dump(&self.engine.state, path)
    }
}
