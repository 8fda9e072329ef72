use anyhow::{Context, Result};
use cadr_lib::{Machine, PromImage, RunOutcome};
use log::info;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub cycles: u64,
    pub pc: u32,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let what = match self.outcome {
            RunOutcome::Halted => "halted",
            RunOutcome::Stopped => "stopped",
            RunOutcome::CycleLimit => "cycle limit reached",
        };
        write!(f, "{} after {} cycles at micro pc 0o{:o}", what, self.cycles, self.pc)
    }
}

#[derive(Debug)]
pub struct SimRunner {
    config: Config,
    machine: Machine,
    max_cycles: Option<u64>,
}

impl SimRunner {
    pub fn new(config: Config, max_cycles: Option<u64>) -> Result<Self> {
        let prom_path = config
            .prom
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No prom image specified in config"))?;
        let prom = PromImage::load(prom_path)
            .with_context(|| format!("Failed to load prom image {}", prom_path.display()))?;
        if config.dump_on_halt == Some(true) && config.state_file.is_none() {
            return Err(anyhow::anyhow!("dump_on_halt needs a state_file"));
        }

        let mut machine = Machine::new(config.machine_config());
        machine.load_prom(&prom);

        Ok(Self {
            config,
            machine,
            max_cycles,
        })
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.machine.stop_handle()
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        let outcome = match self.max_cycles {
            Some(cycles) => self.machine.run_for(cycles),
            None => self.machine.run(),
        };

        if outcome != RunOutcome::CycleLimit && self.config.dump_on_halt == Some(true) {
            if let Some(path) = &self.config.state_file {
                self.machine
                    .dump(path)
                    .with_context(|| format!("Failed to dump state to {}", path.display()))?;
            }
        }

        let engine = self.machine.engine();
        let summary = RunSummary {
            outcome,
            cycles: engine.cycles(),
            pc: engine.pc(),
        };
        info!("{}", summary);

        Ok(summary)
    }
}
