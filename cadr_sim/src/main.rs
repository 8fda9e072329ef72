use anyhow::{Context, Result};
use cadr_sim::{Config, SimRunner};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

/// Run CADR microcode from a boot PROM
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the simulator YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Boot PROM image, overrides the config file
    #[arg(short, long)]
    prom: Option<PathBuf>,

    /// Restore the state file when the microcode disables the PROM
    #[arg(long)]
    warm_boot: bool,

    /// Dump the machine state when it halts or is interrupted
    #[arg(long)]
    dump_on_halt: bool,

    /// Checkpoint file used for warm boot and dumps
    #[arg(short, long)]
    state_file: Option<PathBuf>,

    /// Stop after this many microcycles
    #[arg(short, long)]
    max_cycles: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Config {
        Config {
            prom: self.prom.clone(),
            state_file: self.state_file.clone(),
            warm_boot: self.warm_boot.then_some(true),
            dump_on_halt: self.dump_on_halt.then_some(true),
            ..Config::default()
        }
    }
}

fn init_logging(filter: Option<&str>, verbose: bool) {
    let default_filter = match (verbose, filter) {
        (true, _) => "debug",
        (false, Some(filter)) => filter,
        (false, None) => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    let config = file_config.merge(cli.overrides());
    init_logging(config.log_filter.as_deref(), cli.verbose);

    let mut runner = SimRunner::new(config, cli.max_cycles)?;
    let stop = runner.stop_handle();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })
    .context("Failed to install the Ctrl-C handler")?;

    let summary = runner.run()?;
    println!("{}", summary);

    Ok(())
}
