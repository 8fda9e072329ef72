use anyhow::Result;
use cadr_lib::{CheckpointCodec, MachineState, RunOutcome};
use cadr_sim::{Config, SimRunner};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HALT: u64 = (1 << 43) | (1 << 10);

fn pdp_bytes(word: u32) -> [u8; 4] {
    let b = word.to_be_bytes();
    [b[1], b[0], b[3], b[2]]
}

fn write_prom(path: &Path, entries: &[u64]) -> Result<()> {
    let mut bytes = vec![];
    for word in [0, 0, entries.len() as u32] {
        bytes.extend_from_slice(&pdp_bytes(word));
    }
    for entry in entries {
        for shift in [48, 32, 16, 0] {
            bytes.extend_from_slice(&((entry >> shift) as u16).to_le_bytes());
        }
    }
    fs::write(path, bytes)?;

    Ok(())
}

#[test]
fn test_halting_prom() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_prom(&temp_dir.path().join("halt.mcr"), &[HALT])?;
    let config_path = temp_dir.path().join("sim.yaml");
    fs::write(
        &config_path,
        r#"
prom: "halt.mcr"
state_file: "halt.state"
ram_pages: 32
save_pages: 4
dump_on_halt: true
"#,
    )?;

    let mut runner = SimRunner::new(Config::load(&config_path)?, None)?;
    let summary = runner.run()?;
    assert_eq!(RunOutcome::Halted, summary.outcome);
    assert_eq!(2, summary.cycles);
    assert_eq!("halted after 2 cycles at micro pc 0o0", summary.to_string());

    let mut state = MachineState::new(32);
    CheckpointCodec::new(4).restore(&mut state, &temp_dir.path().join("halt.state"))?;
    assert_eq!(0, state.history.last_pc());

    Ok(())
}

#[test]
fn test_cycle_limit_does_not_dump() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let prom = temp_dir.path().join("idle.mcr");
    write_prom(&prom, &[0])?;
    let config = Config {
        prom: Some(prom),
        state_file: Some(temp_dir.path().join("idle.state")),
        ram_pages: Some(32),
        dump_on_halt: Some(true),
        ..Config::default()
    };

    let mut runner = SimRunner::new(config, Some(100))?;
    assert_eq!(RunOutcome::CycleLimit, runner.run()?.outcome);
    assert!(!temp_dir.path().join("idle.state").exists());

    Ok(())
}

#[test]
fn test_missing_prom() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        prom: Some(temp_dir.path().join("nowhere.mcr")),
        ..Config::default()
    };

    let err = SimRunner::new(config, None).unwrap_err();
    assert!(err.to_string().contains("Failed to load prom image"));
    assert!(SimRunner::new(Config::default(), None).is_err());
}
