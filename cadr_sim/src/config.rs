use anyhow::{Context, Result};
use cadr_lib::MachineConfig;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Simulator settings, every field optional so files can be layered
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub prom: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub ram_pages: Option<u32>,
    pub save_pages: Option<u32>,
    pub warm_boot: Option<bool>,
    pub dump_on_halt: Option<bool>,
    pub poll_interval: Option<u64>,
    pub log_filter: Option<String>,
    pub configs: Option<Vec<PathBuf>>, // base config files, loaded first
}

impl Config {
    /// Loads `path` on top of the files it includes. Includes are loaded
    /// depth first, each file once, and cycles are rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let mut layers = Vec::new();
        Self::collect_layers(path, &mut Vec::new(), &mut layers)?;

        Ok(layers
            .into_iter()
            .fold(Config::default(), |merged, (_, layer)| merged.merge(layer)))
    }

    fn collect_layers(
        path: &Path,
        include_stack: &mut Vec<PathBuf>,
        layers: &mut Vec<(PathBuf, Config)>,
    ) -> Result<()> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if include_stack.contains(&key) {
            anyhow::bail!(
                "Circular dependency detected while loading config: {}",
                path.display()
            );
        }
        if layers.iter().any(|(loaded, _)| *loaded == key) {
            return Ok(());
        }

        let config_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut layer = Self::parse_file(path)?;
        layer.resolve_paths(config_dir);

        include_stack.push(key.clone());
        for include in layer.configs.iter().flatten() {
            let include_path = config_dir.join(include);
            if !include_path.exists() {
                anyhow::bail!(
                    "Config file not found: {} (included from {})",
                    include.display(),
                    path.display()
                );
            }
            Self::collect_layers(&include_path, include_stack, layers)?;
        }
        include_stack.pop();
        layers.push((key, layer));

        Ok(())
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        serde_yaml::from_str(&expand_env_vars(&contents)?)
            .with_context(|| format!("Failed to parse YAML from {}", path.display()))
    }

    /// Relative file settings are taken from the declaring file's directory.
    fn resolve_paths(&mut self, base_dir: &Path) {
        for path in [&mut self.prom, &mut self.state_file].into_iter().flatten() {
            let joined = base_dir.join(&*path);
            *path = joined.canonicalize().unwrap_or(joined);
        }
    }

    /// Merge another config into this one, values set in `other` win.
    pub fn merge(self, other: Config) -> Config {
        Config {
            prom: other.prom.or(self.prom),
            state_file: other.state_file.or(self.state_file),
            ram_pages: other.ram_pages.or(self.ram_pages),
            save_pages: other.save_pages.or(self.save_pages),
            warm_boot: other.warm_boot.or(self.warm_boot),
            dump_on_halt: other.dump_on_halt.or(self.dump_on_halt),
            poll_interval: other.poll_interval.or(self.poll_interval),
            log_filter: other.log_filter.or(self.log_filter),
            configs: None,
        }
    }

    pub fn machine_config(&self) -> MachineConfig {
        let defaults = MachineConfig::default();
        let warm_boot_state = match self.warm_boot {
            Some(true) => self.state_file.clone(),
            _ => None,
        };

        MachineConfig {
            ram_pages: self.ram_pages.unwrap_or(defaults.ram_pages),
            save_pages: self.save_pages.unwrap_or(defaults.save_pages),
            warm_boot_state,
            poll_interval: self.poll_interval.unwrap_or(defaults.poll_interval),
        }
    }
}

/// Expands `${NAME}` references; an unset variable is an error.
fn expand_env_vars(content: &str) -> Result<String> {
    let reference = Regex::new(r"\$\{([^}]+)\}").context("Failed to compile regex pattern")?;
    let mut missing = None;
    let expanded = reference.replace_all(content, |caps: &Captures| {
        env::var(&caps[1]).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| caps[1].to_owned());
            String::new()
        })
    });

    match missing {
        Some(name) => Err(anyhow::anyhow!("Environment variable '{}' not found", name)),
        None => Ok(expanded.into_owned()),
    }
}
