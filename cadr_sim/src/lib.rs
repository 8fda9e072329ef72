pub mod config;
pub mod runner;

pub use config::Config;
pub use runner::{RunSummary, SimRunner};
