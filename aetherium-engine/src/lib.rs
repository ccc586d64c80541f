//! # aetherium-engine
//!
//! Driving loop for aetherium automata.
//!
//! This crate provides:
//! - Engine configuration (YAML file plus environment overrides)
//! - The `Runner` that connects transports, feeds inputs and steps an
//!   execution until it finishes or is stopped
//! - Run reports

pub mod config;
pub mod error;
pub mod runner;

pub use config::{
    Config, ConfigError, ConsoleConfig, ConsoleFormat, EngineConfig, EngineMode, NetworkConfig,
};
pub use error::EngineError;
pub use runner::{RunReport, Runner, StopHandle};
