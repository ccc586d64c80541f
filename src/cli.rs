//! Command-line flags.

use aetherium_engine::EngineMode;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "aetherium")]
#[command(about = "Runs and validates finite-state automata described in YAML")]
#[command(version)]
pub struct Cli {
    /// Run an automata
    #[arg(short, long, value_name = "FILE", conflicts_with = "validate")]
    pub run: Option<PathBuf>,

    /// Validate an automata YAML and exit
    #[arg(long, value_name = "FILE")]
    pub validate: Option<PathBuf>,

    /// Mode the engine runs in
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Engine configuration file
    #[arg(short, long, value_name = "FILE", env = "AETHERIUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Detached,
    Network,
}

impl From<ModeArg> for EngineMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Detached => EngineMode::Detached,
            ModeArg::Network => EngineMode::Network,
        }
    }
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run(PathBuf),
    Validate(PathBuf),
    /// No action flag given.
    Idle,
}

/// Parsed and checked flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub action: Action,
    pub mode: Option<EngineMode>,
    pub config: Option<PathBuf>,
    pub log_level: &'static str,
}

/// Flag errors reported before anything runs.
#[derive(Debug, PartialEq, Eq)]
pub enum CliError {
    FileNotFound(PathBuf),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::FileNotFound(path) => write!(f, "File not found: {}", path.display()),
        }
    }
}

impl std::error::Error for CliError {}

impl Cli {
    /// Checks file arguments and collects the flags into [`Options`].
    pub fn into_options(self) -> Result<Options, CliError> {
        let log_level = self.log_level();

        for path in [&self.run, &self.validate, &self.config].into_iter().flatten() {
            require_file(path)?;
        }

        let action = match (self.run, self.validate) {
            (Some(path), _) => Action::Run(path),
            (None, Some(path)) => Action::Validate(path),
            (None, None) => Action::Idle,
        };

        Ok(Options {
            action,
            mode: self.mode.map(EngineMode::from),
            config: self.config,
            log_level,
        })
    }

    /// Default log filter; `--debug` wins over `--verbose`.
    fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

fn require_file(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::FileNotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["aetherium"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_run_options() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        let options = parse(&["--run", path, "--mode", "network", "--verbose"])
            .into_options()
            .unwrap();
        assert_eq!(options.action, Action::Run(file.path().to_path_buf()));
        assert_eq!(options.mode, Some(EngineMode::Network));
        assert_eq!(options.log_level, "info");
    }

    #[test]
    fn test_validate_options() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        let options = parse(&["--validate", path, "--debug", "--verbose"])
            .into_options()
            .unwrap();
        assert_eq!(options.action, Action::Validate(file.path().to_path_buf()));
        assert_eq!(options.mode, None);
        assert_eq!(options.log_level, "debug");
    }

    #[test]
    fn test_missing_file() {
        let err = parse(&["--validate", "/no/such/file.yaml"])
            .into_options()
            .unwrap_err();
        assert_eq!(err.to_string(), "File not found: /no/such/file.yaml");
    }

    #[test]
    fn test_missing_config_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        let err = parse(&["--run", path, "--config", "/no/such/engine.yaml"])
            .into_options()
            .unwrap_err();
        assert_eq!(
            err,
            CliError::FileNotFound(PathBuf::from("/no/such/engine.yaml"))
        );
    }

    #[test]
    fn test_no_action() {
        let options = parse(&[]).into_options().unwrap();
        assert_eq!(options.action, Action::Idle);
        assert_eq!(options.log_level, "warn");
    }

    #[test]
    fn test_rejected_flags() {
        assert!(Cli::try_parse_from(["aetherium", "--mode", "mesh"]).is_err());
        assert!(Cli::try_parse_from(["aetherium", "--run", "a", "--validate", "b"]).is_err());
    }
}
