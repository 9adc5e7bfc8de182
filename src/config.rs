use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const VS_DATA_PATH_VAR: &str = "VS_DATA_PATH";
pub const VERBOSE_VAR: &str = "HC1DEC_VERBOSE";
pub const MAX_INFLATED_VAR: &str = "HC1DEC_MAX_INFLATED";

const DEFAULT_VS_DATA_PATH: &str = "./valuesetdata";

/// Options for one decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 0 is quiet. 1 mirrors diagnostic lines into the log, 2 also logs a
    /// hex dump of every stage output.
    pub verbosity: u8,
    /// Directory holding the value-set JSON files.
    pub value_set_path: PathBuf,
    /// Upper bound on the inflated CWT size, `None` for unbounded.
    pub max_inflated_len: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbosity: 0,
            value_set_path: PathBuf::from(DEFAULT_VS_DATA_PATH),
            max_inflated_len: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup(VS_DATA_PATH_VAR).filter(|p| !p.is_empty()) {
            config.value_set_path = PathBuf::from(path);
        }
        if let Some(value) = lookup(VERBOSE_VAR) {
            config.verbosity = parse_number(VERBOSE_VAR, &value)?;
        }
        if let Some(value) = lookup(MAX_INFLATED_VAR) {
            config.max_inflated_len = Some(parse_number(MAX_INFLATED_VAR, &value)?);
        }

        Ok(config)
    }

    pub(crate) fn logs_diagnostics(&self) -> bool {
        self.verbosity >= 1
    }

    pub(crate) fn logs_hex(&self) -> bool {
        self.verbosity >= 2
    }

    /// Default log filter directive for this verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    var: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotANumber {
        var,
        value: value.to_string(),
    })
}
