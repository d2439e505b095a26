//! Runtime settings.
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`)
//! 3. environment variables prefixed `SIGNALWATCH_`, with `__` separating
//!    nested keys (e.g. `SIGNALWATCH_INTERVALS__HEALTH=5s`)
//! 4. command-line overrides
//!
//! ```toml
//! backend_url = "http://10.0.0.12:5000"
//! request_timeout = "3s"
//! failure_threshold = 2
//!
//! [intervals]
//! health = "10s"
//! signal = "1s"
//!
//! [timing]
//! yellow = 4
//!
//! [simulation]
//! seed = 42
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::data::duration;
use crate::policy::SignalTiming;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const ENV_PREFIX: &str = "SIGNALWATCH";

/// Refresh interval of every polled feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Intervals {
    #[serde(deserialize_with = "duration::deserialize")]
    pub health: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub signal: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub congestion: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub history: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub simulation: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(10),
            signal: Duration::from_secs(1),
            congestion: Duration::from_secs(2),
            history: Duration::from_secs(5),
            simulation: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationSettings {
    /// Fixed RNG seed; random when unset.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub backend_url: String,
    #[serde(deserialize_with = "duration::deserialize")]
    pub request_timeout: Duration,
    pub intervals: Intervals,
    /// Consecutive failed health polls before switching to simulated data.
    pub failure_threshold: u32,
    #[serde(default)]
    pub timing: SignalTiming,
    #[serde(default)]
    pub simulation: SimulationSettings,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(3),
            intervals: Intervals::default(),
            failure_threshold: 1,
            timing: SignalTiming::default(),
            simulation: SimulationSettings::default(),
            log_file: None,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub seed: Option<u64>,
    pub failure_threshold: Option<u32>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from defaults, `path`, the environment and `overrides`.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with(path, environment(), overrides)
    }

    fn load_with(path: Option<&Path>, env: Environment, overrides: &Overrides) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("backend_url", defaults.backend_url.as_str())?
            .set_default("request_timeout", "3s")?
            .set_default("intervals.health", "10s")?
            .set_default("intervals.signal", "1s")?
            .set_default("intervals.congestion", "2s")?
            .set_default("intervals.history", "5s")?
            .set_default("intervals.simulation", "3s")?
            .set_default("failure_threshold", u64::from(defaults.failure_threshold))?
            .set_default("timing.yellow", u64::from(defaults.timing.yellow))?
            .set_default("timing.red", u64::from(defaults.timing.red))?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let settings: Settings = builder
            .add_source(env)
            .set_override_option("backend_url", overrides.backend_url.clone())?
            .set_override_option("simulation.seed", overrides.seed)?
            .set_override_option("failure_threshold", overrides.failure_threshold.map(u64::from))?
            .set_override_option(
                "log_file",
                overrides
                    .log_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.backend_url.trim().is_empty() {
            bail!("backend_url must not be empty");
        }
        if self.failure_threshold == 0 {
            bail!("failure_threshold must be at least 1");
        }
        if self.timing.yellow == 0 || self.timing.red == 0 {
            bail!("timing durations must be positive");
        }
        if self.request_timeout.is_zero() {
            bail!("request_timeout must be positive");
        }
        let intervals = [
            ("health", self.intervals.health),
            ("signal", self.intervals.signal),
            ("congestion", self.intervals.congestion),
            ("history", self.intervals.history),
            ("simulation", self.intervals.simulation),
        ];
        for (name, interval) in intervals {
            if interval.is_zero() {
                bail!("intervals.{} must be positive", name);
            }
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env() -> Environment {
        environment().source(Some(config::Map::new()))
    }

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with(None, no_env(), &Overrides::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.intervals.health, Duration::from_secs(10));
        assert_eq!(settings.timing.red, 25);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = toml_file(
            r#"
            backend_url = "http://10.0.0.12:5000"
            failure_threshold = 3

            [intervals]
            signal = "500ms"

            [timing]
            yellow = 4

            [simulation]
            seed = 42
            "#,
        );

        let settings =
            Settings::load_with(Some(file.path()), no_env(), &Overrides::default()).unwrap();
        assert_eq!(settings.backend_url, "http://10.0.0.12:5000");
        assert_eq!(settings.failure_threshold, 3);
        assert_eq!(settings.intervals.signal, Duration::from_millis(500));
        assert_eq!(settings.intervals.history, Duration::from_secs(5));
        assert_eq!(settings.timing.yellow, 4);
        assert_eq!(settings.timing.red, 25);
        assert_eq!(settings.simulation.seed, Some(42));
    }

    #[test]
    fn test_environment_and_cli_layering() {
        let file = toml_file(r#"backend_url = "http://from-file:5000""#);

        let mut vars = config::Map::new();
        vars.insert("SIGNALWATCH_BACKEND_URL".to_string(), "http://from-env:5000".to_string());
        vars.insert("SIGNALWATCH_INTERVALS__HEALTH".to_string(), "4s".to_string());
        vars.insert("SIGNALWATCH_FAILURE_THRESHOLD".to_string(), "2".to_string());
        let env = environment().source(Some(vars));

        let overrides = Overrides {
            failure_threshold: Some(5),
            log_file: Some(PathBuf::from("/tmp/signalwatch.log")),
            ..Default::default()
        };
        let settings = Settings::load_with(Some(file.path()), env, &overrides).unwrap();

        assert_eq!(settings.backend_url, "http://from-env:5000");
        assert_eq!(settings.intervals.health, Duration::from_secs(4));
        assert_eq!(settings.failure_threshold, 5);
        assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/signalwatch.log")));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero = toml_file("failure_threshold = 0");
        assert!(Settings::load_with(Some(zero.path()), no_env(), &Overrides::default()).is_err());

        let bad_interval = toml_file("[intervals]\nsignal = \"soon\"");
        assert!(
            Settings::load_with(Some(bad_interval.path()), no_env(), &Overrides::default()).is_err()
        );

        let zero_interval = toml_file("[intervals]\nhistory = \"0s\"");
        let err = Settings::load_with(Some(zero_interval.path()), no_env(), &Overrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("intervals.history"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/signalwatch.toml");
        assert!(Settings::load_with(Some(path), no_env(), &Overrides::default()).is_err());
    }
}
