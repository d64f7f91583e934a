//! # Global runtime configuration.
//!
//! Provides [`RuntimeConfig`], the settings shared by the master and every
//! worker, plus the environment-selection contract units rely on:
//! [`Environment`] (one active deployment environment per process) and
//! [`EnvConfig`] (a name → config mapping with one active key).
//!
//! ## Sentinel values
//! - `phase_timeout = 0s` → no deadline on unit phase calls
//! - `parallelism = 0` → use `std::thread::available_parallelism()`
//! - `max_consecutive_timeouts = 0` → never abandon a worker slot

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;
use crate::policies::RestartPolicy;
use crate::worker::worker_count;

/// Environment variable holding the deployment environment name.
pub const ENVIRONMENT_VAR: &str = "UNITVISOR_ENV";

/// Deployment environment. Exactly one is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Stage,
    Production,
}

impl Environment {
    /// Reads [`ENVIRONMENT_VAR`]; unset means [`Environment::Development`].
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(name) => name.parse(),
            Err(_) => Ok(Environment::default()),
        }
    }

    /// Returns a short stable label (lowercase) for use in logs and config keys.
    pub fn as_label(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Stage => "stage",
            Environment::Production => "production",
        }
    }

    /// Fraction of available cores to fork workers for.
    ///
    /// Development and test boxes run half as many workers as cores.
    pub fn default_load_factor(self) -> f64 {
        match self {
            Environment::Development | Environment::Test => 0.5,
            Environment::Stage | Environment::Production => 1.0,
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "stage" | "staging" => Ok(Environment::Stage),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::UnknownEnvironment { name: s.to_string() }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Per-environment configuration of one unit.
///
/// ## Example
/// ```rust
/// use serde::Deserialize;
/// use unitvisor::{EnvConfig, Environment};
///
/// #[derive(Deserialize)]
/// struct Db { url: String }
///
/// let cfg: EnvConfig<Db> = EnvConfig::from_json(r#"{
///     "development": { "url": "postgres://localhost/dev" },
///     "production":  { "url": "postgres://db/prod" }
/// }"#).unwrap();
///
/// assert_eq!(cfg.select(Environment::Production).unwrap().url, "postgres://db/prod");
/// assert!(cfg.select(Environment::Stage).is_err());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct EnvConfig<T> {
    entries: HashMap<Environment, T>,
}

impl<T> Default for EnvConfig<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> EnvConfig<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the config for `env`.
    pub fn with(mut self, env: Environment, config: T) -> Self {
        self.entries.insert(env, config);
        self
    }

    /// Returns the config of the active environment.
    pub fn select(&self, env: Environment) -> Result<&T, ConfigError> {
        self.entries
            .get(&env)
            .ok_or(ConfigError::MissingEnvironment {
                environment: env.as_label(),
            })
    }
}

impl<T: DeserializeOwned> EnvConfig<T> {
    /// Parses a JSON object keyed by environment name.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Global configuration for the master and its workers.
///
/// ## Field semantics
/// - `environment`: active deployment environment (selects unit configs)
/// - `phase_timeout`: deadline of one unit phase call (`0s` = none)
/// - `grace`: how long the master waits for workers to exit after `Terminate`
/// - `bootstrap_timeout`: how long a freshly forked worker may take to report Online
/// - `load_factor`: workers per available core (`ceil`, at least one worker)
/// - `parallelism`: core count override (`0` = detect)
/// - `restart`: whether dead workers are replaced
/// - `max_consecutive_timeouts`: bootstrap timeouts after which a slot is abandoned (`0` = never)
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub environment: Environment,
    pub phase_timeout: Duration,
    pub grace: Duration,
    pub bootstrap_timeout: Duration,
    pub load_factor: f64,
    pub parallelism: usize,
    pub restart: RestartPolicy,
    pub max_consecutive_timeouts: u32,
    pub bus_capacity: usize,
}

impl RuntimeConfig {
    /// Defaults tuned for `env` (currently only the load factor differs).
    pub fn for_environment(env: Environment) -> Self {
        Self {
            environment: env,
            load_factor: env.default_load_factor(),
            ..Self::default()
        }
    }

    /// Returns the phase deadline as an `Option`.
    #[inline]
    pub fn phase_deadline(&self) -> Option<Duration> {
        if self.phase_timeout == Duration::ZERO {
            None
        } else {
            Some(self.phase_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Number of workers the master forks.
    pub fn workers(&self) -> usize {
        let parallelism = match self.parallelism {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };
        worker_count(parallelism, self.load_factor)
    }
}

impl Default for RuntimeConfig {
    /// Default configuration:
    ///
    /// - `environment = development`
    /// - `phase_timeout = 30s`, `grace = 30s`, `bootstrap_timeout = 2s`
    /// - `load_factor = 1.0`, `parallelism = 0` (detect)
    /// - `restart = OnUnexpectedExit`, `max_consecutive_timeouts = 0` (unlimited)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            phase_timeout: Duration::from_secs(30),
            grace: Duration::from_secs(30),
            bootstrap_timeout: Duration::from_secs(2),
            load_factor: 1.0,
            parallelism: 0,
            restart: RestartPolicy::default(),
            max_consecutive_timeouts: 0,
            bus_capacity: 1024,
        }
    }
}
