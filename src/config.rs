use rand::Rng;
use serde::{Serialize, Deserialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;
use super::model::{SimulationConfig, ConfigError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not open config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("error while reading yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("could not parse {var}={value:?}")]
    Env {
        var: &'static str,
        value: String,
    },

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

// Shape of the generated market
// when no data directory is given
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
#[serde(default)]
pub struct SyntheticConfig {
    pub consumers: usize,
    pub items: usize,
    pub list_length: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            consumers: 100,
            items: 500,
            list_length: 50,
        }
    }
}

fn default_steps() -> usize { 100 }
fn default_runs() -> usize { 1 }
fn default_profit_max() -> f64 { 1. }
fn random_seed() -> u64 { rand::thread_rng().gen() }

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub struct Config {
    #[serde(default = "default_steps")]
    pub steps: usize,

    // Run i uses seed + i
    #[serde(default = "random_seed")]
    pub seed: u64,

    #[serde(default = "default_runs")]
    pub runs: usize,

    // Also record every consumer each step
    #[serde(default)]
    pub debug: bool,

    // Directory with the recommendation tables.
    // Synthesized if not set.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub synthetic: SyntheticConfig,

    // Range of generated profits, used
    // when there's no profit table
    #[serde(default)]
    pub profit_min: f64,
    #[serde(default = "default_profit_max")]
    pub profit_max: f64,

    #[serde(default)]
    pub simulation: SimulationConfig,

    // Where this config was read from
    #[serde(skip)]
    pub path: PathBuf,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Config, LoadError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> Result<Config, LoadError> {
        let yaml = fs::read_to_string(path).map_err(|e| LoadError::Io { path: path.to_path_buf(), source: e })?;
        let mut conf = Config::from_yaml(&yaml)?;
        conf.path = path.to_path_buf();
        Ok(conf)
    }

    // Overrides from the environment,
    // looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), LoadError>
        where F: Fn(&'static str) -> Option<String> {
        if let Some(value) = lookup("STEPS") {
            self.steps = parse_var("STEPS", value)?;
        }
        if let Some(value) = lookup("SEED") {
            self.seed = parse_var("SEED", value)?;
        }
        if let Some(value) = lookup("RUNS") {
            self.runs = parse_var("RUNS", value)?;
        }
        if let Some(value) = lookup("DEBUG") {
            self.debug = value == "1" || value == "true";
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runs == 0 {
            return Err(ConfigError::Invalid { field: "RUNS", reason: "must be at least 1".to_string() });
        }
        if self.profit_min < 0. || self.profit_min > self.profit_max {
            return Err(ConfigError::Invalid {
                field: "PROFIT_MIN",
                reason: format!("need 0 <= PROFIT_MIN <= PROFIT_MAX, got {} and {}", self.profit_min, self.profit_max),
            });
        }
        if self.data_dir.is_none() && self.synthetic.list_length > self.synthetic.items {
            return Err(ConfigError::Invalid {
                field: "SYNTHETIC",
                reason: format!("LIST_LENGTH {} is more than ITEMS {}", self.synthetic.list_length, self.synthetic.items),
            });
        }
        self.simulation.validate()
    }
}

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, LoadError> {
    value.parse().map_err(|_| LoadError::Env { var: var, value: value.clone() })
}

pub fn load_config() -> Result<Config, LoadError> {
    let path = env::var("CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let mut conf = Config::from_file(Path::new(&path))?;
    conf.apply_overrides(|var| env::var(var).ok())?;
    conf.validate()?;

    info!(seed = conf.seed, steps = conf.steps, runs = conf.runs, "loaded {:?}", conf.path);
    info!("{:?}", conf);
    Ok(conf)
}
