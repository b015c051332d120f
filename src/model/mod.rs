mod sim;
mod util;
mod item;
mod error;
mod social;
mod config;
mod history;
mod predict;
mod provider;
mod consumer;
mod schedule;
mod snapshot;
mod strategy;

pub use self::sim::{Simulation, MarketData};
pub use self::item::{Item, ItemId, ConsumerId, Recommendations, Profits};
pub use self::error::ModelError;
pub use self::config::{SimulationConfig, ConfigError};
pub use self::consumer::Experience;
pub use self::predict::Rating;
