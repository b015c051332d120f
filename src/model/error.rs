use thiserror::Error;
use rand::distributions::WeightedError;
use super::config::ConfigError;
use super::item::ConsumerId;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    // Trust is positive/(positive+negative),
    // so both counters have to start above zero
    #[error("consumer {consumer} has non-positive experience ({positive}, {negative})")]
    InvalidExperience {
        consumer: ConsumerId,
        positive: f64,
        negative: f64,
    },

    #[error("invalid {name} distribution: {reason}")]
    Distribution {
        name: &'static str,
        reason: String,
    },

    #[error("could not pick an item for consumer {consumer}: {source}")]
    Selection {
        consumer: ConsumerId,
        source: WeightedError,
    },

    #[error("consumer {0} is scheduled but not part of the market")]
    UnknownConsumer(ConsumerId),
}
