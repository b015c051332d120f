use serde::Serialize;
use super::consumer::Consumer;
use super::item::{Item, ConsumerId};
use super::strategy::Strategy;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConsumerSnapshot {
    pub tick: usize,
    pub consumer: ConsumerId,
    pub trust: f64,
    pub threshold: f64,
    pub true_utility: f64,
    pub consumption_probability: f64,
    pub lower: f64,
    pub upper: f64,

    // Judged on the last realized utility,
    // which carries over ticks with no consumption
    pub satisfied: bool,
    pub positive: f64,
    pub negative: f64,

    // Only set on ticks the consumer consumed
    pub item: Option<Item>,
}

impl ConsumerSnapshot {
    pub fn of(tick: usize, consumer: &Consumer) -> ConsumerSnapshot {
        let (lower, upper) = consumer.limits;
        ConsumerSnapshot {
            tick: tick,
            consumer: consumer.id,
            trust: consumer.trust(),
            threshold: consumer.threshold,
            true_utility: consumer.true_utility,
            consumption_probability: consumer.consumption_probability,
            lower: lower,
            upper: upper,
            satisfied: consumer.is_satisfied(),
            positive: consumer.experience.positive,
            negative: consumer.experience.negative,
            item: consumer.selected.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    pub tick: usize,
    pub strategy: Strategy,
    pub total_profit: f64,
    pub n_consumptions: usize,
    pub avg_profit_per_consumption: f64,
    pub active_consumers: usize,
    pub likes: u64,
    pub dislikes: u64,
    pub social_influence: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TickSnapshot {
    pub model: ModelSnapshot,

    // Empty unless consumer detail was asked for
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumers: Vec<ConsumerSnapshot>,
}
