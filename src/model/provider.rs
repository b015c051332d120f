use fnv::FnvHashMap;
use tracing::debug;
use super::item::{self, Item, ItemId, ConsumerId, Recommendations, Profits};
use super::strategy::Strategy;

// The recommendation provider.
// Owns the recommendation table and
// tracks what it earns each step.
#[derive(Debug)]
pub struct Provider {
    pub strategy: Strategy,
    recommendations: Recommendations,
    profits: Profits,
    recommendation_length: usize,

    // Refreshed from the table at
    // the start of each step
    top_n: FnvHashMap<ConsumerId, Vec<Item>>,

    // Reset each step
    pub total_profit: f64,
    pub n_consumptions: usize,
    pub avg_profit_per_consumption: f64,
}

impl Provider {
    pub fn new(strategy: Strategy, recommendations: Recommendations, profits: Profits, recommendation_length: usize) -> Provider {
        Provider {
            strategy: strategy,
            recommendations: recommendations,
            profits: profits,
            recommendation_length: recommendation_length,
            top_n: FnvHashMap::default(),
            total_profit: 0.,
            n_consumptions: 0,
            avg_profit_per_consumption: 0.,
        }
    }

    pub fn step(&mut self) {
        self.reset();
        self.apply_strategy();
    }

    pub fn reset(&mut self) {
        self.total_profit = 0.;
        self.n_consumptions = 0;
        self.avg_profit_per_consumption = 0.;
    }

    pub fn apply_strategy(&mut self) {
        if let Some(weights) = self.strategy.weights() {
            for items in self.recommendations.values_mut() {
                item::rerank(items, &self.profits, weights);
            }
        }
        self.top_n = item::top_n(&self.recommendations, self.recommendation_length);
    }

    // This step's candidates for a consumer
    pub fn recommended(&self, consumer: ConsumerId) -> &[Item] {
        self.top_n.get(&consumer).map(|items| items.as_slice()).unwrap_or(&[])
    }

    // A consumer's full remaining list
    pub fn recommendations(&self, consumer: ConsumerId) -> &[Item] {
        self.recommendations.get(&consumer).map(|items| items.as_slice()).unwrap_or(&[])
    }

    pub fn consumers(&self) -> impl Iterator<Item=&ConsumerId> {
        self.recommendations.keys()
    }

    // Consumed items are never recommended
    // to the same consumer again
    pub fn remove_consumed(&mut self, consumer: ConsumerId, iid: ItemId) -> Option<Item> {
        self.recommendations.get_mut(&consumer)
            .and_then(|items| item::remove_item(items, iid))
    }

    pub fn replace_recommendations(&mut self, recommendations: Recommendations) {
        self.recommendations = recommendations;
    }

    pub fn profit(&self, iid: ItemId) -> f64 {
        item::profit_of(&self.profits, iid)
    }

    pub fn record_consumption(&mut self, item: &Item) {
        if !self.profits.contains_key(&item.iid) {
            debug!(item = item.iid, "no profit data for item, counting it as 0");
        }
        self.total_profit += self.profit(item.iid);
        self.n_consumptions += 1;
        self.avg_profit_per_consumption = self.total_profit / self.n_consumptions as f64;
    }
}
