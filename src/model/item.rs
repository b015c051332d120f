use fnv::FnvHashMap;
use serde::{Serialize, Deserialize};
use std::cmp::Ordering;

pub type ItemId = u32;
pub type ConsumerId = u32;

// Consumer id -> items, best first
pub type Recommendations = FnvHashMap<ConsumerId, Vec<Item>>;

// Item id -> profit the provider
// makes when it is consumed
pub type Profits = FnvHashMap<ItemId, f64>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Item {
    pub iid: ItemId,

    // Predicted rating until consumed,
    // then the realized (true) utility
    pub rating: f64,

    // Whether the consumer reported the
    // realized rating back to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<bool>,
}

impl Item {
    pub fn new(iid: ItemId, rating: f64) -> Item {
        Item {
            iid: iid,
            rating: rating,
            feedback: None,
        }
    }
}

pub fn profit_of(profits: &Profits, iid: ItemId) -> f64 {
    profits.get(&iid).cloned().unwrap_or(0.)
}

// Reorder by a linear blend of predicted utility and profit.
// The sort is stable, so ties keep their current order
// and reranking an already reranked list changes nothing.
pub fn rerank(items: &mut Vec<Item>, profits: &Profits, weights: (f64, f64)) {
    let (w_utility, w_profit) = weights;
    let score = |item: &Item| w_utility * item.rating + w_profit * profit_of(profits, item.iid);
    items.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
}

pub fn top_n(recs: &Recommendations, n: usize) -> FnvHashMap<ConsumerId, Vec<Item>> {
    recs.iter()
        .map(|(c_id, items)| (*c_id, items.iter().take(n).cloned().collect()))
        .collect()
}

pub fn remove_item(items: &mut Vec<Item>, iid: ItemId) -> Option<Item> {
    let idx = items.iter().position(|item| item.iid == iid)?;
    Some(items.remove(idx))
}
