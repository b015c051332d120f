use fnv::{FnvHashMap, FnvHashSet};
use itertools::Itertools;
use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use super::item::{Item, ItemId, ConsumerId, Recommendations};
use super::util::round3;

// A rating a consumer gave an item,
// either historical or reported as feedback
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Rating {
    pub consumer: ConsumerId,
    pub iid: ItemId,
    pub rating: f64,
}

// Produces fresh recommendations from ratings
pub trait Predictor {
    fn predict(&self, ratings: &[Rating], consumers: &[ConsumerId]) -> Recommendations;
}

// Recommends the most rated items, each predicted
// at its mean rating, skipping items the consumer
// has rated already.
pub struct PopularityPredictor {
    pub list_length: usize,
}

impl Predictor for PopularityPredictor {
    fn predict(&self, ratings: &[Rating], consumers: &[ConsumerId]) -> Recommendations {
        let mut stats: FnvHashMap<ItemId, (usize, f64)> = FnvHashMap::default();
        let mut rated: FnvHashMap<ConsumerId, FnvHashSet<ItemId>> = FnvHashMap::default();
        for r in ratings {
            let (count, sum) = stats.entry(r.iid).or_insert((0, 0.));
            *count += 1;
            *sum += r.rating;
            rated.entry(r.consumer).or_insert_with(FnvHashSet::default).insert(r.iid);
        }

        // Most rated first, then highest mean, then id
        // so the order doesn't depend on map iteration
        let popular: Vec<Item> = stats.into_iter()
            .map(|(iid, (count, sum))| (iid, count, sum / count as f64))
            .sorted_by(|(a_id, a_n, a_mu), (b_id, b_n, b_mu)| {
                b_n.cmp(a_n)
                    .then(b_mu.partial_cmp(a_mu).unwrap_or(Ordering::Equal))
                    .then(a_id.cmp(b_id))
            })
            .map(|(iid, _, mu)| Item::new(iid, round3(mu)))
            .collect();

        let empty = FnvHashSet::default();
        consumers.iter()
            .map(|c_id| {
                let seen = rated.get(c_id).unwrap_or(&empty);
                let items = popular.iter()
                    .filter(|item| !seen.contains(&item.iid))
                    .take(self.list_length)
                    .cloned()
                    .collect();
                (*c_id, items)
            })
            .collect()
    }
}
