use fnv::{FnvHashMap, FnvHashSet};
use super::item::{Item, ItemId, ConsumerId, Recommendations};
use super::predict::Rating;

// What each consumer has consumed.
// `consumed` is kept for the whole run so that
// regenerated recommendations never re-offer an item;
// `pending` only holds consumptions since the last
// time feedback was collected.
#[derive(Debug, Default)]
pub struct ConsumptionHistory {
    consumed: FnvHashMap<ConsumerId, FnvHashSet<ItemId>>,
    pending: FnvHashMap<ConsumerId, Vec<Item>>,
}

impl ConsumptionHistory {
    pub fn record(&mut self, consumer: ConsumerId, item: Item) {
        self.consumed.entry(consumer).or_insert_with(FnvHashSet::default).insert(item.iid);
        self.pending.entry(consumer).or_insert_with(Vec::new).push(item);
    }

    #[cfg(test)]
    pub fn has_consumed(&self, consumer: ConsumerId, iid: ItemId) -> bool {
        self.consumed.get(&consumer).map_or(false, |items| items.contains(&iid))
    }

    // Realized ratings the consumers chose to report,
    // clearing the pending consumptions
    pub fn take_feedback(&mut self) -> Vec<Rating> {
        let mut ratings: Vec<Rating> = self.pending.drain()
            .flat_map(|(c_id, items)| {
                items.into_iter()
                    .filter(|item| item.feedback == Some(true))
                    .map(move |item| Rating { consumer: c_id, iid: item.iid, rating: item.rating })
            })
            .collect();

        // Map drain order isn't meaningful
        ratings.sort_by_key(|r| (r.consumer, r.iid));
        ratings
    }

    // Drop already consumed items from every list
    pub fn prune(&self, recs: &mut Recommendations) {
        for (c_id, items) in recs.iter_mut() {
            if let Some(consumed) = self.consumed.get(c_id) {
                items.retain(|item| !consumed.contains(&item.iid));
            }
        }
    }
}
