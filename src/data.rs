use fnv::FnvHashMap;
use itertools::Itertools;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use super::config::SyntheticConfig;
use super::model::{MarketData, Item, ItemId, ConsumerId, Recommendations, Profits, Experience, Rating};

#[derive(Error, Debug)]
pub enum DataError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("could not parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0:?} has no consumers")]
    Empty(PathBuf),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let file = File::open(path).map_err(|e| DataError::Io { path: path.to_path_buf(), source: e })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| DataError::Json { path: path.to_path_buf(), source: e })
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, DataError> {
    if path.exists() {
        read_json(path).map(Some)
    } else {
        Ok(None)
    }
}

// Only the recommendation table is required
pub fn load(dir: &Path) -> Result<MarketData, DataError> {
    let recs_path = dir.join("recommendations.json");
    let recommendations: Recommendations = read_json(&recs_path)?;
    if recommendations.is_empty() {
        return Err(DataError::Empty(recs_path));
    }

    let popular: Option<Recommendations> = read_optional(&dir.join("recommendations_popular.json"))?;
    let profits: Option<Profits> = read_optional(&dir.join("profits.json"))?;
    let initial_experience: Option<FnvHashMap<ConsumerId, Experience>> =
        read_optional(&dir.join("initial_experience.json"))?;
    let ratings: Option<Vec<Rating>> = read_optional(&dir.join("ratings.json"))?;

    if profits.is_none() {
        warn!("no profits.json in {:?}, profits will be generated", dir);
    }
    info!(consumers = recommendations.len(), "loaded data from {:?}", dir);

    Ok(MarketData {
        recommendations: recommendations,
        popular: popular,
        profits: profits.unwrap_or_default(),
        initial_experience: initial_experience.unwrap_or_default(),
        ratings: ratings.unwrap_or_default(),
    })
}

// A made-up market: every item has a quality,
// every consumer a bias, and predictions are
// quality plus bias plus some noise.
pub fn synthetic(conf: &SyntheticConfig, rng: &mut StdRng) -> MarketData {
    let quality: Vec<f64> = (0..conf.items)
        .map(|_| rng.gen_range(1., 5.))
        .collect();
    let item_ids: Vec<ItemId> = (0..conf.items as ItemId).collect();

    // A handful of past ratings per consumer
    let n_rated = (conf.items - conf.list_length).min(5);

    let mut data = MarketData::default();
    for c_id in 0..conf.consumers as ConsumerId {
        let bias: f64 = rng.gen_range(-0.5, 0.5);
        let mut shuffled = item_ids.clone();
        shuffled.shuffle(rng);

        for iid in &shuffled[..n_rated] {
            let rating = (quality[*iid as usize] + bias + rng.gen_range(-1., 1.)).max(1.).min(5.).round();
            data.ratings.push(Rating { consumer: c_id, iid: *iid, rating: rating });
        }

        let mut items: Vec<Item> = shuffled[n_rated..].iter()
            .take(conf.list_length)
            .map(|iid| {
                let predicted = quality[*iid as usize] + bias + rng.gen_range(-0.25, 0.25);
                Item::new(*iid, (predicted.max(0.5).min(5.) * 1000.).round() / 1000.)
            })
            .collect();
        items.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal));
        data.recommendations.insert(c_id, items);
    }
    info!(consumers = conf.consumers, items = conf.items, "synthesized market");
    data
}

// Profits for every item that shows up anywhere,
// if the data didn't come with them
pub fn generate_profits(data: &mut MarketData, min: f64, max: f64, rng: &mut StdRng) {
    if !data.profits.is_empty() {
        return;
    }

    let from_recs = |recs: &Recommendations| -> Vec<ItemId> {
        recs.values().flat_map(|items| items.iter().map(|i| i.iid)).collect()
    };
    let mut iids = from_recs(&data.recommendations);
    if let Some(popular) = &data.popular {
        iids.extend(from_recs(popular));
    }
    iids.extend(data.ratings.iter().map(|r| r.iid));

    for iid in iids.into_iter().sorted().dedup() {
        let profit = if max > min { rng.gen_range(min, max) } else { min };
        data.profits.insert(iid, profit);
    }
}
