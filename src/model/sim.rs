use fnv::FnvHashMap;
use itertools::Itertools;
use rand::rngs::StdRng;
use std::time::Instant;
use tracing::{debug, info};
use super::config::SimulationConfig;
use super::consumer::{Consumer, Environment, Experience};
use super::error::ModelError;
use super::history::ConsumptionHistory;
use super::item::{ConsumerId, Recommendations, Profits};
use super::predict::{Predictor, PopularityPredictor, Rating};
use super::provider::Provider;
use super::schedule::{Activate, AgentKind, AgentRef, TypeOrderedScheduler};
use super::snapshot::{ConsumerSnapshot, ModelSnapshot, TickSnapshot};
use super::social::SocialLedger;
use super::strategy::Strategy;
use super::util::{self, Sampler};

// The tables the market is built from
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    // Predicted consumer utilities, best first
    pub recommendations: Recommendations,

    // Most popular items per consumer. If missing,
    // derived from `ratings` when needed.
    pub popular: Option<Recommendations>,

    pub profits: Profits,
    pub initial_experience: FnvHashMap<ConsumerId, Experience>,
    pub ratings: Vec<Rating>,
}

// Everything the agents share, lent
// out piecewise to whichever agent is active
pub struct Market {
    conf: SimulationConfig,
    sampler: Sampler,
    pub provider: Provider,
    pub consumers: FnvHashMap<ConsumerId, Consumer>,
    pub ledger: SocialLedger,
    pub history: ConsumptionHistory,

    // Filled during a step, emptied after it
    dropouts: Vec<ConsumerId>,

    pub social_influence: f64,
    pub tick: usize,
}

impl Activate for Market {
    fn activate(&mut self, agent: AgentRef, rng: &mut StdRng) -> Result<(), ModelError> {
        match agent {
            AgentRef::Provider => {
                self.provider.step();
                Ok(())
            },
            AgentRef::Consumer(id) => {
                let consumer = self.consumers.get_mut(&id)
                    .ok_or(ModelError::UnknownConsumer(id))?;
                let mut env = Environment {
                    conf: &self.conf,
                    sampler: &self.sampler,
                    tick: self.tick,
                    social_influence: self.social_influence,
                    provider: &mut self.provider,
                    ledger: &mut self.ledger,
                    history: &mut self.history,
                    dropouts: &mut self.dropouts,
                };
                consumer.step(&mut env, rng)
            }
        }
    }
}

impl Market {
    pub fn n_active(&self) -> usize {
        self.consumers.values().filter(|c| c.active).count()
    }
}

pub struct Simulation {
    pub market: Market,
    pub schedule: TypeOrderedScheduler,

    // Historical ratings plus
    // feedback collected so far
    ratings: Vec<Rating>,
    predictor: Box<dyn Predictor>,
}

impl Simulation {
    pub fn new(conf: &SimulationConfig, data: MarketData) -> Result<Simulation, ModelError> {
        conf.validate()?;
        let strategy = conf.strategy()?;
        let sampler = Sampler::new(conf)?;

        // Regenerated lists are as long as the longest given one
        let list_length = data.recommendations.values()
            .map(|items| items.len())
            .max()
            .unwrap_or(0)
            .max(conf.recommendation_length);
        let predictor = Box::new(PopularityPredictor { list_length: list_length });

        // Thresholds start from the predicted utilities,
        // whatever table the provider ends up using
        let thresholds: FnvHashMap<ConsumerId, f64> = data.recommendations.iter()
            .map(|(c_id, items)| (*c_id, initial_threshold(conf, items.iter().map(|i| i.rating))))
            .collect();

        let consumer_ids: Vec<ConsumerId> = data.recommendations.keys().cloned().sorted().collect();
        let recommendations = match strategy {
            Strategy::PopularBased => match data.popular {
                Some(popular) => popular,
                None => predictor.predict(&data.ratings, &consumer_ids),
            },
            _ => data.recommendations,
        };

        let default_experience = Experience::from(conf.default_experience);
        let mut consumers = FnvHashMap::default();
        for id in &consumer_ids {
            let experience = data.initial_experience.get(id).cloned().unwrap_or(default_experience);
            let threshold = thresholds.get(id).cloned().unwrap_or(0.);
            consumers.insert(*id, Consumer::new(*id, experience, threshold)?);
        }

        // Provider goes first every step
        let mut schedule = TypeOrderedScheduler::new();
        schedule.add(AgentRef::Provider);
        for id in &consumer_ids {
            schedule.add(AgentRef::Consumer(*id));
        }

        info!(consumers = consumer_ids.len(), strategy = %strategy, "market ready");

        let provider = Provider::new(strategy, recommendations, data.profits, conf.recommendation_length);
        Ok(Simulation {
            market: Market {
                conf: conf.clone(),
                sampler: sampler,
                provider: provider,
                consumers: consumers,
                ledger: SocialLedger::default(),
                history: ConsumptionHistory::default(),
                dropouts: Vec::new(),
                social_influence: 0.,
                tick: 0,
            },
            schedule: schedule,
            ratings: data.ratings,
            predictor: predictor,
        })
    }

    pub fn step(&mut self, rng: &mut StdRng) -> Result<(), ModelError> {
        let start = Instant::now();
        let tick = self.schedule.steps;

        if (tick + 1) % self.market.conf.frequency_update_expectation == 0 {
            self.update_thresholds();
        }

        if let Some(freq) = self.market.conf.frequency_recompute_utilities {
            if (tick + 1) % freq == 0 {
                self.refresh_predictions();
            }
        }

        self.market.tick = tick;
        self.market.social_influence = self.market.ledger.influence(self.market.conf.numposts_threshold);
        self.schedule.step(&mut self.market, rng)?;

        let dropouts: Vec<ConsumerId> = self.market.dropouts.drain(..).collect();
        for id in dropouts {
            if let Some(consumer) = self.market.consumers.get_mut(&id) {
                consumer.active = false;
            }
            self.schedule.remove(AgentRef::Consumer(id));
            debug!(consumer = id, tick = tick, "consumer dropped out");
        }

        debug!(
            tick = tick,
            consumptions = self.market.provider.n_consumptions,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "step done");
        Ok(())
    }

    // Expectations drift with what is being offered.
    // A consumer with nothing left keeps its threshold.
    pub fn update_thresholds(&mut self) {
        let q = self.market.conf.quantile_consumer_expectation;
        let provider = &self.market.provider;
        for consumer in self.market.consumers.values_mut().filter(|c| c.active) {
            let ratings: Vec<f64> = provider.recommendations(consumer.id).iter()
                .map(|item| item.rating)
                .collect();
            if let Some(threshold) = util::quantile(&ratings, q) {
                consumer.threshold = threshold;
            }
        }
    }

    // Fold reported feedback into the ratings. Only the
    // popularity table is regenerated from them; the other
    // strategies keep ranking the predicted utilities.
    pub fn refresh_predictions(&mut self) {
        let feedback = self.market.history.take_feedback();
        debug!(n_feedback = feedback.len(), "refreshing predictions");
        self.ratings.extend(feedback);
        if self.market.provider.strategy != Strategy::PopularBased {
            return;
        }

        let consumers: Vec<ConsumerId> = self.market.provider.consumers().cloned().sorted().collect();
        let mut recommendations = self.predictor.predict(&self.ratings, &consumers);
        self.market.history.prune(&mut recommendations);
        self.market.provider.replace_recommendations(recommendations);
    }

    // State after the last step. Consumer
    // detail is only included when asked for.
    pub fn snapshot(&self, include_consumers: bool) -> TickSnapshot {
        // The tick that was just run
        let tick = self.schedule.steps.saturating_sub(1);
        let provider = &self.market.provider;
        let ledger = &self.market.ledger;
        let model = ModelSnapshot {
            tick: tick,
            strategy: provider.strategy,
            total_profit: provider.total_profit,
            n_consumptions: provider.n_consumptions,
            avg_profit_per_consumption: provider.avg_profit_per_consumption,
            active_consumers: self.schedule.count(AgentKind::Consumer),
            likes: ledger.likes,
            dislikes: ledger.dislikes,
            social_influence: self.market.social_influence,
        };

        let consumers = if include_consumers {
            self.market.consumers.values()
                .filter(|c| c.active)
                .sorted_by_key(|c| c.id)
                .map(|c| ConsumerSnapshot::of(tick, c))
                .collect()
        } else {
            Vec::new()
        };

        TickSnapshot {
            model: model,
            consumers: consumers,
        }
    }
}

fn initial_threshold(conf: &SimulationConfig, ratings: impl Iterator<Item=f64>) -> f64 {
    let ratings: Vec<f64> = ratings.collect();
    util::quantile(&ratings, conf.quantile_consumer_expectation).unwrap_or(0.)
}
