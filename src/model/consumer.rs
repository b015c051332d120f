use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Serialize, Deserialize};
use tracing::debug;
use super::config::SimulationConfig;
use super::error::ModelError;
use super::history::ConsumptionHistory;
use super::item::{Item, ConsumerId};
use super::provider::Provider;
use super::social::{self, SocialLedger};
use super::util::{self, Sampler};

// Counts of positive and negative experiences,
// the parameters of a Beta distribution over
// how good the provider's recommendations are
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Experience {
    pub positive: f64,
    pub negative: f64,
}

impl From<(f64, f64)> for Experience {
    fn from((positive, negative): (f64, f64)) -> Experience {
        Experience { positive, negative }
    }
}

impl From<Experience> for (f64, f64) {
    fn from(e: Experience) -> (f64, f64) {
        (e.positive, e.negative)
    }
}

impl Experience {
    // Expected value of the Beta distribution.
    // This is the only place trust is computed.
    pub fn trust(&self) -> f64 {
        self.positive / (self.positive + self.negative)
    }

    pub fn is_valid(&self) -> bool {
        self.positive > 0. && self.negative > 0.
    }

    pub fn add(&mut self, satisfied: bool, amount: f64) {
        if satisfied {
            self.positive += amount;
        } else {
            self.negative += amount;
        }
    }
}

// Everything outside the consumer that
// it reads or changes during its turn
pub struct Environment<'a> {
    pub conf: &'a SimulationConfig,
    pub sampler: &'a Sampler,
    pub tick: usize,
    pub social_influence: f64,
    pub provider: &'a mut Provider,
    pub ledger: &'a mut SocialLedger,
    pub history: &'a mut ConsumptionHistory,

    // Consumers to remove once the step is over
    pub dropouts: &'a mut Vec<ConsumerId>,
}

#[derive(Debug, Clone)]
pub struct Consumer {
    pub id: ConsumerId,
    pub experience: Experience,
    pub initial_trust: f64,

    // Minimum true utility for an
    // experience to count as satisfying
    pub threshold: f64,

    pub consumption_probability: f64,
    pub limits: (f64, f64),

    // Last reputation seen on social media
    pub reputation: f64,

    pub true_utility: f64,
    pub selected: Option<Item>,
    pub active: bool,
}

impl Consumer {
    pub fn new(id: ConsumerId, experience: Experience, threshold: f64) -> Result<Consumer, ModelError> {
        if !experience.is_valid() {
            return Err(ModelError::InvalidExperience {
                consumer: id,
                positive: experience.positive,
                negative: experience.negative,
            });
        }
        let trust = experience.trust();
        Ok(Consumer {
            id: id,
            experience: experience,
            initial_trust: trust,
            threshold: threshold,
            consumption_probability: trust,
            limits: (0., 0.),
            reputation: 0.,
            true_utility: 0.,
            selected: None,
            active: true,
        })
    }

    pub fn trust(&self) -> f64 {
        self.experience.trust()
    }

    pub fn is_satisfied(&self) -> bool {
        self.true_utility >= self.threshold
    }

    pub fn should_drop_out(&self, dropout_threshold: f64) -> bool {
        self.trust() < self.initial_trust * dropout_threshold
    }

    pub fn step(&mut self, env: &mut Environment, rng: &mut StdRng) -> Result<(), ModelError> {
        let conf = env.conf;
        if conf.drop_out_on
            && (env.tick + 1) % conf.frequency_dropout_check == 0
            && self.should_drop_out(conf.dropout_threshold) {
            env.dropouts.push(self.id);
        }

        self.selected = None;
        let candidates = env.provider.recommended(self.id);
        if candidates.is_empty() {
            debug!(consumer = self.id, tick = env.tick, "no more items available");
        } else if self.decide_to_consume(rng) {
            let item = self.pick_item(candidates, env.sampler, rng)?;
            self.consume(item, env, rng);
        }

        self.update_limits(env.social_influence * conf.social_media_reliance);
        self.update_consumption_probability(conf, env.ledger, rng);
        Ok(())
    }

    fn decide_to_consume(&self, rng: &mut StdRng) -> bool {
        self.consumption_probability >= util::uniform(rng)
    }

    // Sample from the candidates, favoring the
    // top of the list without always taking it
    fn pick_item(&self, candidates: &[Item], sampler: &Sampler, rng: &mut StdRng) -> Result<Item, ModelError> {
        let weights = sampler.rank_weights(rng);
        let weighted: Vec<(&Item, f64)> = candidates.iter().zip(weights).collect();
        weighted.choose_weighted(rng, |(_, w)| *w)
            .map(|(item, _)| (*item).clone())
            .map_err(|e| ModelError::Selection { consumer: self.id, source: e })
    }

    fn consume(&mut self, mut item: Item, env: &mut Environment, rng: &mut StdRng) {
        self.true_utility = util::realize_utility(item.rating, env.sampler.error(rng));
        let satisfied = self.is_satisfied();

        // Bigger surprises move trust more
        let d = (self.threshold - self.true_utility).abs();
        self.experience.add(satisfied, env.conf.experience_increment(d));

        let feedback = util::uniform(rng) >= env.conf.feedback_likelihood;
        item.rating = self.true_utility;
        item.feedback = Some(feedback);
        env.provider.remove_consumed(self.id, item.iid);

        if env.conf.social_media_on {
            self.post(env.ledger, satisfied, rng);
        }

        env.provider.record_consumption(&item);
        env.history.record(self.id, item.clone());
        self.selected = Some(item);
    }

    fn post(&self, ledger: &mut SocialLedger, satisfied: bool, rng: &mut StdRng) {
        if util::uniform(rng) >= social::post_probability(self.true_utility) {
            ledger.post(satisfied);
        }
    }

    fn observe(&mut self, ledger: &SocialLedger, observing_likelihood: f64, rng: &mut StdRng) -> bool {
        if util::uniform(rng) >= observing_likelihood {
            self.reputation = ledger.reputation();
            true
        } else {
            false
        }
    }

    fn update_limits(&mut self, deviation: f64) {
        let trust = self.trust();
        self.limits = (
            f64::max(trust - deviation, 0.),
            f64::min(trust + deviation, 1.),
        );
    }

    fn update_consumption_probability(&mut self, conf: &SimulationConfig, ledger: &SocialLedger, rng: &mut StdRng) {
        let trust = self.trust();
        self.consumption_probability = trust;
        if conf.social_media_on && self.observe(ledger, conf.observing_socialmedia_likelihood, rng) {
            let (lower, upper) = self.limits;
            let blended = conf.trust_weight * trust + conf.social_media_weight * self.reputation;
            self.consumption_probability = blended.max(lower).min(upper);
        }
    }
}
