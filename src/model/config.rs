use serde::{Serialize, Deserialize};
use thiserror::Error;
use super::strategy::Strategy;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{field} is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },

    #[error("unknown recommendation strategy {0:?}")]
    UnknownStrategy(String),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(rename_all = "UPPERCASE")]
#[serde(default)]
pub struct SimulationConfig {
    // One of the `Strategy` names. Unknown names
    // fall back to popularity-based recommendations
    // unless `strict_strategy` is set.
    pub recommendation_strategy: String,
    pub strict_strategy: bool,

    // How many items the provider
    // recommends to each consumer per step
    pub recommendation_length: usize,

    pub social_media_on: bool,

    // Scales how far social influence can
    // push consumption probability away from trust
    pub social_media_reliance: f64,

    // Blend of own trust and observed
    // reputation when a consumer looks at social media
    pub trust_weight: f64,
    pub social_media_weight: f64,

    // Rejection thresholds: a consumer observes/gives feedback
    // when a uniform draw is at or above these values
    pub observing_socialmedia_likelihood: f64,
    pub feedback_likelihood: f64,

    // Number of posts at which social
    // influence reaches full strength
    pub numposts_threshold: f64,

    pub drop_out_on: bool,
    pub dropout_threshold: f64,
    pub frequency_dropout_check: usize,

    // Noise between predicted and true utility
    pub error: ErrorConfig,

    // Expectation thresholds are this quantile
    // of a consumer's candidate ratings,
    // recomputed every `frequency_update_expectation` steps
    pub quantile_consumer_expectation: f64,
    pub frequency_update_expectation: usize,

    // If set, feedback is folded back into the
    // predictions every this many steps
    pub frequency_recompute_utilities: Option<usize>,

    // Experience increment for a surprise of d:
    // base + scale * d
    pub experience_base: f64,
    pub experience_scale: f64,

    // (positive, negative) for consumers
    // without initial experience data
    pub default_experience: (f64, f64),
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Copy, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub struct ErrorConfig {
    pub mu: f64,
    pub sd: f64,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        ErrorConfig { mu: 0., sd: 0.5 }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            recommendation_strategy: Strategy::PopularBased.to_string(),
            strict_strategy: false,
            recommendation_length: 10,
            social_media_on: true,
            social_media_reliance: 0.2,
            trust_weight: 0.5,
            social_media_weight: 0.5,
            observing_socialmedia_likelihood: 0.5,
            feedback_likelihood: 0.5,
            numposts_threshold: 100.,
            drop_out_on: true,
            dropout_threshold: 0.9,
            frequency_dropout_check: 1,
            error: ErrorConfig::default(),
            quantile_consumer_expectation: 0.5,
            frequency_update_expectation: 10,
            frequency_recompute_utilities: None,
            experience_base: 1.,
            experience_scale: 1.,
            default_experience: (1., 1.),
        }
    }
}

impl SimulationConfig {
    pub fn strategy(&self) -> Result<Strategy, ConfigError> {
        Strategy::parse(&self.recommendation_strategy, self.strict_strategy)
    }

    // Monotonic in d and always positive
    // as long as the config validated
    pub fn experience_increment(&self, d: f64) -> f64 {
        self.experience_base + self.experience_scale * d
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy()?;

        if self.recommendation_length == 0 {
            return Err(invalid("RECOMMENDATION_LENGTH", "must be at least 1"));
        }

        let probabilities = [
            ("OBSERVING_SOCIALMEDIA_LIKELIHOOD", self.observing_socialmedia_likelihood),
            ("FEEDBACK_LIKELIHOOD", self.feedback_likelihood),
            ("QUANTILE_CONSUMER_EXPECTATION", self.quantile_consumer_expectation),
        ];
        for &(field, p) in probabilities.iter() {
            if !(0. ..=1.).contains(&p) {
                return Err(invalid(field, format!("{} is outside [0, 1]", p)));
            }
        }

        let non_negative = [
            ("SOCIAL_MEDIA_RELIANCE", self.social_media_reliance),
            ("TRUST_WEIGHT", self.trust_weight),
            ("SOCIAL_MEDIA_WEIGHT", self.social_media_weight),
            ("DROPOUT_THRESHOLD", self.dropout_threshold),
            ("EXPERIENCE_SCALE", self.experience_scale),
        ];
        for &(field, v) in non_negative.iter() {
            if !(v >= 0.) {
                return Err(invalid(field, format!("{} is negative", v)));
            }
        }

        if !(self.error.sd >= 0.) || !self.error.mu.is_finite() {
            return Err(invalid("ERROR", format!("mu {} sd {}", self.error.mu, self.error.sd)));
        }
        if !(self.numposts_threshold > 0.) {
            return Err(invalid("NUMPOSTS_THRESHOLD", "must be positive"));
        }
        if !(self.experience_base > 0.) {
            return Err(invalid("EXPERIENCE_BASE", "must be positive"));
        }
        let (pos, neg) = self.default_experience;
        if !(pos > 0. && neg > 0.) {
            return Err(invalid("DEFAULT_EXPERIENCE", format!("({}, {}) must be positive", pos, neg)));
        }

        let frequencies = [
            ("FREQUENCY_DROPOUT_CHECK", Some(self.frequency_dropout_check)),
            ("FREQUENCY_UPDATE_EXPECTATION", Some(self.frequency_update_expectation)),
            ("FREQUENCY_RECOMPUTE_UTILITIES", self.frequency_recompute_utilities),
        ];
        for &(field, freq) in frequencies.iter() {
            if freq == Some(0) {
                return Err(invalid(field, "must be at least 1"));
            }
        }
        Ok(())
    }
}
