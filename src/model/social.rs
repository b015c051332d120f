use serde::Serialize;
use super::util::beta_pdf;

// Public sentiment about the provider.
// Consumers post to it after consuming
// and read it when deciding whether to consume.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct SocialLedger {
    pub likes: u64,
    pub dislikes: u64,
}

impl SocialLedger {
    pub fn n_posts(&self) -> u64 {
        self.likes + self.dislikes
    }

    pub fn post(&mut self, satisfied: bool) {
        if satisfied {
            self.likes += 1;
        } else {
            self.dislikes += 1;
        }
    }

    // Share of likes. The extra 1 in the denominator
    // keeps an empty ledger at 0 rather than undefined.
    pub fn reputation(&self) -> f64 {
        self.likes as f64 / (self.n_posts() + 1) as f64
    }

    // How strongly social media can move consumers,
    // saturating once there are `numposts_threshold` posts
    pub fn influence(&self, numposts_threshold: f64) -> f64 {
        f64::min(self.n_posts() as f64 / numposts_threshold, 1.)
    }
}

// U-shaped in utility: lowest for middling
// experiences, highest at the extremes.
// A consumer posts when a uniform draw is at or above it.
pub fn post_probability(true_utility: f64) -> f64 {
    (1.4 - beta_pdf(true_utility / 5., 2., 2.) + 0.2) / 1.6
}
