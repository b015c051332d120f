use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Dirichlet, Normal};
use statrs::function::beta::ln_beta;
use std::cmp::Ordering;
use super::config::SimulationConfig;
use super::error::ModelError;

pub static MIN_UTILITY: f64 = 0.5;
pub static MAX_UTILITY: f64 = 5.;

pub fn uniform(rng: &mut StdRng) -> f64 {
    rng.gen::<f64>()
}

pub fn round3(x: f64) -> f64 {
    (x * 1000.).round() / 1000.
}

// Predicted rating plus noise,
// kept on the rating scale
pub fn realize_utility(predicted: f64, error: f64) -> f64 {
    round3((predicted + error).max(MIN_UTILITY).min(MAX_UTILITY))
}

// The random draws agents need beyond plain uniforms.
// Built once per run since the parameters are fixed.
pub struct Sampler {
    error: Normal<f64>,
    ranks: Option<Dirichlet<f64>>,
}

impl Sampler {
    pub fn new(conf: &SimulationConfig) -> Result<Sampler, ModelError> {
        let error = Normal::new(conf.error.mu, conf.error.sd)
            .map_err(|e| ModelError::Distribution { name: "error", reason: format!("{:?}", e) })?;

        // A single-item list has nothing to rank
        let ranks = if conf.recommendation_length > 1 {
            let alpha = vec![1.; conf.recommendation_length];
            let dirichlet = Dirichlet::new(alpha)
                .map_err(|e| ModelError::Distribution { name: "rank", reason: format!("{:?}", e) })?;
            Some(dirichlet)
        } else {
            None
        };

        Ok(Sampler {
            error: error,
            ranks: ranks,
        })
    }

    pub fn error(&self, rng: &mut StdRng) -> f64 {
        self.error.sample(rng)
    }

    // Flat Dirichlet sample sorted descending,
    // so earlier ranks get the larger weights
    pub fn rank_weights(&self, rng: &mut StdRng) -> Vec<f64> {
        match &self.ranks {
            Some(dirichlet) => {
                let mut weights = dirichlet.sample(rng);
                weights.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
                weights
            },
            None => vec![1.],
        }
    }
}

// k * ln(y), taking 0 * ln(0) as 0
fn xlogy(k: f64, y: f64) -> f64 {
    if k == 0. { 0. } else { k * y.ln() }
}

// Density of Beta(a, b) at x
pub fn beta_pdf(x: f64, a: f64, b: f64) -> f64 {
    if !(0. ..=1.).contains(&x) {
        return 0.;
    }
    (xlogy(a - 1., x) + xlogy(b - 1., 1. - x) - ln_beta(a, b)).exp()
}

// Quantile with linear interpolation between
// the closest ranks. None if there are no values.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let pos = q.max(0.).min(1.) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_realize_utility() {
        assert_eq!(realize_utility(3., 0.), 3.);
        assert_eq!(realize_utility(4.8, 1.), 5.);
        assert_eq!(realize_utility(0.6, -2.), 0.5);
        assert_eq!(realize_utility(3., 0.12345), 3.123);
    }

    #[test]
    fn test_beta_pdf() {
        // Beta(2, 2) is 6x(1-x)
        for &x in [0., 0.1, 0.25, 0.5, 0.9, 1.].iter() {
            assert!(close(beta_pdf(x, 2., 2.), 6. * x * (1. - x)));
        }
        assert_eq!(beta_pdf(1.5, 2., 2.), 0.);

        // Uniform
        assert!(close(beta_pdf(0., 1., 1.), 1.));
        assert!(close(beta_pdf(0.3, 1., 1.), 1.));
    }

    #[test]
    fn test_quantile() {
        let values = [4., 1., 3., 2.];
        assert_eq!(quantile(&values, 0.), Some(1.));
        assert_eq!(quantile(&values, 1.), Some(4.));
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert!(close(quantile(&values, 0.25).unwrap(), 1.75));
        assert_eq!(quantile(&[3.], 0.7), Some(3.));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_rank_weights() {
        let mut conf = SimulationConfig::default();
        conf.recommendation_length = 5;
        let sampler = Sampler::new(&conf).unwrap();
        let mut rng: StdRng = SeedableRng::seed_from_u64(0);
        for _ in 0..20 {
            let weights = sampler.rank_weights(&mut rng);
            assert_eq!(weights.len(), 5);
            assert!(close(weights.iter().sum::<f64>(), 1.));
            assert!(weights.windows(2).all(|w| w[0] >= w[1]));
        }

        conf.recommendation_length = 1;
        let sampler = Sampler::new(&conf).unwrap();
        assert_eq!(sampler.rank_weights(&mut rng), vec![1.]);
    }

    #[test]
    fn test_zero_error() {
        let mut conf = SimulationConfig::default();
        conf.error.mu = 0.;
        conf.error.sd = 0.;
        let sampler = Sampler::new(&conf).unwrap();
        let mut rng: StdRng = SeedableRng::seed_from_u64(1);
        assert_eq!(sampler.error(&mut rng), 0.);
    }
}
