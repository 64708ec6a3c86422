use std::fmt;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand_distr::Distribution as _;
use serde::{Serialize, Deserialize};

use crate::mdl::{real_code_length, REAL_PRECISION_DIGITS};

/// Digits of precision coded for the geometric success probability.
const GEOMETRIC_PRECISION_DIGITS: f64 = 5.0;

#[derive(Debug, PartialEq)]
pub enum FitError {
    NoData,
    InvalidParameters { distribution: &'static str },
}

/// A parametric distribution over the integers. Values are parameters
/// only; sampling goes through a caller-supplied generator.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub enum DiscreteDistribution {
    /// All mass on a single value.
    Degenerate { value: i64 },
    /// Poisson with support shifted to start at `shift`.
    Poisson { rate: f64, shift: i64 },
    /// Geometric on {1, 2, ...} with success probability `p`.
    Geometric { p: f64 },
}

impl Eq for DiscreteDistribution {}

impl Hash for DiscreteDistribution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            DiscreteDistribution::Degenerate { value } => {
                0u8.hash(state);
                value.hash(state);
            }
            DiscreteDistribution::Poisson { rate, shift } => {
                1u8.hash(state);
                rate.to_bits().hash(state);
                shift.hash(state);
            }
            DiscreteDistribution::Geometric { p } => {
                2u8.hash(state);
                p.to_bits().hash(state);
            }
        }
    }
}

impl fmt::Display for DiscreteDistribution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiscreteDistribution::Degenerate { value } => write!(f, "degenerate({})", value),
            DiscreteDistribution::Poisson { rate, shift } => {
                write!(f, "poisson(rate={:.prec$},shift={})", rate, shift, prec = REAL_PRECISION_DIGITS as usize)
            }
            DiscreteDistribution::Geometric { p } => write!(f, "geometric(p={:.5})", p),
        }
    }
}

impl DiscreteDistribution {
    pub fn pmf(&self, x: i64) -> f64 {
        match self {
            DiscreteDistribution::Degenerate { value } => {
                if x == *value { 1.0 } else { 0.0 }
            }
            DiscreteDistribution::Poisson { rate, shift } => {
                if x < *shift {
                    return 0.0;
                }
                let k = (x - shift) as u64;
                if *rate == 0.0 {
                    return if k == 0 { 1.0 } else { 0.0 };
                }
                // log-space to survive large k before the final exp
                let mut log_pmf = k as f64 * rate.ln() - rate;
                for i in 2..=k {
                    log_pmf -= (i as f64).ln();
                }
                log_pmf.exp()
            }
            DiscreteDistribution::Geometric { p } => {
                if x < 1 {
                    return 0.0;
                }
                if *p >= 1.0 {
                    return if x == 1 { 1.0 } else { 0.0 };
                }
                p * (1.0 - p).powf((x - 1) as f64)
            }
        }
    }

    pub fn cdf(&self, x: i64) -> f64 {
        match self {
            DiscreteDistribution::Degenerate { value } => {
                if x >= *value { 1.0 } else { 0.0 }
            }
            DiscreteDistribution::Poisson { shift, .. } => {
                if x < *shift {
                    return 0.0;
                }
                let mut total = 0.0;
                for v in *shift..=x {
                    total += self.pmf(v);
                }
                total.min(1.0)
            }
            DiscreteDistribution::Geometric { p } => {
                if x < 1 {
                    return 0.0;
                }
                1.0 - (1.0 - p).powf(x as f64)
            }
        }
    }

    pub fn mean(&self) -> f64 {
        match self {
            DiscreteDistribution::Degenerate { value } => *value as f64,
            DiscreteDistribution::Poisson { rate, shift } => rate + *shift as f64,
            DiscreteDistribution::Geometric { p } => 1.0 / p,
        }
    }

    pub fn mode(&self) -> i64 {
        match self {
            DiscreteDistribution::Degenerate { value } => *value,
            DiscreteDistribution::Poisson { rate, shift } => rate.floor() as i64 + shift,
            DiscreteDistribution::Geometric { .. } => 1,
        }
    }

    pub fn variance(&self) -> f64 {
        match self {
            DiscreteDistribution::Degenerate { .. } => 0.0,
            DiscreteDistribution::Poisson { rate, .. } => *rate,
            DiscreteDistribution::Geometric { p } => (1.0 - p) / (p * p),
        }
    }

    pub fn is_deterministic(&self) -> bool {
        self.pmf(self.mode()) >= 1.0
    }

    pub fn sample(&self, rng: &mut StdRng) -> i64 {
        match self {
            DiscreteDistribution::Degenerate { value } => *value,
            DiscreteDistribution::Poisson { rate, shift } => {
                match rand_distr::Poisson::new(*rate) {
                    Ok(poisson) => {
                        let draw: f64 = poisson.sample(rng);
                        draw as i64 + shift
                    }
                    // rate 0 has all mass on the shift
                    Err(_) => *shift,
                }
            }
            DiscreteDistribution::Geometric { p } => {
                match rand_distr::Geometric::new(*p) {
                    Ok(geometric) => geometric.sample(rng) as i64 + 1,
                    Err(_) => 1,
                }
            }
        }
    }

    /// Model cost in bits, excluding any data cost.
    pub fn mdl_of_model(&self) -> f64 {
        match self {
            DiscreteDistribution::Degenerate { value } => real_code_length(*value as f64),
            DiscreteDistribution::Poisson { rate, .. } => real_code_length(*rate),
            DiscreteDistribution::Geometric { .. } => GEOMETRIC_PRECISION_DIGITS * 10f64.log2(),
        }
    }

    pub fn fit_degenerate(values: &[i64]) -> Result<Self, FitError> {
        let mean = mean_of(values)?;
        Ok(DiscreteDistribution::Degenerate { value: mean.round() as i64 })
    }

    pub fn fit_poisson(values: &[i64]) -> Result<Self, FitError> {
        let mean = mean_of(values)?;
        let shift = *values.iter().min().ok_or(FitError::NoData)?;
        let rate = mean - shift as f64;
        if rate < 0.0 || !rate.is_finite() {
            return Err(FitError::InvalidParameters { distribution: "poisson" });
        }
        Ok(DiscreteDistribution::Poisson { rate, shift })
    }

    pub fn fit_geometric(values: &[i64]) -> Result<Self, FitError> {
        let mean = mean_of(values)?;
        if mean <= 0.0 {
            return Err(FitError::InvalidParameters { distribution: "geometric" });
        }
        let p = (1.0 / mean).min(1.0);
        Ok(DiscreteDistribution::Geometric { p })
    }

    /// Picks the family whose moments can express the pair: zero
    /// variance is a point mass, a variance near `m^2 - m` is
    /// geometric, anything else becomes a shifted Poisson.
    pub fn fit_by_mean_and_variance(mean: f64, variance: f64) -> Result<Self, FitError> {
        if !mean.is_finite() || !variance.is_finite() || variance < 0.0 {
            return Err(FitError::InvalidParameters { distribution: "moments" });
        }
        if variance == 0.0 {
            return Ok(DiscreteDistribution::Degenerate { value: mean.round() as i64 });
        }
        let geometric_variance = mean * mean - mean;
        if mean >= 1.0 && (geometric_variance - variance).abs() <= 0.5 {
            return Ok(DiscreteDistribution::Geometric { p: (1.0 / mean).min(1.0) });
        }
        let shift = (mean - variance).round() as i64;
        Ok(DiscreteDistribution::Poisson { rate: variance, shift })
    }
}

fn mean_of(values: &[i64]) -> Result<f64, FitError> {
    if values.is_empty() {
        return Err(FitError::NoData);
    }
    Ok(values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
pub mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{DiscreteDistribution, FitError};

    fn hash_of(d: &DiscreteDistribution) -> u64 {
        let mut hasher = DefaultHasher::new();
        d.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    pub fn test_degenerate() {
        let d = DiscreteDistribution::Degenerate { value: 5 };

        assert_eq!(d.pmf(5), 1.0);
        assert_eq!(d.pmf(4), 0.0);
        assert_eq!(d.cdf(4), 0.0);
        assert_eq!(d.cdf(5), 1.0);
        assert_eq!(d.mean(), 5.0);
        assert_eq!(d.mode(), 5);
        assert_eq!(d.variance(), 0.0);
        assert!(d.is_deterministic());

        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(d.sample(&mut rng), 5);
    }

    #[test]
    pub fn test_degenerate_fit_round_trip() {
        let d = DiscreteDistribution::fit_degenerate(&[5, 5, 5, 5]).unwrap();
        assert_eq!(d, DiscreteDistribution::Degenerate { value: 5 });

        let d = DiscreteDistribution::fit_degenerate(&[4, 6]).unwrap();
        assert_eq!(d, DiscreteDistribution::Degenerate { value: 5 });

        assert_eq!(DiscreteDistribution::fit_degenerate(&[]), Err(FitError::NoData));
    }

    #[test]
    pub fn test_poisson() {
        let d = DiscreteDistribution::fit_poisson(&[10, 11, 12, 13, 14]).unwrap();

        assert_eq!(d, DiscreteDistribution::Poisson { rate: 2.0, shift: 10 });
        assert_eq!(d.mean(), 12.0);
        assert_eq!(d.mode(), 12);
        assert_eq!(d.variance(), 2.0);
        assert!(!d.is_deterministic());
        assert_eq!(d.pmf(9), 0.0);

        // pmf(k=2 | rate=2) = 4 e^-2 / 2
        let expected = 4.0 * (-2.0f64).exp() / 2.0;
        assert!((d.pmf(12) - expected).abs() < 1e-12);

        let mut total = 0.0;
        for x in 10..60 {
            total += d.pmf(x);
        }
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    pub fn test_poisson_with_zero_rate_is_deterministic() {
        let d = DiscreteDistribution::fit_poisson(&[7, 7, 7]).unwrap();
        assert_eq!(d, DiscreteDistribution::Poisson { rate: 0.0, shift: 7 });
        assert!(d.is_deterministic());
        assert_eq!(d.pmf(7), 1.0);

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(d.sample(&mut rng), 7);
    }

    #[test]
    pub fn test_geometric() {
        let d = DiscreteDistribution::fit_geometric(&[4, 4, 4, 4]).unwrap();

        assert_eq!(d, DiscreteDistribution::Geometric { p: 0.25 });
        assert_eq!(d.mean(), 4.0);
        assert_eq!(d.mode(), 1);
        assert_eq!(d.pmf(0), 0.0);
        assert_eq!(d.pmf(1), 0.25);
        assert!((d.pmf(2) - 0.1875).abs() < 1e-12);
        assert!((d.cdf(2) - 0.4375).abs() < 1e-12);

        assert!(DiscreteDistribution::fit_geometric(&[0, 0]).is_err());
    }

    #[test]
    pub fn test_clones_stay_equal_and_hash_alike() {
        for d in [
            DiscreteDistribution::Degenerate { value: 5 },
            DiscreteDistribution::Poisson { rate: 2.5, shift: 3 },
            DiscreteDistribution::Geometric { p: 0.25 },
        ] {
            let clone = d.clone();
            assert_eq!(d, clone);
            assert_eq!(hash_of(&d), hash_of(&clone));
        }
    }

    #[test]
    pub fn test_fit_by_mean_and_variance_picks_the_matching_family() {
        assert_eq!(
            DiscreteDistribution::fit_by_mean_and_variance(5.0, 0.0).unwrap(),
            DiscreteDistribution::Degenerate { value: 5 },
        );
        // geometric with p = 0.25 has mean 4 and variance 12
        assert_eq!(
            DiscreteDistribution::fit_by_mean_and_variance(4.0, 12.0).unwrap(),
            DiscreteDistribution::Geometric { p: 0.25 },
        );
        assert_eq!(
            DiscreteDistribution::fit_by_mean_and_variance(12.0, 2.0).unwrap(),
            DiscreteDistribution::Poisson { rate: 2.0, shift: 10 },
        );
        assert!(DiscreteDistribution::fit_by_mean_and_variance(f64::NAN, 1.0).is_err());
        assert!(DiscreteDistribution::fit_by_mean_and_variance(4.0, -1.0).is_err());
    }

    #[test]
    pub fn test_geometric_survives_huge_values() {
        let d = DiscreteDistribution::Geometric { p: 0.25 };

        let p = d.pmf(i64::MAX);
        assert!(p >= 0.0 && p < 1e-12);
        assert!((d.cdf(i64::MAX) - 1.0).abs() < 1e-12);
    }

    #[test]
    pub fn test_sampling_is_deterministic_under_a_fixed_seed() {
        let d = DiscreteDistribution::Poisson { rate: 3.5, shift: 1 };

        let mut rng_a = StdRng::seed_from_u64(17);
        let mut rng_b = StdRng::seed_from_u64(17);
        let a: Vec<i64> = (0..10).map(|_| d.sample(&mut rng_a)).collect();
        let b: Vec<i64> = (0..10).map(|_| d.sample(&mut rng_b)).collect();

        assert_eq!(a, b);
        assert!(a.iter().all(|v| *v >= 1));
    }

    #[test]
    pub fn test_model_cost_is_finite() {
        for d in [
            DiscreteDistribution::Degenerate { value: 12 },
            DiscreteDistribution::Poisson { rate: 2.5, shift: 0 },
            DiscreteDistribution::Geometric { p: 0.5 },
        ].iter() {
            assert!(d.mdl_of_model().is_finite());
            assert!(d.mdl_of_model() > 0.0);
        }
    }
}
