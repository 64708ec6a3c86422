use rand::SeedableRng;
use rand::rngs::StdRng;

use cuemin_core::distribution::DiscreteDistribution;
use cuemin_core::job::Job;
use cuemin_core::mdl::ALMOST_ZERO;
use cuemin_core::time::*;

use super::ServiceTime;

/// Service times drawn from a discrete distribution, floored at zero.
#[derive(Debug, Clone)]
pub struct ServiceTimeWithDistribution {
    distribution: DiscreteDistribution,
    rng: StdRng,
    seed: u64,
}

impl ServiceTimeWithDistribution {
    pub fn new(distribution: DiscreteDistribution, seed: u64) -> Self {
        ServiceTimeWithDistribution {
            distribution,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn distribution(&self) -> &DiscreteDistribution {
        &self.distribution
    }
}

impl ServiceTime for ServiceTimeWithDistribution {
    fn describe(&self) -> String {
        self.distribution.to_string()
    }

    fn sample(&mut self, _now: Time, _job: &Job, _nr_of_jobs_in_system: usize) -> Duration {
        self.distribution.sample(&mut self.rng).max(0)
    }

    fn expected(&self) -> f64 {
        self.distribution.mean()
    }

    fn most_likely(&self) -> (Duration, f64) {
        let mode = self.distribution.mode();
        (mode, self.distribution.pmf(mode))
    }

    fn probability(&self, duration: Duration, _job: &Job, _nr_of_jobs_in_system: usize) -> f64 {
        self.distribution.pmf(duration)
    }

    fn max_probability(&self, duration: Duration) -> f64 {
        self.distribution.pmf(duration)
    }

    fn is_deterministic(&self) -> bool {
        self.distribution.is_deterministic()
    }

    fn mdl_of_model(&self) -> f64 {
        self.distribution.mdl_of_model()
    }

    fn min_code_length_for_one_job(&self) -> f64 {
        let (_, p) = self.most_likely();
        -p.max(ALMOST_ZERO).log2()
    }

    fn copy(&self) -> Box<dyn ServiceTime> {
        Box::new(ServiceTimeWithDistribution::new(self.distribution.clone(), self.seed))
    }

    fn copy_mean(&self) -> Box<dyn ServiceTime> {
        let value = self.distribution.mean().round() as i64;
        Box::new(ServiceTimeWithDistribution::new(
            DiscreteDistribution::Degenerate { value },
            self.seed,
        ))
    }

    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_degenerate_distribution_service() {
        let mut st = ServiceTimeWithDistribution::new(DiscreteDistribution::Degenerate { value: 3 }, 0);

        assert_eq!(st.sample(0, &Job(0), 1), 3);
        assert_eq!(st.most_likely(), (3, 1.0));
        assert!(st.is_deterministic());
        assert_eq!(st.min_code_length_for_one_job(), 0.0);
    }

    #[test]
    pub fn test_negative_draws_are_floored_at_zero() {
        let mut st = ServiceTimeWithDistribution::new(DiscreteDistribution::Degenerate { value: -4 }, 0);
        assert_eq!(st.sample(0, &Job(0), 1), 0);
    }

    #[test]
    pub fn test_copy_mean_is_deterministic() {
        let st = ServiceTimeWithDistribution::new(DiscreteDistribution::Poisson { rate: 2.4, shift: 0 }, 0);
        let mean_copy = st.copy_mean();

        assert!(mean_copy.is_deterministic());
        assert_eq!(mean_copy.most_likely().0, 2);
    }

    #[test]
    pub fn test_min_code_length_matches_the_mode() {
        let st = ServiceTimeWithDistribution::new(DiscreteDistribution::Geometric { p: 0.5 }, 0);
        assert!((st.min_code_length_for_one_job() - 1.0).abs() < 1e-12);
    }
}
