use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use cuemin_core::distribution::DiscreteDistribution;
use cuemin_core::job::Job;
use cuemin_core::mdl::ALMOST_ZERO;
use cuemin_core::time::*;

use crate::regressor::JobRegressor;

use super::ServiceTime;

/// Per-job prediction from a fitted regressor plus an additive error
/// distribution. The regressor itself is trained outside this crate.
pub struct ServiceTimeWithRegressor {
    regressor: Rc<dyn JobRegressor>,
    error_distribution: DiscreteDistribution,
    rng: StdRng,
    seed: u64,
}

impl ServiceTimeWithRegressor {
    pub fn new(regressor: Rc<dyn JobRegressor>, error_distribution: DiscreteDistribution, seed: u64) -> Self {
        ServiceTimeWithRegressor {
            regressor,
            error_distribution,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }
}

impl ServiceTime for ServiceTimeWithRegressor {
    fn describe(&self) -> String {
        format!("regressor({},err={})", self.regressor.describe(), self.error_distribution)
    }

    fn sample(&mut self, _now: Time, job: &Job, _nr_of_jobs_in_system: usize) -> Duration {
        let predicted = self.regressor.predict(job).round() as i64;
        (predicted + self.error_distribution.sample(&mut self.rng)).max(0)
    }

    fn expected(&self) -> f64 {
        self.error_distribution.mean()
    }

    fn most_likely(&self) -> (Duration, f64) {
        let mode = self.error_distribution.mode();
        (mode, self.error_distribution.pmf(mode))
    }

    fn probability(&self, duration: Duration, job: &Job, _nr_of_jobs_in_system: usize) -> f64 {
        let predicted = self.regressor.predict(job).round() as i64;
        self.error_distribution.pmf(duration - predicted)
    }

    fn max_probability(&self, _duration: Duration) -> f64 {
        // some job may predict exactly duration minus the error mode
        self.error_distribution.pmf(self.error_distribution.mode())
    }

    fn is_deterministic(&self) -> bool {
        self.error_distribution.is_deterministic()
    }

    fn mdl_of_model(&self) -> f64 {
        self.regressor.mdl_of_model() + self.error_distribution.mdl_of_model()
    }

    fn min_code_length_for_one_job(&self) -> f64 {
        let p = self.error_distribution.pmf(self.error_distribution.mode());
        -p.max(ALMOST_ZERO).log2()
    }

    fn copy(&self) -> Box<dyn ServiceTime> {
        Box::new(ServiceTimeWithRegressor::new(
            Rc::clone(&self.regressor),
            self.error_distribution.clone(),
            self.seed,
        ))
    }

    fn copy_mean(&self) -> Box<dyn ServiceTime> {
        let value = self.error_distribution.mean().round() as i64;
        Box::new(ServiceTimeWithRegressor::new(
            Rc::clone(&self.regressor),
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
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::regressor::LinearJobRegressor;

    #[test]
    pub fn test_prediction_plus_error() {
        let mut feature_per_job = HashMap::new();
        feature_per_job.insert(Job(0), vec![4.0]);
        let regressor = LinearJobRegressor::new(feature_per_job, vec![1.0], 0.0);

        let mut st = ServiceTimeWithRegressor::new(
            Rc::new(regressor),
            DiscreteDistribution::Degenerate { value: 2 },
            0,
        );

        assert_eq!(st.sample(0, &Job(0), 1), 6);
        assert_eq!(st.probability(6, &Job(0), 1), 1.0);
        assert_eq!(st.probability(5, &Job(0), 1), 0.0);
        assert_eq!(st.max_probability(99), 1.0);
    }
}
