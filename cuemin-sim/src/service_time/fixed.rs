use cuemin_core::job::Job;
use cuemin_core::mdl::real_code_length;
use cuemin_core::time::*;

use super::ServiceTime;

/// Every job takes exactly `value` timesteps.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedServiceTime {
    value: Duration,
}

impl FixedServiceTime {
    pub fn new(value: Duration) -> Self {
        FixedServiceTime { value }
    }
}

impl ServiceTime for FixedServiceTime {
    fn describe(&self) -> String {
        format!("fixed({})", self.value)
    }

    fn sample(&mut self, _now: Time, _job: &Job, _nr_of_jobs_in_system: usize) -> Duration {
        self.value
    }

    fn expected(&self) -> f64 {
        self.value as f64
    }

    fn most_likely(&self) -> (Duration, f64) {
        (self.value, 1.0)
    }

    fn probability(&self, duration: Duration, _job: &Job, _nr_of_jobs_in_system: usize) -> f64 {
        if duration == self.value { 1.0 } else { 0.0 }
    }

    fn max_probability(&self, duration: Duration) -> f64 {
        if duration == self.value { 1.0 } else { 0.0 }
    }

    fn is_deterministic(&self) -> bool {
        true
    }

    fn mdl_of_model(&self) -> f64 {
        real_code_length(self.value as f64)
    }

    fn min_code_length_for_one_job(&self) -> f64 {
        0.0
    }

    fn copy(&self) -> Box<dyn ServiceTime> {
        Box::new(self.clone())
    }

    fn copy_mean(&self) -> Box<dyn ServiceTime> {
        Box::new(self.clone())
    }
}
