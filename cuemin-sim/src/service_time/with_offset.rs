use cuemin_core::job::Job;
use cuemin_core::mdl::real_code_length;
use cuemin_core::time::*;

use super::ServiceTime;

/// Shifts another service time by a constant offset.
pub struct ServiceTimeWithOffset {
    offset: Duration,
    inner: Box<dyn ServiceTime>,
}

impl ServiceTimeWithOffset {
    pub fn new(offset: Duration, inner: Box<dyn ServiceTime>) -> Self {
        ServiceTimeWithOffset { offset, inner }
    }
}

impl ServiceTime for ServiceTimeWithOffset {
    fn describe(&self) -> String {
        format!("{}+{}", self.inner.describe(), self.offset)
    }

    fn sample(&mut self, now: Time, job: &Job, nr_of_jobs_in_system: usize) -> Duration {
        self.inner.sample(now, job, nr_of_jobs_in_system) + self.offset
    }

    fn sample_batch(&mut self, now: Time, batch: &[Job], nr_of_jobs_in_system: usize) -> Duration {
        self.inner.sample_batch(now, batch, nr_of_jobs_in_system) + self.offset
    }

    fn expected(&self) -> f64 {
        self.inner.expected() + self.offset as f64
    }

    fn most_likely(&self) -> (Duration, f64) {
        let (value, p) = self.inner.most_likely();
        (value + self.offset, p)
    }

    fn probability(&self, duration: Duration, job: &Job, nr_of_jobs_in_system: usize) -> f64 {
        self.inner.probability(duration - self.offset, job, nr_of_jobs_in_system)
    }

    fn max_probability(&self, duration: Duration) -> f64 {
        self.inner.max_probability(duration - self.offset)
    }

    fn is_deterministic(&self) -> bool {
        self.inner.is_deterministic()
    }

    fn mdl_of_model(&self) -> f64 {
        real_code_length(self.offset as f64) + self.inner.mdl_of_model()
    }

    fn min_code_length_for_one_job(&self) -> f64 {
        self.inner.min_code_length_for_one_job()
    }

    fn copy(&self) -> Box<dyn ServiceTime> {
        Box::new(ServiceTimeWithOffset::new(self.offset, self.inner.copy()))
    }

    fn copy_mean(&self) -> Box<dyn ServiceTime> {
        Box::new(ServiceTimeWithOffset::new(self.offset, self.inner.copy_mean()))
    }

    fn set_seed(&mut self, seed: u64) {
        self.inner.set_seed(seed);
    }
}
