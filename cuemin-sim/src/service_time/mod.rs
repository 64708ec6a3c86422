use cuemin_core::job::Job;
use cuemin_core::time::*;

mod fixed;
mod with_distribution;
mod load_dependent;
mod with_offset;
mod with_regressor;
mod oracle;

pub use fixed::FixedServiceTime;
pub use with_distribution::ServiceTimeWithDistribution;
pub use load_dependent::LoadDependentServiceTime;
pub use with_offset::ServiceTimeWithOffset;
pub use with_regressor::ServiceTimeWithRegressor;
pub use oracle::{OracleServiceTime, OracleCountNegativeServiceTime};

#[derive(Debug)]
pub enum ServiceTimeError {
    TooFewSubmodels { count: usize },
    InvalidThresholds { thresholds: Vec<usize> },
}

/// How long a server is busy with a job or batch. The current instant
/// is passed in so oracle variants need no handle on the environment.
pub trait ServiceTime {
    fn describe(&self) -> String;

    fn sample(&mut self, now: Time, job: &Job, nr_of_jobs_in_system: usize) -> Duration;

    /// One duration for the whole batch.
    fn sample_batch(&mut self, now: Time, batch: &[Job], nr_of_jobs_in_system: usize) -> Duration {
        match batch.first() {
            Some(job) => self.sample(now, job, nr_of_jobs_in_system),
            None => 0,
        }
    }

    fn expected(&self) -> f64;

    /// The most probable duration and its probability.
    fn most_likely(&self) -> (Duration, f64);

    fn probability(&self, duration: Duration, job: &Job, nr_of_jobs_in_system: usize) -> f64;

    /// Upper bound on `probability` over all jobs and loads. Must never
    /// underestimate, or pruning stops being admissible.
    fn max_probability(&self, duration: Duration) -> f64;

    fn is_deterministic(&self) -> bool;

    fn mdl_of_model(&self) -> f64;

    /// Fewest bits any single job can cost under this model.
    fn min_code_length_for_one_job(&self) -> f64;

    fn copy(&self) -> Box<dyn ServiceTime>;

    /// A deterministic stand-in with the same mean.
    fn copy_mean(&self) -> Box<dyn ServiceTime>;

    fn set_seed(&mut self, _seed: u64) {}
}
