use cuemin_core::job::Job;
use cuemin_core::mdl::universal_integer_code_length;
use cuemin_core::time::*;

use super::{ServiceTime, ServiceTimeError};

/// Different service regimes depending on the system load at service
/// start. Submodel `i` covers loads up to `thresholds[i]`, the last
/// submodel covers everything above the last threshold.
pub struct LoadDependentServiceTime {
    thresholds: Vec<usize>,
    submodels: Vec<Box<dyn ServiceTime>>,
}

impl LoadDependentServiceTime {
    pub fn new(thresholds: Vec<usize>, submodels: Vec<Box<dyn ServiceTime>>) -> Result<Self, ServiceTimeError> {
        if submodels.len() < 2 {
            return Err(ServiceTimeError::TooFewSubmodels { count: submodels.len() });
        }
        let strictly_increasing = thresholds.windows(2).all(|w| w[0] < w[1]);
        if thresholds.len() != submodels.len() - 1
            || thresholds.first().map_or(true, |t| *t == 0)
            || !strictly_increasing
        {
            return Err(ServiceTimeError::InvalidThresholds { thresholds });
        }

        Ok(LoadDependentServiceTime { thresholds, submodels })
    }

    fn submodel_index(&self, nr_of_jobs_in_system: usize) -> usize {
        self.thresholds
            .iter()
            .position(|t| nr_of_jobs_in_system <= *t)
            .unwrap_or(self.submodels.len() - 1)
    }

    pub fn submodels(&self) -> &[Box<dyn ServiceTime>] {
        &self.submodels
    }
}

impl ServiceTime for LoadDependentServiceTime {
    fn describe(&self) -> String {
        let mut segments = Vec::with_capacity(self.submodels.len());
        for (threshold, submodel) in self.thresholds.iter().zip(self.submodels.iter()) {
            segments.push(format!("<={}:{}", threshold, submodel.describe()));
        }
        segments.push(format!(
            ">{}:{}",
            self.thresholds.last().copied().unwrap_or(0),
            self.submodels[self.submodels.len() - 1].describe()
        ));
        format!("load_dependent({})", segments.join(","))
    }

    fn sample(&mut self, now: Time, job: &Job, nr_of_jobs_in_system: usize) -> Duration {
        let index = self.submodel_index(nr_of_jobs_in_system);
        self.submodels[index].sample(now, job, nr_of_jobs_in_system)
    }

    fn expected(&self) -> f64 {
        let total: f64 = self.submodels.iter().map(|s| s.expected()).sum();
        total / self.submodels.len() as f64
    }

    fn most_likely(&self) -> (Duration, f64) {
        self.submodels
            .iter()
            .map(|s| s.most_likely())
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, 0.0))
    }

    fn probability(&self, duration: Duration, job: &Job, nr_of_jobs_in_system: usize) -> f64 {
        let index = self.submodel_index(nr_of_jobs_in_system);
        self.submodels[index].probability(duration, job, nr_of_jobs_in_system)
    }

    fn max_probability(&self, duration: Duration) -> f64 {
        self.submodels
            .iter()
            .map(|s| s.max_probability(duration))
            .fold(0.0, f64::max)
    }

    fn is_deterministic(&self) -> bool {
        self.submodels.iter().all(|s| s.is_deterministic())
    }

    fn mdl_of_model(&self) -> f64 {
        let mut bits = universal_integer_code_length(self.submodels.len() as u64);
        for threshold in self.thresholds.iter() {
            bits += universal_integer_code_length(*threshold as u64);
        }
        for submodel in self.submodels.iter() {
            bits += submodel.mdl_of_model();
        }
        bits
    }

    fn min_code_length_for_one_job(&self) -> f64 {
        self.submodels
            .iter()
            .map(|s| s.min_code_length_for_one_job())
            .fold(f64::INFINITY, f64::min)
    }

    fn copy(&self) -> Box<dyn ServiceTime> {
        Box::new(LoadDependentServiceTime {
            thresholds: self.thresholds.clone(),
            submodels: self.submodels.iter().map(|s| s.copy()).collect(),
        })
    }

    fn copy_mean(&self) -> Box<dyn ServiceTime> {
        Box::new(LoadDependentServiceTime {
            thresholds: self.thresholds.clone(),
            submodels: self.submodels.iter().map(|s| s.copy_mean()).collect(),
        })
    }

    fn set_seed(&mut self, seed: u64) {
        for submodel in self.submodels.iter_mut() {
            submodel.set_seed(seed);
        }
    }
}
