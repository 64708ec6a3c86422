use std::collections::HashMap;

use cuemin_core::job::Job;
use cuemin_core::mdl::real_code_length;
use cuemin_core::time::*;

/// Scores a job from its features. Training happens outside this crate;
/// a fitted model is plugged in as data.
pub trait JobRegressor {
    fn predict(&self, job: &Job) -> f64;

    /// Prediction with the arrival instant as an extra feature.
    fn predict_at(&self, job: &Job, _arrival_time: Time) -> f64 {
        self.predict(job)
    }

    fn mdl_of_model(&self) -> f64;

    fn describe(&self) -> String;
}

/// Decides pairwise serve order between two waiting jobs. Training is
/// external, like for regressors.
pub trait PairwiseClassifier {
    /// True if `a` should be served before `b`, given how much later
    /// `a` arrived.
    fn should_serve_before(&self, a: &Job, b: &Job, arrival_time_difference: Duration) -> bool;

    fn describe(&self) -> String;
}

/// Linear model over per-job numeric features, with an optional weight
/// on the arrival instant.
#[derive(Debug, Clone)]
pub struct LinearJobRegressor {
    pub feature_per_job: HashMap<Job, Vec<f64>>,
    pub weights: Vec<f64>,
    pub arrival_time_weight: f64,
    pub intercept: f64,
}

impl LinearJobRegressor {
    pub fn new(feature_per_job: HashMap<Job, Vec<f64>>, weights: Vec<f64>, intercept: f64) -> Self {
        LinearJobRegressor {
            feature_per_job,
            weights,
            arrival_time_weight: 0.0,
            intercept,
        }
    }
}

impl JobRegressor for LinearJobRegressor {
    fn predict(&self, job: &Job) -> f64 {
        let mut prediction = self.intercept;
        if let Some(features) = self.feature_per_job.get(job) {
            for (weight, feature) in self.weights.iter().zip(features.iter()) {
                prediction += weight * feature;
            }
        }
        prediction
    }

    fn predict_at(&self, job: &Job, arrival_time: Time) -> f64 {
        self.predict(job) + self.arrival_time_weight * arrival_time as f64
    }

    fn mdl_of_model(&self) -> f64 {
        let mut bits = real_code_length(self.intercept) + real_code_length(self.arrival_time_weight);
        for weight in self.weights.iter() {
            bits += real_code_length(*weight);
        }
        bits
    }

    fn describe(&self) -> String {
        format!("linear({} weights)", self.weights.len())
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::HashMap;

    use super::{JobRegressor, LinearJobRegressor};
    use cuemin_core::job::Job;

    #[test]
    pub fn test_linear_prediction() {
        let mut feature_per_job = HashMap::new();
        feature_per_job.insert(Job(0), vec![2.0, 1.0]);

        let mut regressor = LinearJobRegressor::new(feature_per_job, vec![3.0, -1.0], 0.5);
        regressor.arrival_time_weight = 0.25;

        assert_eq!(regressor.predict(&Job(0)), 5.5);
        assert_eq!(regressor.predict_at(&Job(0), 4), 6.5);
        // unknown job falls back to the intercept
        assert_eq!(regressor.predict(&Job(9)), 0.5);
        assert!(regressor.mdl_of_model() > 0.0);
    }
}
