use std::collections::HashMap;
use std::rc::Rc;

use cuemin_core::job::Job;
use cuemin_core::time::*;

use crate::regressor::JobRegressor;

use super::priority::PriorityHeap;
use super::{exit_time_as_f64, SortKey, WaitingArea};

/// Serves the job with the lowest regressed score first.
#[derive(Clone)]
pub struct RegressorWaitingArea {
    heap: PriorityHeap,
    regressor: Rc<dyn JobRegressor>,
}

impl RegressorWaitingArea {
    pub fn new(regressor: Rc<dyn JobRegressor>) -> Self {
        RegressorWaitingArea {
            heap: PriorityHeap::new(),
            regressor,
        }
    }
}

impl WaitingArea for RegressorWaitingArea {
    fn discipline_name(&self) -> String {
        format!("LR({})", self.regressor.describe())
    }

    fn add_job(&mut self, job: Job, arrival_time: Time) {
        let priority = self.regressor.predict_at(&job, arrival_time);
        self.heap.push(priority, job);
    }

    fn pop_next_job(&mut self, _nr_of_jobs_in_system: usize) -> Option<Job> {
        self.heap.pop()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn waiting_jobs(&self) -> Vec<Job> {
        self.heap.jobs()
    }

    fn copy(&self) -> Box<dyn WaitingArea> {
        Box::new(self.clone())
    }

    fn copy_empty(&self) -> Box<dyn WaitingArea> {
        Box::new(RegressorWaitingArea::new(Rc::clone(&self.regressor)))
    }

    fn mdl_of_model(&self, _nr_of_categorical_attributes: usize) -> f64 {
        self.regressor.mdl_of_model()
    }

    fn best_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![self.regressor.predict(job), exit_time_as_f64(job, exit_time_per_job)]
    }

    fn worst_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![self.regressor.predict(job), -exit_time_as_f64(job, exit_time_per_job)]
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::regressor::LinearJobRegressor;

    #[test]
    pub fn test_lowest_score_is_served_first() {
        let mut feature_per_job = HashMap::new();
        feature_per_job.insert(Job(0), vec![5.0]);
        feature_per_job.insert(Job(1), vec![1.0]);
        feature_per_job.insert(Job(2), vec![3.0]);
        let regressor = LinearJobRegressor::new(feature_per_job, vec![1.0], 0.0);

        let mut area = RegressorWaitingArea::new(Rc::new(regressor));
        area.add_job(Job(0), 0);
        area.add_job(Job(1), 0);
        area.add_job(Job(2), 0);

        assert_eq!(area.pop_next_job(3), Some(Job(1)));
        assert_eq!(area.pop_next_job(2), Some(Job(2)));
        assert_eq!(area.pop_next_job(1), Some(Job(0)));
    }
}
