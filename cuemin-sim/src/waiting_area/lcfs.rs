use std::collections::HashMap;

use cuemin_core::job::Job;
use cuemin_core::time::*;

use super::{exit_time_as_f64, SortKey, WaitingArea};

/// Last come, first served.
#[derive(Debug, Clone)]
pub struct LcfsWaitingArea {
    stack: Vec<Job>,
}

impl LcfsWaitingArea {
    pub fn new() -> Self {
        LcfsWaitingArea { stack: vec![] }
    }
}

impl WaitingArea for LcfsWaitingArea {
    fn discipline_name(&self) -> String {
        "LCFS".to_string()
    }

    fn add_job(&mut self, job: Job, _arrival_time: Time) {
        self.stack.push(job);
    }

    fn pop_next_job(&mut self, _nr_of_jobs_in_system: usize) -> Option<Job> {
        self.stack.pop()
    }

    fn len(&self) -> usize {
        self.stack.len()
    }

    fn waiting_jobs(&self) -> Vec<Job> {
        self.stack.clone()
    }

    fn copy(&self) -> Box<dyn WaitingArea> {
        Box::new(self.clone())
    }

    fn copy_empty(&self) -> Box<dyn WaitingArea> {
        Box::new(LcfsWaitingArea::new())
    }

    fn best_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![-exit_time_as_f64(job, exit_time_per_job)]
    }

    fn worst_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![exit_time_as_f64(job, exit_time_per_job)]
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_lifo_order() {
        let mut area = LcfsWaitingArea::new();
        area.add_job(Job(0), 1);
        area.add_job(Job(1), 2);
        area.add_job(Job(2), 3);

        assert_eq!(area.pop_next_job(3), Some(Job(2)));
        area.add_job(Job(3), 4);
        assert_eq!(area.pop_next_job(3), Some(Job(3)));
        assert_eq!(area.pop_next_job(2), Some(Job(1)));
        assert_eq!(area.pop_next_job(1), Some(Job(0)));
    }
}
