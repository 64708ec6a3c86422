use std::collections::{HashMap, VecDeque};

use cuemin_core::job::Job;
use cuemin_core::time::*;

use super::{exit_time_as_f64, SortKey, WaitingArea};

/// First come, first served.
#[derive(Debug, Clone)]
pub struct FcfsWaitingArea {
    queue: VecDeque<Job>,
}

impl FcfsWaitingArea {
    pub fn new() -> Self {
        FcfsWaitingArea { queue: VecDeque::new() }
    }
}

impl WaitingArea for FcfsWaitingArea {
    fn discipline_name(&self) -> String {
        "FCFS".to_string()
    }

    fn add_job(&mut self, job: Job, _arrival_time: Time) {
        self.queue.push_back(job);
    }

    fn pop_next_job(&mut self, _nr_of_jobs_in_system: usize) -> Option<Job> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn waiting_jobs(&self) -> Vec<Job> {
        self.queue.iter().copied().collect()
    }

    fn copy(&self) -> Box<dyn WaitingArea> {
        Box::new(self.clone())
    }

    fn copy_empty(&self) -> Box<dyn WaitingArea> {
        Box::new(FcfsWaitingArea::new())
    }

    fn best_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![exit_time_as_f64(job, exit_time_per_job)]
    }

    fn worst_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![-exit_time_as_f64(job, exit_time_per_job)]
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_fifo_order() {
        let mut area = FcfsWaitingArea::new();
        area.add_job(Job(0), 1);
        area.add_job(Job(1), 2);
        area.add_job(Job(2), 3);

        assert!(area.has_next_job());
        assert_eq!(area.pop_next_job(3), Some(Job(0)));
        assert_eq!(area.pop_next_job(2), Some(Job(1)));
        assert_eq!(area.pop_next_job(1), Some(Job(2)));
        assert_eq!(area.pop_next_job(0), None);
    }

    #[test]
    pub fn test_pop_batch_is_all_or_nothing() {
        let mut area = FcfsWaitingArea::new();
        area.add_job(Job(0), 1);
        area.add_job(Job(1), 2);

        assert_eq!(area.pop_batch(3, 2), None);
        assert_eq!(area.len(), 2);
        assert_eq!(area.pop_batch(2, 2), Some(vec![Job(0), Job(1)]));
        assert_eq!(area.len(), 0);
    }
}
