use std::collections::HashMap;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use cuemin_core::job::Job;
use cuemin_core::time::*;

use super::priority::PriorityHeap;
use super::{exit_time_as_f64, SortKey, WaitingArea};

/// Service in random order: every waiting job is equally likely next.
#[derive(Debug, Clone)]
pub struct SiroWaitingArea {
    heap: PriorityHeap,
    rng: StdRng,
    seed: u64,
}

impl SiroWaitingArea {
    pub fn new(seed: u64) -> Self {
        SiroWaitingArea {
            heap: PriorityHeap::new(),
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }
}

impl WaitingArea for SiroWaitingArea {
    fn discipline_name(&self) -> String {
        "SIRO".to_string()
    }

    fn add_job(&mut self, job: Job, _arrival_time: Time) {
        let priority: f64 = self.rng.gen();
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
        Box::new(SiroWaitingArea::new(self.seed))
    }

    fn best_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![self.rng.gen(), exit_time_as_f64(job, exit_time_per_job)]
    }

    fn worst_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![self.rng.gen(), -exit_time_as_f64(job, exit_time_per_job)]
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn pop_all(area: &mut SiroWaitingArea) -> Vec<Job> {
        let mut order = vec![];
        while let Some(job) = area.pop_next_job(area.len()) {
            order.push(job);
        }
        order
    }

    #[test]
    pub fn test_same_seed_gives_the_same_order() {
        let mut a = SiroWaitingArea::new(7);
        let mut b = SiroWaitingArea::new(7);
        for i in 0..10 {
            a.add_job(Job(i), i as i64);
            b.add_job(Job(i), i as i64);
        }

        assert_eq!(pop_all(&mut a), pop_all(&mut b));
    }

    #[test]
    pub fn test_copy_empty_rewinds_the_generator() {
        let mut a = SiroWaitingArea::new(3);
        for i in 0..5 {
            a.add_job(Job(i), 0);
        }
        let first = pop_all(&mut a);

        let mut fresh = a.copy_empty();
        for i in 0..5 {
            fresh.add_job(Job(i), 0);
        }
        let mut again = vec![];
        while let Some(job) = fresh.pop_next_job(0) {
            again.push(job);
        }

        assert_eq!(first, again);
    }
}
