use std::collections::{HashMap, VecDeque};

use cuemin_core::job::Job;
use cuemin_core::time::*;

use super::{exit_time_as_f64, SortKey, WaitingArea};

/// Switches between FIFO and LIFO depending on the system load.
/// Low load means strictly fewer jobs in the system than the threshold.
#[derive(Debug, Clone)]
pub struct FlifoWaitingArea {
    queue: VecDeque<Job>,
    load_threshold: usize,
    fifo_on_low_load: bool,
}

impl FlifoWaitingArea {
    pub fn new(load_threshold: usize, fifo_on_low_load: bool) -> Self {
        FlifoWaitingArea {
            queue: VecDeque::new(),
            load_threshold,
            fifo_on_low_load,
        }
    }

    pub fn load_threshold(&self) -> usize {
        self.load_threshold
    }

    pub fn fifo_on_low_load(&self) -> bool {
        self.fifo_on_low_load
    }

    fn pops_from_front(&self, nr_of_jobs_in_system: usize) -> bool {
        let low_load = nr_of_jobs_in_system < self.load_threshold;
        low_load == self.fifo_on_low_load
    }
}

impl WaitingArea for FlifoWaitingArea {
    fn discipline_name(&self) -> String {
        if self.fifo_on_low_load {
            format!("FLIFO({},FIFO->LIFO)", self.load_threshold)
        } else {
            format!("FLIFO({},LIFO->FIFO)", self.load_threshold)
        }
    }

    fn add_job(&mut self, job: Job, _arrival_time: Time) {
        self.queue.push_back(job);
    }

    fn pop_next_job(&mut self, nr_of_jobs_in_system: usize) -> Option<Job> {
        if self.pops_from_front(nr_of_jobs_in_system) {
            self.queue.pop_front()
        } else {
            self.queue.pop_back()
        }
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
        Box::new(FlifoWaitingArea::new(self.load_threshold, self.fifo_on_low_load))
    }

    fn mdl_of_model(&self, _nr_of_categorical_attributes: usize) -> f64 {
        // threshold plus the direction bit
        cuemin_core::mdl::universal_integer_code_length(self.load_threshold.max(1) as u64) + 1.0
    }

    fn best_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        // an empty system is below any threshold
        if self.fifo_on_low_load {
            vec![exit_time_as_f64(job, exit_time_per_job)]
        } else {
            vec![-exit_time_as_f64(job, exit_time_per_job)]
        }
    }

    fn worst_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        if self.fifo_on_low_load {
            vec![-exit_time_as_f64(job, exit_time_per_job)]
        } else {
            vec![exit_time_as_f64(job, exit_time_per_job)]
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_switches_direction_on_load() {
        let mut area = FlifoWaitingArea::new(3, true);
        area.add_job(Job(0), 1);
        area.add_job(Job(1), 2);
        area.add_job(Job(2), 3);

        // below the threshold: FIFO
        assert_eq!(area.pop_next_job(2), Some(Job(0)));
        // at or above the threshold: LIFO
        area.add_job(Job(3), 4);
        assert_eq!(area.pop_next_job(3), Some(Job(3)));

        assert_eq!(area.discipline_name(), "FLIFO(3,FIFO->LIFO)");
        assert_eq!(FlifoWaitingArea::new(3, false).discipline_name(), "FLIFO(3,LIFO->FIFO)");
    }
}
