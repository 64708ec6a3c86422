use std::collections::HashMap;

use cuemin_core::job::Job;
use cuemin_core::time::*;

mod fcfs;
mod lcfs;
mod flifo;
mod priority;
mod siro;
mod regressor;
mod priority_class;
mod pairwise;

pub use fcfs::FcfsWaitingArea;
pub use lcfs::LcfsWaitingArea;
pub use flifo::FlifoWaitingArea;
pub use priority::{PriorityHeap, DepartureScheduledWaitingArea};
pub use siro::SiroWaitingArea;
pub use regressor::RegressorWaitingArea;
pub use priority_class::PriorityClassWaitingArea;
pub use pairwise::PairwiseClassifierWaitingArea;

/// Lexicographic tie-break key for jobs arriving at the same instant,
/// used by the server-count bound estimators.
pub type SortKey = Vec<f64>;

/// The buffer between arrival and service. Implementations define the
/// serve order; the queue only pops.
pub trait WaitingArea {
    fn discipline_name(&self) -> String;

    fn add_job(&mut self, job: Job, arrival_time: Time);

    fn has_next_job(&self) -> bool {
        !self.is_empty()
    }

    /// The system load is the number of jobs currently waiting or in
    /// service; load-sensitive disciplines branch on it.
    fn pop_next_job(&mut self, nr_of_jobs_in_system: usize) -> Option<Job>;

    /// All of the batch or nothing. Partial batches are never formed.
    fn pop_batch(&mut self, batch_size: usize, nr_of_jobs_in_system: usize) -> Option<Vec<Job>> {
        if self.len() < batch_size {
            return None;
        }
        let mut batch = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            batch.push(self.pop_next_job(nr_of_jobs_in_system)?);
        }
        Some(batch)
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the waiting jobs, in no particular order.
    fn waiting_jobs(&self) -> Vec<Job>;

    fn copy(&self) -> Box<dyn WaitingArea>;

    fn copy_empty(&self) -> Box<dyn WaitingArea>;

    /// Model cost of the discipline itself in bits.
    fn mdl_of_model(&self, _nr_of_categorical_attributes: usize) -> f64 {
        0.0
    }

    /// Orders same-instant arrivals so that the fewest servers are
    /// needed to explain the departures.
    fn best_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey;

    /// Orders same-instant arrivals so that the most servers are needed.
    fn worst_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey;
}

pub(crate) fn exit_time_as_f64(job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> f64 {
    exit_time_per_job.get(job).map(|t| *t as f64).unwrap_or(f64::INFINITY)
}
