use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

use cuemin_core::job::Job;
use cuemin_core::time::*;

use super::{SortKey, WaitingArea};

#[derive(Debug, Clone)]
struct HeapElement {
    priority: f64,
    seq: u64,
    job: Job,
}

impl PartialEq for HeapElement {
    fn eq(&self, other: &Self) -> bool {
        self.priority.to_bits() == other.priority.to_bits() && self.seq == other.seq
    }
}

impl Eq for HeapElement {}

impl Ord for HeapElement {
    fn cmp(&self, other: &Self) -> Ordering {
        // priorities are never NaN; ties fall back to insertion order
        // so that the pop order is deterministic
        self.priority
            .partial_cmp(&other.priority)
            .unwrap_or(Ordering::Equal)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for HeapElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of jobs keyed by a float priority, shared by all
/// priority-ordered disciplines.
#[derive(Debug, Clone)]
pub struct PriorityHeap {
    heap: BinaryHeap<Reverse<HeapElement>>,
    next_seq: u64,
}

impl PriorityHeap {
    pub fn new() -> Self {
        PriorityHeap { heap: BinaryHeap::new(), next_seq: 0 }
    }

    pub fn push(&mut self, priority: f64, job: Job) {
        self.heap.push(Reverse(HeapElement { priority, seq: self.next_seq, job }));
        self.next_seq += 1;
    }

    pub fn pop(&mut self) -> Option<Job> {
        self.heap.pop().map(|Reverse(e)| e.job)
    }

    pub fn peek(&self) -> Option<&Job> {
        self.heap.peek().map(|Reverse(e)| &e.job)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.heap.iter().map(|Reverse(e)| e.job).collect()
    }
}

/// Oracle discipline: always serves the job scheduled to depart first.
/// Only meaningful during inference replays where departures are known.
#[derive(Debug, Clone)]
pub struct DepartureScheduledWaitingArea {
    heap: PriorityHeap,
    scheduled_departure: Rc<HashMap<Job, Time>>,
}

impl DepartureScheduledWaitingArea {
    pub fn new(scheduled_departure: Rc<HashMap<Job, Time>>) -> Self {
        DepartureScheduledWaitingArea {
            heap: PriorityHeap::new(),
            scheduled_departure,
        }
    }
}

impl WaitingArea for DepartureScheduledWaitingArea {
    fn discipline_name(&self) -> String {
        "departure-scheduled".to_string()
    }

    fn add_job(&mut self, job: Job, _arrival_time: Time) {
        let priority = self.scheduled_departure
                           .get(&job)
                           .map(|t| *t as f64)
                           .unwrap_or(f64::INFINITY);
        self.heap.push(priority, job);
    }

    fn has_next_job(&self) -> bool {
        // a job without a known departure never reaches a server
        match self.heap.peek() {
            Some(job) => self.scheduled_departure.contains_key(job),
            None => false,
        }
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
        Box::new(DepartureScheduledWaitingArea::new(Rc::clone(&self.scheduled_departure)))
    }

    fn best_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![super::exit_time_as_f64(job, exit_time_per_job)]
    }

    fn worst_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        vec![-super::exit_time_as_f64(job, exit_time_per_job)]
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;

    #[test]
    pub fn test_heap_pops_by_priority_then_insertion() {
        let mut heap = PriorityHeap::new();
        heap.push(2.0, Job(0));
        heap.push(1.0, Job(1));
        heap.push(1.0, Job(2));

        assert_eq!(heap.pop(), Some(Job(1)));
        assert_eq!(heap.pop(), Some(Job(2)));
        assert_eq!(heap.pop(), Some(Job(0)));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    pub fn test_departure_scheduled_serves_earliest_departure() {
        let mut scheduled = HashMap::new();
        scheduled.insert(Job(0), 20);
        scheduled.insert(Job(1), 10);

        let mut area = DepartureScheduledWaitingArea::new(Rc::new(scheduled));
        area.add_job(Job(0), 0);
        area.add_job(Job(1), 1);

        assert!(area.has_next_job());
        assert_eq!(area.pop_next_job(2), Some(Job(1)));
        assert_eq!(area.pop_next_job(1), Some(Job(0)));
    }

    #[test]
    pub fn test_jobs_without_departure_block_the_head() {
        let area_map: HashMap<Job, Time> = HashMap::new();
        let mut area = DepartureScheduledWaitingArea::new(Rc::new(area_map));
        area.add_job(Job(0), 0);

        assert_eq!(area.len(), 1);
        assert!(!area.has_next_job());
    }
}
