use std::collections::HashMap;
use std::rc::Rc;

use linked_list::LinkedList;

use cuemin_core::job::Job;
use cuemin_core::time::*;

use crate::regressor::PairwiseClassifier;

use super::{SortKey, WaitingArea};

/// Keeps the waiting jobs in a sorted list; a new job walks from the
/// head until the classifier places it before an existing one.
pub struct PairwiseClassifierWaitingArea {
    list: LinkedList<(Job, Time)>,
    classifier: Rc<dyn PairwiseClassifier>,
    count: usize,
}

impl PairwiseClassifierWaitingArea {
    pub fn new(classifier: Rc<dyn PairwiseClassifier>) -> Self {
        PairwiseClassifierWaitingArea {
            list: LinkedList::new(),
            classifier,
            count: 0,
        }
    }
}

impl WaitingArea for PairwiseClassifierWaitingArea {
    fn discipline_name(&self) -> String {
        format!("pairwise({})", self.classifier.describe())
    }

    fn add_job(&mut self, job: Job, arrival_time: Time) {
        let mut c = self.list.cursor();
        loop {
            let existing = c.peek_next().map(|entry| *entry);
            match existing {
                None => {
                    c.insert((job, arrival_time));
                    break;
                }
                Some((other, other_arrival)) => {
                    if self.classifier.should_serve_before(&job, &other, arrival_time - other_arrival) {
                        c.insert((job, arrival_time));
                        break;
                    }
                    c.next();
                }
            }
        }
        self.count += 1;
    }

    fn pop_next_job(&mut self, _nr_of_jobs_in_system: usize) -> Option<Job> {
        let popped = {
            let mut c = self.list.cursor();
            c.remove()
        };
        popped.map(|(job, _)| {
            self.count -= 1;
            job
        })
    }

    fn len(&self) -> usize {
        self.count
    }

    fn waiting_jobs(&self) -> Vec<Job> {
        self.list.iter().map(|(job, _)| *job).collect()
    }

    fn copy(&self) -> Box<dyn WaitingArea> {
        Box::new(PairwiseClassifierWaitingArea {
            list: self.list.clone(),
            classifier: Rc::clone(&self.classifier),
            count: self.count,
        })
    }

    fn copy_empty(&self) -> Box<dyn WaitingArea> {
        Box::new(PairwiseClassifierWaitingArea::new(Rc::clone(&self.classifier)))
    }

    fn best_case_key(&mut self, _job: &Job, _exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        panic!("pairwise discipline has no synchronized-arrival sort key");
    }

    fn worst_case_key(&mut self, _job: &Job, _exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        panic!("pairwise discipline has no synchronized-arrival sort key");
    }
}

#[cfg(test)]
pub mod tests {
    use std::rc::Rc;

    use super::*;

    struct ServeNewestFirst;

    impl PairwiseClassifier for ServeNewestFirst {
        fn should_serve_before(&self, _a: &Job, _b: &Job, arrival_time_difference: Duration) -> bool {
            arrival_time_difference >= 0
        }

        fn describe(&self) -> String {
            "newest-first".to_string()
        }
    }

    struct ServeOldestFirst;

    impl PairwiseClassifier for ServeOldestFirst {
        fn should_serve_before(&self, _a: &Job, _b: &Job, _arrival_time_difference: Duration) -> bool {
            false
        }

        fn describe(&self) -> String {
            "oldest-first".to_string()
        }
    }

    #[test]
    pub fn test_newest_first_behaves_like_lifo() {
        let mut area = PairwiseClassifierWaitingArea::new(Rc::new(ServeNewestFirst));
        area.add_job(Job(0), 1);
        area.add_job(Job(1), 2);
        area.add_job(Job(2), 3);

        assert_eq!(area.len(), 3);
        assert_eq!(area.pop_next_job(3), Some(Job(2)));
        assert_eq!(area.pop_next_job(2), Some(Job(1)));
        assert_eq!(area.pop_next_job(1), Some(Job(0)));
        assert_eq!(area.pop_next_job(0), None);
    }

    #[test]
    pub fn test_oldest_first_behaves_like_fifo() {
        let mut area = PairwiseClassifierWaitingArea::new(Rc::new(ServeOldestFirst));
        area.add_job(Job(0), 1);
        area.add_job(Job(1), 2);
        area.add_job(Job(2), 3);

        assert_eq!(area.pop_next_job(3), Some(Job(0)));
        assert_eq!(area.waiting_jobs(), vec![Job(1), Job(2)]);
    }
}
