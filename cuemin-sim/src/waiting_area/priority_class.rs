use std::collections::HashMap;
use std::rc::Rc;

use cuemin_core::job::Job;
use cuemin_core::mdl::log2_factorial;
use cuemin_core::time::*;

use super::{SortKey, WaitingArea};

/// Strict priority between classes of a categorical attribute; each
/// class keeps its own sub-discipline. A job with an unknown category
/// shares the lowest-priority class.
pub struct PriorityClassWaitingArea {
    attribute_name: String,
    value_per_job: Rc<HashMap<Job, String>>,
    class_order: Vec<String>,
    sub_areas: Vec<Box<dyn WaitingArea>>,
}

impl PriorityClassWaitingArea {
    /// `class_order` goes from highest to lowest priority; one sub-area
    /// is created per class from the template.
    pub fn new(
        attribute_name: String,
        value_per_job: Rc<HashMap<Job, String>>,
        class_order: Vec<String>,
        sub_area_template: &dyn WaitingArea,
    ) -> Self {
        let sub_areas = class_order.iter()
                                   .map(|_| sub_area_template.copy_empty())
                                   .collect();
        PriorityClassWaitingArea {
            attribute_name,
            value_per_job,
            class_order,
            sub_areas,
        }
    }

    pub fn class_order(&self) -> &[String] {
        &self.class_order
    }

    fn class_index(&self, job: &Job) -> usize {
        self.value_per_job
            .get(job)
            .and_then(|value| self.class_order.iter().position(|c| c == value))
            .unwrap_or(self.class_order.len() - 1)
    }
}

impl WaitingArea for PriorityClassWaitingArea {
    fn discipline_name(&self) -> String {
        format!(
            "PC({}:[{}],{})",
            self.attribute_name,
            self.class_order.join(">"),
            self.sub_areas[0].discipline_name()
        )
    }

    fn add_job(&mut self, job: Job, arrival_time: Time) {
        let index = self.class_index(&job);
        self.sub_areas[index].add_job(job, arrival_time);
    }

    fn pop_next_job(&mut self, nr_of_jobs_in_system: usize) -> Option<Job> {
        for sub_area in self.sub_areas.iter_mut() {
            if sub_area.has_next_job() {
                return sub_area.pop_next_job(nr_of_jobs_in_system);
            }
        }
        None
    }

    fn pop_batch(&mut self, batch_size: usize, nr_of_jobs_in_system: usize) -> Option<Vec<Job>> {
        if self.len() < batch_size {
            return None;
        }
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            batch.push(self.pop_next_job(nr_of_jobs_in_system)?);
        }
        Some(batch)
    }

    fn len(&self) -> usize {
        self.sub_areas.iter().map(|a| a.len()).sum()
    }

    fn waiting_jobs(&self) -> Vec<Job> {
        self.sub_areas.iter().flat_map(|a| a.waiting_jobs()).collect()
    }

    fn copy(&self) -> Box<dyn WaitingArea> {
        Box::new(PriorityClassWaitingArea {
            attribute_name: self.attribute_name.clone(),
            value_per_job: Rc::clone(&self.value_per_job),
            class_order: self.class_order.clone(),
            sub_areas: self.sub_areas.iter().map(|a| a.copy()).collect(),
        })
    }

    fn copy_empty(&self) -> Box<dyn WaitingArea> {
        Box::new(PriorityClassWaitingArea {
            attribute_name: self.attribute_name.clone(),
            value_per_job: Rc::clone(&self.value_per_job),
            class_order: self.class_order.clone(),
            sub_areas: self.sub_areas.iter().map(|a| a.copy_empty()).collect(),
        })
    }

    fn mdl_of_model(&self, nr_of_categorical_attributes: usize) -> f64 {
        // which attribute, then which permutation of its classes
        (nr_of_categorical_attributes.max(1) as f64).log2()
            + log2_factorial(self.class_order.len() as u64)
    }

    fn best_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        let index = self.class_index(job);
        let mut key = vec![index as f64];
        key.extend(self.sub_areas[index].best_case_key(job, exit_time_per_job));
        key
    }

    fn worst_case_key(&mut self, job: &Job, exit_time_per_job: &HashMap<Job, Time>) -> SortKey {
        let index = self.class_index(job);
        let mut key = vec![index as f64];
        key.extend(self.sub_areas[index].worst_case_key(job, exit_time_per_job));
        key
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::waiting_area::FcfsWaitingArea;

    fn build_area() -> PriorityClassWaitingArea {
        let mut value_per_job = HashMap::new();
        value_per_job.insert(Job(0), "silver".to_string());
        value_per_job.insert(Job(1), "gold".to_string());
        value_per_job.insert(Job(2), "silver".to_string());
        value_per_job.insert(Job(3), "gold".to_string());

        PriorityClassWaitingArea::new(
            "class".to_string(),
            Rc::new(value_per_job),
            vec!["gold".to_string(), "silver".to_string()],
            &FcfsWaitingArea::new(),
        )
    }

    #[test]
    pub fn test_higher_class_is_always_served_first() {
        let mut area = build_area();
        area.add_job(Job(0), 0);
        area.add_job(Job(1), 1);
        area.add_job(Job(2), 2);
        area.add_job(Job(3), 3);

        assert_eq!(area.pop_next_job(4), Some(Job(1)));
        assert_eq!(area.pop_next_job(3), Some(Job(3)));
        assert_eq!(area.pop_next_job(2), Some(Job(0)));
        assert_eq!(area.pop_next_job(1), Some(Job(2)));
    }

    #[test]
    pub fn test_unknown_category_joins_the_lowest_class() {
        let mut area = build_area();
        area.add_job(Job(9), 0); // not in the attribute table
        area.add_job(Job(1), 1);

        assert_eq!(area.pop_next_job(2), Some(Job(1)));
        assert_eq!(area.pop_next_job(1), Some(Job(9)));
    }

    #[test]
    pub fn test_batch_spans_classes() {
        let mut area = build_area();
        area.add_job(Job(0), 0);
        area.add_job(Job(1), 1);

        assert_eq!(area.pop_batch(3, 2), None);
        assert_eq!(area.pop_batch(2, 2), Some(vec![Job(1), Job(0)]));
    }

    #[test]
    pub fn test_model_cost_grows_with_classes() {
        let area = build_area();
        // one attribute, two classes: log2(1) + log2(2!) = 1 bit
        assert_eq!(area.mdl_of_model(1), 1.0);
    }
}
