use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Deserialize};

use crate::time::JobId;

/// A unit of work flowing through the queue.
/// Per-job attributes live in side tables, not on the job itself.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Job(pub JobId);

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "J{}", self.0)
    }
}

/// A named categorical feature with one value per job.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalAttribute {
    pub name: String,
    pub value_per_job: HashMap<Job, String>,
}

impl CategoricalAttribute {
    pub fn new<S: Into<String>>(name: S, value_per_job: HashMap<Job, String>) -> Self {
        CategoricalAttribute {
            name: name.into(),
            value_per_job,
        }
    }

    pub fn value_of(&self, job: &Job) -> Option<&str> {
        self.value_per_job.get(job).map(|v| v.as_str())
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.value_per_job.values().map(|v| v.as_str()).collect();
        categories.sort();
        categories.dedup();
        categories
    }
}
