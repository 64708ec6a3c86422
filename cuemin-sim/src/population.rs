use cuemin_core::job::Job;
use cuemin_core::time::JobId;

/// Source of job identities for an arrival process.
#[derive(PartialEq, Debug, Clone)]
pub enum Population {
    /// A finite list of jobs handed out in order.
    List { jobs: Vec<Job>, next: usize },
    /// Fresh jobs with incrementing ids, never exhausted.
    Infinite { next_id: JobId },
}

impl Population {
    pub fn from_jobs(jobs: Vec<Job>) -> Self {
        Population::List { jobs, next: 0 }
    }

    pub fn infinite() -> Self {
        Population::Infinite { next_id: 0 }
    }

    pub fn next_job(&mut self) -> Option<Job> {
        match self {
            Population::List { jobs, next } => {
                let job = jobs.get(*next).copied();
                if job.is_some() {
                    *next += 1;
                }
                job
            }
            Population::Infinite { next_id } => {
                let job = Job(*next_id);
                *next_id += 1;
                Some(job)
            }
        }
    }

    /// A copy rewound to the first job.
    pub fn restarted(&self) -> Self {
        match self {
            Population::List { jobs, .. } => Population::from_jobs(jobs.clone()),
            Population::Infinite { .. } => Population::infinite(),
        }
    }
}
