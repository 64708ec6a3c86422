use std::collections::HashMap;
use std::rc::Rc;

use cuemin_core::job::Job;
use cuemin_core::time::*;

use super::ServiceTime;

/// Looks up the known departure of each job and serves it exactly on
/// time. Only meaningful during inference replays; probability and
/// expectation queries are programmer error.
#[derive(Clone)]
pub struct OracleServiceTime {
    exit_time_per_job: Rc<HashMap<Job, Time>>,
}

impl OracleServiceTime {
    pub fn new(exit_time_per_job: Rc<HashMap<Job, Time>>) -> Self {
        OracleServiceTime { exit_time_per_job }
    }

    fn required(&self, now: Time, job: &Job) -> Duration {
        match self.exit_time_per_job.get(job) {
            Some(exit) => (exit - now).max(0),
            None => 0,
        }
    }
}

impl ServiceTime for OracleServiceTime {
    fn describe(&self) -> String {
        "oracle".to_string()
    }

    fn sample(&mut self, now: Time, job: &Job, _nr_of_jobs_in_system: usize) -> Duration {
        self.required(now, job)
    }

    fn sample_batch(&mut self, now: Time, batch: &[Job], _nr_of_jobs_in_system: usize) -> Duration {
        match batch.last() {
            Some(job) => self.required(now, job),
            None => 0,
        }
    }

    fn expected(&self) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn most_likely(&self) -> (Duration, f64) {
        panic!("oracle service time supports sampling only");
    }

    fn probability(&self, _duration: Duration, _job: &Job, _nr_of_jobs_in_system: usize) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn max_probability(&self, _duration: Duration) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn is_deterministic(&self) -> bool {
        true
    }

    fn mdl_of_model(&self) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn min_code_length_for_one_job(&self) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn copy(&self) -> Box<dyn ServiceTime> {
        Box::new(self.clone())
    }

    fn copy_mean(&self) -> Box<dyn ServiceTime> {
        panic!("oracle service time supports sampling only");
    }
}

/// Oracle that reports zero for jobs already overdue and tracks the
/// longest run of such jobs, a signal that more servers are needed.
#[derive(Clone)]
pub struct OracleCountNegativeServiceTime {
    exit_time_per_job: Rc<HashMap<Job, Time>>,
    current_negative_run: usize,
    max_negative_run: usize,
}

impl OracleCountNegativeServiceTime {
    pub fn new(exit_time_per_job: Rc<HashMap<Job, Time>>) -> Self {
        OracleCountNegativeServiceTime {
            exit_time_per_job,
            current_negative_run: 0,
            max_negative_run: 0,
        }
    }

    pub fn max_negative_run(&self) -> usize {
        self.max_negative_run
    }
}

impl ServiceTime for OracleCountNegativeServiceTime {
    fn describe(&self) -> String {
        "oracle-count-negative".to_string()
    }

    fn sample(&mut self, now: Time, job: &Job, _nr_of_jobs_in_system: usize) -> Duration {
        let required = match self.exit_time_per_job.get(job) {
            Some(exit) => exit - now,
            None => 0,
        };
        if required < 0 {
            self.current_negative_run += 1;
            if self.current_negative_run > self.max_negative_run {
                self.max_negative_run = self.current_negative_run;
            }
            0
        } else {
            self.current_negative_run = 0;
            required
        }
    }

    fn sample_batch(&mut self, _now: Time, _batch: &[Job], _nr_of_jobs_in_system: usize) -> Duration {
        panic!("batches are not supported when counting overdue jobs");
    }

    fn expected(&self) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn most_likely(&self) -> (Duration, f64) {
        panic!("oracle service time supports sampling only");
    }

    fn probability(&self, _duration: Duration, _job: &Job, _nr_of_jobs_in_system: usize) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn max_probability(&self, _duration: Duration) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn is_deterministic(&self) -> bool {
        true
    }

    fn mdl_of_model(&self) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn min_code_length_for_one_job(&self) -> f64 {
        panic!("oracle service time supports sampling only");
    }

    fn copy(&self) -> Box<dyn ServiceTime> {
        Box::new(self.clone())
    }

    fn copy_mean(&self) -> Box<dyn ServiceTime> {
        panic!("oracle service time supports sampling only");
    }
}
