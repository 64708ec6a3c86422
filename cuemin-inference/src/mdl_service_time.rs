//! Wraps a candidate service time model so that a replay of the logs
//! accumulates the code length of the observed service times under it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use cuemin_core::job::Job;
use cuemin_core::mdl::{prequential_coding_length, universal_integer_code_length, ALMOST_ZERO};
use cuemin_core::time::*;
use cuemin_sim::service_time::ServiceTime;

/// Bits accumulated while replaying: the coded durations, the residual
/// corrections, and the residual sign stream.
#[derive(Debug, Default)]
pub struct MdlCosts {
    pub value_bits: f64,
    pub residual_bits: f64,
    /// Residual signs seen so far: negative, zero, positive.
    pub sign_counts: [usize; 3],
    pub nr_of_unknown_exits: usize,
}

impl MdlCosts {
    pub fn new() -> MdlCosts {
        MdlCosts::default()
    }

    pub fn sign_bits(&self) -> f64 {
        prequential_coding_length(&self.sign_counts, 0.5)
    }

    pub fn total(&self) -> f64 {
        self.value_bits + self.sign_bits() + self.residual_bits
    }
}

/// Service time that reproduces the observed departures while coding
/// them under the wrapped model. The duration handed to the queue is
/// the model's prediction; the correction to the observed departure is
/// coded as a residual.
pub struct MdlServiceTime {
    inner: Box<dyn ServiceTime>,
    exit_time_per_job: Rc<HashMap<Job, Time>>,
    costs: Rc<RefCell<MdlCosts>>,
}

impl MdlServiceTime {
    pub fn new(inner: Box<dyn ServiceTime>, exit_time_per_job: Rc<HashMap<Job, Time>>) -> Self {
        MdlServiceTime {
            inner,
            exit_time_per_job,
            costs: Rc::new(RefCell::new(MdlCosts::new())),
        }
    }

    /// Handle on the accumulator, readable after the replay.
    pub fn costs(&self) -> Rc<RefCell<MdlCosts>> {
        Rc::clone(&self.costs)
    }

    fn encode_residual(&mut self, residual: Duration) {
        let mut costs = self.costs.borrow_mut();
        let sign = match residual {
            r if r < 0 => 0,
            0 => 1,
            _ => 2,
        };
        costs.sign_counts[sign] += 1;
        if residual != 0 {
            costs.residual_bits += universal_integer_code_length(residual.unsigned_abs());
        }
    }

    /// Codes `required` under the model and returns the duration to
    /// predict, falling back to the mode when the model gives the
    /// observed value no usable mass.
    fn predict(&mut self, required: Duration, job: &Job, nr_of_jobs_in_system: usize) -> Duration {
        let p = self.inner.probability(required, job, nr_of_jobs_in_system);
        let mut costs = self.costs.borrow_mut();
        if p <= ALMOST_ZERO {
            let (mode, mode_p) = self.inner.most_likely();
            costs.value_bits += -mode_p.max(ALMOST_ZERO).log2();
            mode
        } else {
            costs.value_bits += -p.log2();
            required
        }
    }
}

impl ServiceTime for MdlServiceTime {
    fn describe(&self) -> String {
        format!("mdl({})", self.inner.describe())
    }

    fn sample(&mut self, now: Time, job: &Job, nr_of_jobs_in_system: usize) -> Duration {
        let exit = match self.exit_time_per_job.get(job) {
            Some(exit) => *exit,
            None => {
                self.costs.borrow_mut().nr_of_unknown_exits += 1;
                return self.inner.most_likely().0;
            }
        };

        let required = exit - now;
        if required < 0 {
            // the observed departure is already unreachable; only the
            // shortfall is coded
            let predicted = self.inner.most_likely().0;
            self.encode_residual(required);
            return predicted;
        }

        let predicted = self.predict(required, job, nr_of_jobs_in_system);
        self.encode_residual(required - predicted);
        predicted
    }

    fn sample_batch(&mut self, now: Time, batch: &[Job], nr_of_jobs_in_system: usize) -> Duration {
        let first = match batch.first() {
            Some(job) => job,
            None => return 0,
        };
        let exit = match self.exit_time_per_job.get(first) {
            Some(exit) => *exit,
            None => {
                self.costs.borrow_mut().nr_of_unknown_exits += 1;
                return self.inner.most_likely().0;
            }
        };

        let required = exit - now;
        let predicted = if required < 0 { 0 } else { self.predict(required, first, nr_of_jobs_in_system) };

        for job in batch {
            match self.exit_time_per_job.get(job) {
                Some(member_exit) => self.encode_residual(member_exit - (now + predicted)),
                None => self.costs.borrow_mut().nr_of_unknown_exits += 1,
            }
        }

        predicted
    }

    fn expected(&self) -> f64 {
        self.inner.expected()
    }

    fn most_likely(&self) -> (Duration, f64) {
        self.inner.most_likely()
    }

    fn probability(&self, duration: Duration, job: &Job, nr_of_jobs_in_system: usize) -> f64 {
        self.inner.probability(duration, job, nr_of_jobs_in_system)
    }

    fn max_probability(&self, duration: Duration) -> f64 {
        self.inner.max_probability(duration)
    }

    fn is_deterministic(&self) -> bool {
        self.inner.is_deterministic()
    }

    fn mdl_of_model(&self) -> f64 {
        self.inner.mdl_of_model()
    }

    fn min_code_length_for_one_job(&self) -> f64 {
        self.inner.min_code_length_for_one_job()
    }

    fn copy(&self) -> Box<dyn ServiceTime> {
        Box::new(MdlServiceTime {
            inner: self.inner.copy(),
            exit_time_per_job: Rc::clone(&self.exit_time_per_job),
            costs: Rc::clone(&self.costs),
        })
    }

    fn copy_mean(&self) -> Box<dyn ServiceTime> {
        Box::new(MdlServiceTime {
            inner: self.inner.copy_mean(),
            exit_time_per_job: Rc::clone(&self.exit_time_per_job),
            costs: Rc::clone(&self.costs),
        })
    }
}
