//! Two-part MDL score of a candidate queue: the model cost plus the
//! cost of the departure log under a replay of that model.

use std::collections::HashMap;
use std::rc::Rc;

use itertools::Itertools;
use serde::Serialize;

use cuemin_core::distribution::DiscreteDistribution;
use cuemin_core::job::Job;
use cuemin_core::mdl::{finite_or_penalty, universal_integer_code_length, ALMOST_ZERO};
use cuemin_core::observation::ObservationLog;
use cuemin_core::time::*;
use cuemin_sim::arrival::ArrivalProcess;
use cuemin_sim::environment::Environment;
use cuemin_sim::queue::{Queue, QueueError};
use cuemin_sim::service_time::ServiceTime;
use cuemin_sim::waiting_area::WaitingArea;

use crate::mdl_batch_size::MdlBatchSizeDistribution;
use crate::mdl_service_time::MdlServiceTime;

/// One fully specified queue under evaluation.
pub struct CandidateModel {
    pub waiting_area: Box<dyn WaitingArea>,
    pub nr_of_servers: usize,
    pub service_time: Box<dyn ServiceTime>,
    pub batch_size_distribution: DiscreteDistribution,
}

impl CandidateModel {
    pub fn is_batching(&self) -> bool {
        self.batch_size_distribution != DiscreteDistribution::Degenerate { value: 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub mdl_model: f64,
    pub mdl_service_time: f64,
    pub mdl_service_time_values: f64,
    pub mdl_service_time_residual: f64,
    pub mdl_batching: f64,
    pub total: f64,
}

/// One scored candidate, flattened for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub waiting_area: String,
    pub batch_size_distribution: String,
    pub nr_of_servers: usize,
    pub service_time: String,
    pub mdl_model: f64,
    pub mdl_service_time: f64,
    pub mdl_service_time_values: f64,
    pub mdl_service_time_residual: f64,
    pub mdl_batching: f64,
    pub mdl_score: f64,
}

impl Record {
    pub fn new(candidate: &CandidateModel, breakdown: &ScoreBreakdown) -> Record {
        Record {
            waiting_area: candidate.waiting_area.discipline_name(),
            batch_size_distribution: candidate.batch_size_distribution.to_string(),
            nr_of_servers: candidate.nr_of_servers,
            service_time: candidate.service_time.describe(),
            mdl_model: breakdown.mdl_model,
            mdl_service_time: breakdown.mdl_service_time,
            mdl_service_time_values: breakdown.mdl_service_time_values,
            mdl_service_time_residual: breakdown.mdl_service_time_residual,
            mdl_batching: breakdown.mdl_batching,
            mdl_score: breakdown.total,
        }
    }
}

/// Value histograms shared by all candidates of one server count, so
/// the data-aware lower bound never replays the queue.
pub struct ServiceHistograms {
    pub no_batching: Vec<(i64, usize)>,
    pub batching: Vec<(i64, usize)>,
    pub batch_sizes: Vec<(i64, usize)>,
}

pub fn histogram(values: &[i64]) -> Vec<(i64, usize)> {
    values.iter().copied().counts().into_iter().sorted().collect()
}

pub fn compute_length_of_model(candidate: &CandidateModel, nr_of_categorical_attributes: usize) -> f64 {
    let mut bits = candidate.waiting_area.mdl_of_model(nr_of_categorical_attributes)
        + universal_integer_code_length(candidate.nr_of_servers as u64)
        + candidate.service_time.mdl_of_model();
    if candidate.is_batching() {
        bits += candidate.batch_size_distribution.mdl_of_model();
    }
    finite_or_penalty(bits)
}

/// Cheapest conceivable score: every job coded at the model's best
/// rate. Admissible by construction, so pruning on it is safe.
pub fn compute_lower_bound_implied_by_model(
    candidate: &CandidateModel,
    nr_of_jobs: usize,
    nr_of_categorical_attributes: usize,
) -> f64 {
    let nr_of_codes = (nr_of_jobs as f64 / candidate.batch_size_distribution.mean()).floor();
    finite_or_penalty(
        compute_length_of_model(candidate, nr_of_categorical_attributes)
            + nr_of_codes * candidate.service_time.min_code_length_for_one_job(),
    )
}

/// Tighter bound: each observed value coded at the model's best rate
/// for that value, over all jobs and loads.
pub fn compute_lower_bound_implied_by_model_and_data(
    candidate: &CandidateModel,
    histograms: &ServiceHistograms,
    nr_of_categorical_attributes: usize,
) -> f64 {
    let mut bits = compute_length_of_model(candidate, nr_of_categorical_attributes);

    let values = if candidate.is_batching() { &histograms.batching } else { &histograms.no_batching };
    for (value, freq) in values {
        let per_value = if *value < 0 {
            // the replay codes an overdue departure as a shortfall
            // residual only
            universal_integer_code_length(value.unsigned_abs())
        } else {
            let max_p = candidate.service_time.max_probability(*value);
            if max_p > ALMOST_ZERO {
                -max_p.log2()
            } else {
                // the replay falls back to the mode and codes the
                // distance to it as a residual; billing more than that
                // would make the bound prune a candidate it must keep
                let (mode, mode_p) = candidate.service_time.most_likely();
                let mut fallback = -mode_p.max(ALMOST_ZERO).log2();
                if *value != mode {
                    fallback += universal_integer_code_length((*value - mode).unsigned_abs());
                }
                fallback
            }
        };
        bits += *freq as f64 * per_value;
    }

    if candidate.is_batching() {
        for (size, freq) in histograms.batch_sizes.iter() {
            let mut p = candidate.batch_size_distribution.pmf(*size);
            if p <= ALMOST_ZERO {
                p = candidate.batch_size_distribution.pmf(candidate.batch_size_distribution.mode());
            }
            bits += *freq as f64 * -p.max(ALMOST_ZERO).log2();
        }
    }

    finite_or_penalty(bits)
}

/// Replays the arrival log through the candidate queue and totals the
/// bits needed to reproduce the departure log.
pub fn compute_mdl(
    candidate: &CandidateModel,
    arrivals: &ObservationLog,
    observed_batch_sizes: &[usize],
    exit_time_per_job: &Rc<HashMap<Job, Time>>,
    nr_of_categorical_attributes: usize,
) -> Result<ScoreBreakdown, QueueError> {
    let mdl_model = compute_length_of_model(candidate, nr_of_categorical_attributes);

    let service_time = MdlServiceTime::new(candidate.service_time.copy(), Rc::clone(exit_time_per_job));
    let costs = service_time.costs();

    let mut queue = Queue::new(
        ArrivalProcess::fixed_from_observation(arrivals),
        candidate.waiting_area.copy_empty(),
        Box::new(service_time),
        candidate.nr_of_servers,
    );

    let mut batch_bits = None;
    if candidate.is_batching() {
        let sampler = MdlBatchSizeDistribution::new(
            candidate.batch_size_distribution.clone(),
            observed_batch_sizes.to_vec(),
        );
        batch_bits = Some(sampler.bits());
        queue.set_batch_size_sampler(Box::new(sampler));
    }

    let mut env = Environment::new();
    queue.schedule_next_arrival(&mut env)?;
    queue.run(&mut env)?;

    // jobs stranded in the waiting area are coded as if served at the
    // end of the replay
    while queue.waiting_area().has_next_job() {
        let nr_in_system = queue.nr_of_jobs_in_system();
        let job = match queue.waiting_area_mut().pop_next_job(nr_in_system) {
            Some(job) => job,
            None => break,
        };
        let now = env.now();
        queue.service_time_mut().sample(now, &job, nr_in_system);
    }

    let costs = costs.borrow();
    let mdl_service_time_values = finite_or_penalty(costs.value_bits);
    let mdl_service_time_residual = finite_or_penalty(costs.sign_bits() + costs.residual_bits);
    let mdl_service_time = mdl_service_time_values + mdl_service_time_residual;
    let mdl_batching = finite_or_penalty(batch_bits.map(|b| *b.borrow()).unwrap_or(0.0));

    Ok(ScoreBreakdown {
        mdl_model,
        mdl_service_time,
        mdl_service_time_values,
        mdl_service_time_residual,
        mdl_batching,
        total: mdl_model + mdl_service_time + mdl_batching,
    })
}
