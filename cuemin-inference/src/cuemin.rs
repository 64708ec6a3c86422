//! Top level: enumerate discipline candidates, bracket the server
//! count, and hand each discipline to the configured search strategy.
//! The global best and the recording table survive across disciplines,
//! so later searches prune against everything seen before.

use std::rc::Rc;

use serde::Serialize;

use cuemin_core::job::CategoricalAttribute;
use cuemin_core::observation::ObservationLog;
use cuemin_sim::queue::QueueError;
use cuemin_sim::regressor::JobRegressor;
use cuemin_sim::waiting_area::{
    FcfsWaitingArea, LcfsWaitingArea, RegressorWaitingArea, SiroWaitingArea, WaitingArea,
};

use crate::discipline::{FlifoEstimator, PriorityClassEstimator};
use crate::score::Record;
use crate::servers::{LowerBoundEstimator, UpperBoundEstimator};
use crate::strategy::{
    AdaptiveStepSizeSearch, CandidateSearch, EvaluatedCandidate, LinearSearch, NSectionSearch,
    SearchStrategy, SimulatedAnnealingSearch, StrategyError, WeightedSamplingSearch,
};

pub struct CueMinConfig {
    /// `linear`, `linear-LO-HI`, `N-section`, `adaptive`, `sa`,
    /// `sa-BUDGET` or `weighted_sampling`.
    pub strategy: String,
    pub seed: u64,
    pub patience: usize,
    pub record: bool,
    pub consider_siro: bool,
    pub regressor: Option<Rc<dyn JobRegressor>>,
    pub max_upper_bound: usize,
}

impl Default for CueMinConfig {
    fn default() -> Self {
        CueMinConfig {
            strategy: "linear".to_owned(),
            seed: 0,
            patience: 2,
            record: false,
            consider_siro: true,
            regressor: None,
            max_upper_bound: 1000,
        }
    }
}

#[derive(Debug)]
pub enum CueMinError {
    UnknownStrategy(String),
    Queue(QueueError),
    /// Every candidate was pruned or failed to replay the logs.
    NoViableCandidate,
}

impl From<QueueError> for CueMinError {
    fn from(e: QueueError) -> CueMinError {
        CueMinError::Queue(e)
    }
}

/// The winning model, flattened to descriptions for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct InferredQueue {
    pub waiting_area: String,
    pub nr_of_servers: usize,
    pub service_time: String,
    pub batch_size_distribution: String,
    pub mdl_model: f64,
    pub mdl_service_time: f64,
    pub mdl_batching: f64,
    pub mdl_score: f64,
}

impl From<&EvaluatedCandidate> for InferredQueue {
    fn from(candidate: &EvaluatedCandidate) -> Self {
        InferredQueue {
            waiting_area: candidate.waiting_area_name.clone(),
            nr_of_servers: candidate.nr_of_servers,
            service_time: candidate.service_time_name.clone(),
            batch_size_distribution: candidate.batch_size_distribution.to_string(),
            mdl_model: candidate.breakdown.mdl_model,
            mdl_service_time: candidate.breakdown.mdl_service_time,
            mdl_batching: candidate.breakdown.mdl_batching,
            mdl_score: candidate.breakdown.total,
        }
    }
}

pub struct InferenceOutcome {
    pub best: InferredQueue,
    pub records: Vec<Record>,
}

pub struct CueMin {
    config: CueMinConfig,
}

impl CueMin {
    pub fn new(config: CueMinConfig) -> Self {
        CueMin { config }
    }

    fn make_strategy(&self) -> Result<Box<dyn SearchStrategy>, CueMinError> {
        let name = self.config.strategy.as_str();

        if name == "linear" {
            return Ok(Box::new(LinearSearch::new(None, None, self.config.patience)));
        }
        if let Some(range) = name.strip_prefix("linear-") {
            let bounds: Vec<Option<usize>> =
                range.split('-').map(|part| part.parse().ok()).collect();
            if let [Some(lo), Some(hi)] = bounds[..] {
                return Ok(Box::new(LinearSearch::new(
                    Some(lo),
                    Some(hi),
                    self.config.patience,
                )));
            }
        }
        if let Some(sections) = name.strip_suffix("-section") {
            if let Ok(sections) = sections.parse() {
                return match NSectionSearch::new(sections) {
                    Ok(strategy) => Ok(Box::new(strategy)),
                    Err(StrategyError::TooFewSections { .. }) => {
                        Err(CueMinError::UnknownStrategy(name.to_owned()))
                    }
                };
            }
        }
        if name == "adaptive" {
            return Ok(Box::new(AdaptiveStepSizeSearch::new(self.config.patience)));
        }
        if name == "sa" {
            return Ok(Box::new(SimulatedAnnealingSearch::new(200, self.config.seed)));
        }
        if let Some(budget) = name.strip_prefix("sa-") {
            if let Ok(budget) = budget.parse() {
                return Ok(Box::new(SimulatedAnnealingSearch::new(budget, self.config.seed)));
            }
        }
        if name == "weighted_sampling" {
            return Ok(Box::new(WeightedSamplingSearch::new(
                self.config.patience.max(1),
                self.config.seed,
            )));
        }

        Err(CueMinError::UnknownStrategy(name.to_owned()))
    }

    fn discipline_candidates(
        &self,
        arrivals: &ObservationLog,
        departures: &ObservationLog,
        attributes: &[CategoricalAttribute],
    ) -> Result<Vec<Box<dyn WaitingArea>>, CueMinError> {
        let mut candidates: Vec<Box<dyn WaitingArea>> = vec![
            Box::new(FcfsWaitingArea::new()),
            Box::new(LcfsWaitingArea::new()),
        ];
        if self.config.consider_siro {
            candidates.push(Box::new(SiroWaitingArea::new(self.config.seed)));
        }

        // the estimators replay the serve order, which needs a server
        // count; the FCFS lower bound is the most defensible guess
        let mut fcfs = FcfsWaitingArea::new();
        let nr_of_servers = LowerBoundEstimator.estimate(arrivals, departures, &mut fcfs);

        if let Some(flifo) = FlifoEstimator.estimate(arrivals, departures, nr_of_servers)? {
            candidates.push(Box::new(flifo));
        }
        if !attributes.is_empty() {
            if let Some(priority_class) =
                PriorityClassEstimator.estimate(arrivals, departures, nr_of_servers, attributes)?
            {
                candidates.push(Box::new(priority_class));
            }
        }
        if let Some(regressor) = self.config.regressor.as_ref() {
            candidates.push(Box::new(RegressorWaitingArea::new(Rc::clone(regressor))));
        }

        Ok(candidates)
    }

    /// Infers the discipline, server count, service-time model and
    /// batch-size distribution that compress the logs best.
    pub fn infer_queue(
        &self,
        arrivals: &ObservationLog,
        departures: &ObservationLog,
        attributes: &[CategoricalAttribute],
    ) -> Result<InferenceOutcome, CueMinError> {
        // fail on a bad strategy string before any replay work
        self.make_strategy()?;

        let mut best: Option<EvaluatedCandidate> = None;
        let mut records: Vec<Record> = vec![];

        for mut waiting_area in self.discipline_candidates(arrivals, departures, attributes)? {
            let min_servers =
                LowerBoundEstimator.estimate(arrivals, departures, waiting_area.as_mut());
            let max_servers = UpperBoundEstimator { max_upper_bound: self.config.max_upper_bound }
                .estimate(arrivals, departures, waiting_area.as_mut())?
                .max(min_servers);

            let mut ctx = CandidateSearch::new(
                arrivals,
                departures,
                waiting_area,
                attributes.len(),
                self.config.regressor.clone(),
                self.config.seed,
                self.config.record,
                min_servers,
                max_servers,
            );
            ctx.best = best.take();
            ctx.records = std::mem::take(&mut records);

            self.make_strategy()?.search(&mut ctx);

            best = ctx.best.take();
            records = std::mem::take(&mut ctx.records);
        }

        match best {
            Some(candidate) => Ok(InferenceOutcome {
                best: InferredQueue::from(&candidate),
                records,
            }),
            None => Err(CueMinError::NoViableCandidate),
        }
    }
}
