//! Search over the number of servers. Every strategy walks the same
//! memoized evaluation: for a server count, score all candidate models
//! and keep the best seen anywhere.

use std::collections::HashMap;
use std::rc::Rc;

use cuemin_core::distribution::DiscreteDistribution;
use cuemin_core::job::Job;
use cuemin_core::observation::ObservationLog;
use cuemin_core::time::*;
use cuemin_sim::regressor::JobRegressor;
use cuemin_sim::service_time::ServiceTimeWithDistribution;
use cuemin_sim::waiting_area::WaitingArea;

use crate::candidates::{
    generate_batch_size_candidates, generate_distribution_candidates,
    generate_service_time_candidates, ServiceSample,
};
use crate::score::{
    compute_lower_bound_implied_by_model, compute_lower_bound_implied_by_model_and_data,
    compute_mdl, histogram, CandidateModel, Record, ScoreBreakdown, ServiceHistograms,
};
use crate::times::{infer_service_times_batch, infer_waiting_and_service_times};

mod linear;
mod nsection;
mod adaptive;
mod annealing;
mod weighted;

pub use linear::LinearSearch;
pub use nsection::NSectionSearch;
pub use adaptive::AdaptiveStepSizeSearch;
pub use annealing::SimulatedAnnealingSearch;
pub use weighted::WeightedSamplingSearch;

#[derive(Debug)]
pub enum StrategyError {
    TooFewSections { sections: usize },
}

/// The best candidate seen so far, flattened to survive the search.
#[derive(Debug, Clone)]
pub struct EvaluatedCandidate {
    pub waiting_area_name: String,
    pub service_time_name: String,
    pub batch_size_distribution: DiscreteDistribution,
    pub nr_of_servers: usize,
    pub breakdown: ScoreBreakdown,
}

pub trait SearchStrategy {
    fn search(&mut self, ctx: &mut CandidateSearch);
}

/// Evaluation context for one discipline: owns the logs, the search
/// bounds, the score cache, and the running best.
pub struct CandidateSearch<'a> {
    arrivals: &'a ObservationLog,
    departures: &'a ObservationLog,
    waiting_area: Box<dyn WaitingArea>,
    exit_time_per_job: Rc<HashMap<Job, Time>>,
    nr_of_categorical_attributes: usize,
    regressor: Option<Rc<dyn JobRegressor>>,
    seed: u64,
    keep_records: bool,
    pub min_servers: usize,
    pub max_servers: usize,
    score_per_nr_of_servers: HashMap<usize, f64>,
    pub best: Option<EvaluatedCandidate>,
    pub records: Vec<Record>,
}

impl<'a> CandidateSearch<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arrivals: &'a ObservationLog,
        departures: &'a ObservationLog,
        waiting_area: Box<dyn WaitingArea>,
        nr_of_categorical_attributes: usize,
        regressor: Option<Rc<dyn JobRegressor>>,
        seed: u64,
        keep_records: bool,
        min_servers: usize,
        max_servers: usize,
    ) -> Self {
        let exit_time_per_job = Rc::new(departures.instant_per_job());
        CandidateSearch {
            arrivals,
            departures,
            waiting_area,
            exit_time_per_job,
            nr_of_categorical_attributes,
            regressor,
            seed,
            keep_records,
            min_servers: min_servers.max(1),
            max_servers: max_servers.max(min_servers).max(1),
            score_per_nr_of_servers: HashMap::new(),
            best: None,
            records: vec![],
        }
    }

    pub fn nr_of_evaluated(&self) -> usize {
        self.score_per_nr_of_servers.len()
    }

    /// Best score over all candidate models with this server count,
    /// memoized. Infinite when every candidate was pruned or failed.
    pub fn evaluate(&mut self, nr_of_servers: usize) -> f64 {
        if let Some(score) = self.score_per_nr_of_servers.get(&nr_of_servers) {
            return *score;
        }
        let score = self.find_best_for(nr_of_servers);
        self.score_per_nr_of_servers.insert(nr_of_servers, score);
        score
    }

    fn find_best_for(&mut self, nr_of_servers: usize) -> f64 {
        let mut replay_area = self.waiting_area.copy_empty();
        let times = infer_waiting_and_service_times(
            self.arrivals,
            self.departures,
            replay_area.as_mut(),
            nr_of_servers,
        );
        let batch_observation = infer_service_times_batch(self.arrivals, self.departures, nr_of_servers);

        let samples: Vec<ServiceSample> = self
            .arrivals
            .observations()
            .filter_map(|o| {
                let value = *times.service_time_per_job.get(&o.job)?;
                let load = times.load_at_service_start_per_job.get(&o.job).copied().unwrap_or(1);
                Some(ServiceSample { job: o.job, value, load })
            })
            .collect();

        let service_values: Vec<i64> = samples.iter().map(|s| s.value).collect();
        let batch_sizes = batch_observation.batch_sizes();
        let observed_batch_sizes: Vec<usize> = batch_sizes.iter().map(|s| *s as usize).collect();
        let histograms = ServiceHistograms {
            no_batching: histogram(&service_values),
            batching: histogram(&batch_observation.service_times),
            batch_sizes: histogram(&batch_sizes),
        };

        let mut candidates: Vec<CandidateModel> = vec![];
        for service_time in
            generate_service_time_candidates(&samples, self.regressor.as_ref(), self.seed)
        {
            candidates.push(CandidateModel {
                waiting_area: self.waiting_area.copy_empty(),
                nr_of_servers,
                service_time,
                batch_size_distribution: DiscreteDistribution::Degenerate { value: 1 },
            });
        }
        for batch_size_distribution in generate_batch_size_candidates(&batch_sizes) {
            for distribution in generate_distribution_candidates(&batch_observation.service_times) {
                candidates.push(CandidateModel {
                    waiting_area: self.waiting_area.copy_empty(),
                    nr_of_servers,
                    service_time: Box::new(ServiceTimeWithDistribution::new(distribution, self.seed)),
                    batch_size_distribution: batch_size_distribution.clone(),
                });
            }
        }

        let nr_of_jobs = samples.len();
        let mut best_for_count = f64::INFINITY;
        for candidate in candidates {
            let global_best = self.best.as_ref().map(|b| b.breakdown.total).unwrap_or(f64::INFINITY);

            let by_model = compute_lower_bound_implied_by_model(
                &candidate,
                nr_of_jobs,
                self.nr_of_categorical_attributes,
            );
            if by_model >= global_best {
                continue;
            }
            let by_data = compute_lower_bound_implied_by_model_and_data(
                &candidate,
                &histograms,
                self.nr_of_categorical_attributes,
            );
            if by_data >= global_best {
                continue;
            }

            let breakdown = match compute_mdl(
                &candidate,
                self.arrivals,
                &observed_batch_sizes,
                &self.exit_time_per_job,
                self.nr_of_categorical_attributes,
            ) {
                Ok(breakdown) => breakdown,
                // a candidate that cannot replay the logs is skipped,
                // never fatal
                Err(_) => continue,
            };

            if self.keep_records {
                self.records.push(Record::new(&candidate, &breakdown));
            }
            best_for_count = best_for_count.min(breakdown.total);
            if breakdown.total < global_best {
                self.best = Some(EvaluatedCandidate {
                    waiting_area_name: candidate.waiting_area.discipline_name(),
                    service_time_name: candidate.service_time.describe(),
                    batch_size_distribution: candidate.batch_size_distribution.clone(),
                    nr_of_servers,
                    breakdown,
                });
            }
        }

        best_for_count
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use cuemin_sim::waiting_area::FcfsWaitingArea;

    pub fn toy_search<'a>(
        arrivals: &'a ObservationLog,
        departures: &'a ObservationLog,
    ) -> CandidateSearch<'a> {
        CandidateSearch::new(
            arrivals,
            departures,
            Box::new(FcfsWaitingArea::new()),
            0,
            None,
            0,
            false,
            1,
            4,
        )
    }

    pub fn toy_logs() -> (ObservationLog, ObservationLog) {
        let arrivals = ObservationLog::from([(Job(0), 3), (Job(1), 4), (Job(2), 5), (Job(3), 6)]);
        let departures = ObservationLog::from([(Job(0), 8), (Job(1), 13), (Job(2), 18), (Job(3), 23)]);
        (arrivals, departures)
    }

    #[test]
    pub fn test_evaluation_is_memoized() {
        let (arrivals, departures) = toy_logs();
        let mut ctx = toy_search(&arrivals, &departures);

        let first = ctx.evaluate(1);
        let second = ctx.evaluate(1);

        assert_eq!(first, second);
        assert_eq!(ctx.nr_of_evaluated(), 1);
        assert!(first.is_finite());
    }

    #[test]
    pub fn test_one_server_explains_sequential_departures_best() {
        let (arrivals, departures) = toy_logs();
        let mut ctx = toy_search(&arrivals, &departures);

        for c in 1..=4 {
            ctx.evaluate(c);
        }

        let best = ctx.best.as_ref().unwrap();
        assert_eq!(best.nr_of_servers, 1);
        assert_eq!(best.waiting_area_name, "FCFS");
    }

    #[test]
    pub fn test_all_strategies_agree_on_the_toy_data() {
        let (arrivals, departures) = toy_logs();

        let mut strategies: Vec<Box<dyn SearchStrategy>> = vec![
            Box::new(LinearSearch::new(None, None, 2)),
            Box::new(NSectionSearch::new(3).unwrap()),
            Box::new(AdaptiveStepSizeSearch::new(1)),
            Box::new(SimulatedAnnealingSearch::new(200, 0)),
            Box::new(WeightedSamplingSearch::new(100, 0)),
        ];

        let mut totals = vec![];
        for strategy in strategies.iter_mut() {
            let mut ctx = toy_search(&arrivals, &departures);
            strategy.search(&mut ctx);

            let best = ctx.best.expect("every strategy finds a candidate");
            assert_eq!(best.nr_of_servers, 1);
            totals.push(best.breakdown.total);
        }

        for total in totals.iter() {
            assert!((total - totals[0]).abs() < 1e-9);
        }
    }
}
