//! Generates the candidate service time models and batch size
//! distributions evaluated for one server count.

use std::collections::HashSet;
use std::rc::Rc;

use cuemin_core::distribution::DiscreteDistribution;
use cuemin_core::job::Job;
use cuemin_core::math::{quantiles, Stats};
use cuemin_core::mdl::{universal_integer_code_length, ALMOST_ZERO};
use cuemin_sim::regressor::JobRegressor;
use cuemin_sim::service_time::{
    LoadDependentServiceTime, ServiceTime, ServiceTimeWithDistribution, ServiceTimeWithRegressor,
};

/// A regressor is only worth its parameters with enough jobs behind it.
const MIN_JOBS_FOR_REGRESSION: usize = 50;

/// Observed service value and system load for one job, in arrival order.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ServiceSample {
    pub job: Job,
    pub value: i64,
    pub load: usize,
}

/// Distributions fitted to the values, trimmed of the outer quantile
/// tails first. Duplicates and degenerate parameterizations that could
/// never win are dropped.
pub fn generate_distribution_candidates(values: &[i64]) -> Vec<DiscreteDistribution> {
    let mut trimmed: Vec<i64> = values.to_vec();
    if values.len() > 2 {
        if let Some(q) = quantiles(values, 20) {
            let low = q[0];
            let high = q[q.len() - 1];
            trimmed = values
                .iter()
                .copied()
                .filter(|v| (*v as f64) >= low && (*v as f64) <= high)
                .collect();
        }
    }

    let mut subsets = vec![trimmed.clone()];
    if trimmed.iter().any(|v| *v <= 0) {
        subsets.push(trimmed.iter().copied().filter(|v| *v > 0).collect());
    }

    let mut seen = HashSet::new();
    let mut candidates = vec![];
    for subset in subsets {
        if subset.is_empty() {
            continue;
        }
        let fits = [
            DiscreteDistribution::fit_degenerate(&subset),
            DiscreteDistribution::fit_geometric(&subset),
            DiscreteDistribution::fit_poisson(&subset),
        ];
        for fit in fits {
            if let Ok(distribution) = fit {
                if is_viable(&distribution) && seen.insert(distribution.clone()) {
                    candidates.push(distribution);
                }
            }
        }
    }

    candidates
}

fn is_viable(distribution: &DiscreteDistribution) -> bool {
    let degenerate = matches!(distribution, DiscreteDistribution::Degenerate { .. });
    if degenerate && distribution.mode() == 0 {
        return false;
    }
    if !degenerate && distribution.variance() == 0.0 {
        return false;
    }
    distribution.mode() >= 0 && distribution.mean() >= 0.0 && distribution.mdl_of_model().is_finite()
}

/// Service time candidates for one server count: plain distributions,
/// load-dependent regimes, and regressor-based models when a fitted
/// regressor is available.
pub fn generate_service_time_candidates(
    samples: &[ServiceSample],
    regressor: Option<&Rc<dyn JobRegressor>>,
    seed: u64,
) -> Vec<Box<dyn ServiceTime>> {
    let values: Vec<i64> = samples.iter().map(|s| s.value).collect();

    let mut candidates: Vec<Box<dyn ServiceTime>> = generate_distribution_candidates(&values)
        .into_iter()
        .map(|d| Box::new(ServiceTimeWithDistribution::new(d, seed)) as Box<dyn ServiceTime>)
        .collect();

    for nr_of_regimes in 2..=3 {
        if let Some(candidate) = load_dependent_candidate(samples, nr_of_regimes, seed) {
            candidates.push(candidate);
        }
    }

    if let Some(regressor) = regressor {
        if samples.len() > MIN_JOBS_FOR_REGRESSION {
            let residuals: Vec<i64> = samples
                .iter()
                .map(|s| s.value - regressor.predict(&s.job).round() as i64)
                .collect();
            for error_distribution in generate_error_candidates(&residuals) {
                candidates.push(Box::new(ServiceTimeWithRegressor::new(
                    Rc::clone(regressor),
                    error_distribution,
                    seed,
                )));
            }
        }
    }

    candidates
}

/// Residuals may be negative, so only fits with support there survive.
fn generate_error_candidates(residuals: &[i64]) -> Vec<DiscreteDistribution> {
    let mut seen = HashSet::new();
    let mut candidates = vec![];
    let fits = [
        DiscreteDistribution::fit_degenerate(residuals),
        DiscreteDistribution::fit_poisson(residuals),
    ];
    for fit in fits {
        if let Ok(distribution) = fit {
            if distribution.mdl_of_model().is_finite() && seen.insert(distribution.clone()) {
                candidates.push(distribution);
            }
        }
    }
    candidates
}

/// One load-dependent candidate with `nr_of_regimes` regimes: clusters
/// the loads by minimizing within-cluster spread, then fits the best
/// distribution per regime. `None` when the regimes collapse.
fn load_dependent_candidate(
    samples: &[ServiceSample],
    nr_of_regimes: usize,
    seed: u64,
) -> Option<Box<dyn ServiceTime>> {
    let mut sorted: Vec<(usize, i64)> = samples.iter().map(|s| (s.load, s.value)).collect();
    sorted.sort_unstable();

    let loads: Vec<usize> = sorted.iter().map(|(load, _)| *load).collect();
    let boundaries = best_boundaries(&loads, nr_of_regimes)?;

    let mut thresholds: Vec<usize> = boundaries
        .iter()
        .map(|b| (loads[b - 1] + loads[*b]) / 2)
        .filter(|t| *t >= 1)
        .collect();
    thresholds.dedup();
    if thresholds.len() != nr_of_regimes - 1 {
        return None;
    }

    let mut submodels: Vec<Box<dyn ServiceTime>> = vec![];
    let mut descriptions: Vec<String> = vec![];
    let mut start = 0;
    for regime in 0..nr_of_regimes {
        let end = boundaries.get(regime).copied().unwrap_or(sorted.len());
        let regime_values: Vec<i64> = sorted[start..end].iter().map(|(_, v)| *v).collect();
        start = end;

        let submodel = best_submodel(&regime_values, seed)?;
        descriptions.push(submodel.describe());
        submodels.push(submodel);
    }

    // identical adjacent regimes mean the split explains nothing
    if descriptions.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }

    LoadDependentServiceTime::new(thresholds, submodels)
        .ok()
        .map(|st| Box::new(st) as Box<dyn ServiceTime>)
}

/// Boundary indices into the sorted loads minimizing the total squared
/// deviation within each cluster. Exhaustive, the load range is small.
fn best_boundaries(loads: &[usize], nr_of_regimes: usize) -> Option<Vec<usize>> {
    let splittable: Vec<usize> = (1..loads.len()).filter(|i| loads[*i - 1] != loads[*i]).collect();
    if splittable.len() < nr_of_regimes - 1 {
        return None;
    }

    let cost = |from: usize, to: usize| -> f64 {
        let slice: Vec<i64> = loads[from..to].iter().map(|l| *l as i64).collect();
        match Stats::of(&slice) {
            Some(stats) => stats.variance * slice.len() as f64,
            None => 0.0,
        }
    };

    let mut best: Option<(f64, Vec<usize>)> = None;
    match nr_of_regimes {
        2 => {
            for a in splittable.iter() {
                let total = cost(0, *a) + cost(*a, loads.len());
                if best.as_ref().map_or(true, |(c, _)| total < *c) {
                    best = Some((total, vec![*a]));
                }
            }
        }
        3 => {
            for (i, a) in splittable.iter().enumerate() {
                for b in splittable[i + 1..].iter() {
                    let total = cost(0, *a) + cost(*a, *b) + cost(*b, loads.len());
                    if best.as_ref().map_or(true, |(c, _)| total < *c) {
                        best = Some((total, vec![*a, *b]));
                    }
                }
            }
        }
        _ => return None,
    }

    best.map(|(_, boundaries)| boundaries)
}

/// The distribution explaining the values in the fewest bits, model
/// plus data.
fn best_submodel(values: &[i64], seed: u64) -> Option<Box<dyn ServiceTime>> {
    let mut best: Option<(f64, DiscreteDistribution)> = None;
    for distribution in generate_distribution_candidates(values) {
        let mut bits = distribution.mdl_of_model();
        for value in values {
            let p = distribution.pmf(*value);
            if p > ALMOST_ZERO {
                bits += -p.log2();
            } else {
                bits += universal_integer_code_length(value.unsigned_abs() + 1);
            }
        }
        if best.as_ref().map_or(true, |(b, _)| bits < *b) {
            best = Some((bits, distribution));
        }
    }
    best.map(|(_, d)| Box::new(ServiceTimeWithDistribution::new(d, seed)) as Box<dyn ServiceTime>)
}

/// Batch size distributions worth trying, beyond no batching at all.
pub fn generate_batch_size_candidates(batch_sizes: &[i64]) -> Vec<DiscreteDistribution> {
    let stats = match Stats::of(batch_sizes) {
        Some(stats) => stats,
        None => return vec![],
    };

    let mut seen = HashSet::new();
    let mut candidates = vec![];

    if stats.mean > 1.0 {
        let candidate = DiscreteDistribution::Degenerate { value: stats.mean.round() as i64 };
        if seen.insert(candidate.clone()) {
            candidates.push(candidate);
        }
    }
    if stats.mean != stats.min as f64 {
        if let Ok(candidate) = DiscreteDistribution::fit_poisson(batch_sizes) {
            if seen.insert(candidate.clone()) {
                candidates.push(candidate);
            }
        }
        if let Ok(candidate) = DiscreteDistribution::fit_by_mean_and_variance(stats.mean, stats.variance) {
            if candidate.mean() > 1.0 && candidate.mode() >= 1 && seen.insert(candidate.clone()) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}
