use std::collections::BTreeMap;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{CandidateSearch, SearchStrategy};

/// Samples server counts with probability inversely proportional to an
/// estimated score, refining the estimates with every real evaluation.
/// The initial estimate assumes the score grows linearly with the
/// server count, which is what an overprovisioned queue tends to do.
pub struct WeightedSamplingSearch {
    patience: usize,
    seed: u64,
}

impl WeightedSamplingSearch {
    pub fn new(patience: usize, seed: u64) -> Self {
        WeightedSamplingSearch { patience, seed }
    }
}

impl SearchStrategy for WeightedSamplingSearch {
    fn search(&mut self, ctx: &mut CandidateSearch) {
        let upper = ctx.max_servers.max(1);
        let mut best = ctx.evaluate(1);
        if upper == 1 {
            return;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut estimates: BTreeMap<usize, f64> = (2..=upper)
            .map(|c| {
                let estimate = if best.is_finite() { best * c as f64 } else { 1.0 };
                (c, estimate)
            })
            .collect();

        let mut patience_left = self.patience;
        while !estimates.is_empty() && patience_left > 0 {
            let min_estimate = estimates.values().cloned().fold(f64::INFINITY, f64::min);

            // inverse-score weights, the cheapest estimate gets weight one
            let weights: Vec<(usize, f64)> = estimates
                .iter()
                .map(|(c, estimate)| (*c, min_estimate / estimate))
                .collect();
            let total: f64 = weights.iter().map(|(_, w)| w).sum();
            let mut draw = rng.gen::<f64>() * total;
            let mut chosen = weights[weights.len() - 1].0;
            for (c, weight) in weights.iter() {
                draw -= weight;
                if draw <= 0.0 {
                    chosen = *c;
                    break;
                }
            }

            let score = ctx.evaluate(chosen);
            estimates.remove(&chosen);

            // the observed score caps the neighbors' estimates
            if score.is_finite() {
                for neighbor in [chosen.wrapping_sub(1), chosen + 1] {
                    if let Some(estimate) = estimates.get_mut(&neighbor) {
                        *estimate = estimate.min(score);
                    }
                }
            }

            if score < best {
                best = score;
                patience_left = self.patience;
            } else {
                patience_left -= 1;
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::strategy::tests::{toy_logs, toy_search};

    #[test]
    pub fn test_sampling_keeps_the_cheapest_count() {
        let (arrivals, departures) = toy_logs();
        let mut ctx = toy_search(&arrivals, &departures);

        WeightedSamplingSearch::new(100, 3).search(&mut ctx);

        assert_eq!(ctx.best.as_ref().unwrap().nr_of_servers, 1);
    }

    #[test]
    pub fn test_patience_bounds_the_number_of_draws() {
        let (arrivals, departures) = toy_logs();
        let mut ctx = toy_search(&arrivals, &departures);

        // one server is best, so every draw after it is a stall
        WeightedSamplingSearch::new(2, 0).search(&mut ctx);

        assert!(ctx.nr_of_evaluated() <= 3);
        assert_eq!(ctx.best.as_ref().unwrap().nr_of_servers, 1);
    }

    #[test]
    pub fn test_same_seed_draws_the_same_counts() {
        let (arrivals, departures) = toy_logs();

        let mut first = toy_search(&arrivals, &departures);
        WeightedSamplingSearch::new(5, 11).search(&mut first);

        let mut second = toy_search(&arrivals, &departures);
        WeightedSamplingSearch::new(5, 11).search(&mut second);

        assert_eq!(first.nr_of_evaluated(), second.nr_of_evaluated());
    }
}
