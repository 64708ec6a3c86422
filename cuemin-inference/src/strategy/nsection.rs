use std::collections::BTreeSet;

use super::{CandidateSearch, SearchStrategy, StrategyError};

/// Keeps `n` probes spread over the range and repeatedly moves the
/// worst probe halfway toward the best, until one probe remains.
pub struct NSectionSearch {
    sections: usize,
}

impl NSectionSearch {
    pub fn new(sections: usize) -> Result<Self, StrategyError> {
        if sections < 2 {
            return Err(StrategyError::TooFewSections { sections });
        }
        Ok(NSectionSearch { sections })
    }
}

impl SearchStrategy for NSectionSearch {
    fn search(&mut self, ctx: &mut CandidateSearch) {
        let min = ctx.min_servers.max(1);
        let max = ctx.max_servers.max(min);

        let mut probes: BTreeSet<usize> = BTreeSet::new();
        probes.insert(min);
        probes.insert(max);
        for i in 1..self.sections {
            probes.insert(min + (max - min) * i / (self.sections - 1));
        }

        while probes.len() > 1 {
            let mut best = (f64::INFINITY, 0);
            let mut worst = (f64::NEG_INFINITY, 0);
            for probe in probes.iter().copied().collect::<Vec<usize>>() {
                let score = ctx.evaluate(probe);
                if score < best.0 {
                    best = (score, probe);
                }
                if score >= worst.0 {
                    worst = (score, probe);
                }
            }
            if best.1 == worst.1 {
                break;
            }

            // move the worst probe halfway toward the best, rounding
            // toward the best so the interval always shrinks
            let midpoint = if worst.1 < best.1 {
                (worst.1 + best.1 + 1) / 2
            } else {
                (worst.1 + best.1) / 2
            };
            probes.remove(&worst.1);
            if midpoint != worst.1 {
                probes.insert(midpoint);
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::strategy::tests::{toy_logs, toy_search};

    #[test]
    pub fn test_fewer_than_two_sections_is_rejected() {
        assert!(NSectionSearch::new(1).is_err());
        assert!(NSectionSearch::new(2).is_ok());
    }

    #[test]
    pub fn test_probes_converge_on_the_best_count() {
        let (arrivals, departures) = toy_logs();
        let mut ctx = toy_search(&arrivals, &departures);

        NSectionSearch::new(3).unwrap().search(&mut ctx);

        assert_eq!(ctx.best.as_ref().unwrap().nr_of_servers, 1);
    }

    #[test]
    pub fn test_probes_respect_the_lower_bracket() {
        let (arrivals, departures) = toy_logs();
        let mut ctx = toy_search(&arrivals, &departures);
        ctx.min_servers = 2;

        NSectionSearch::new(2).unwrap().search(&mut ctx);

        assert!(ctx.best.as_ref().unwrap().nr_of_servers >= 2);
    }
}
