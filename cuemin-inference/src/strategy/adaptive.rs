use std::collections::HashSet;

use super::{CandidateSearch, SearchStrategy};

/// Gradient-free hill descent: the step doubles while the score keeps
/// improving, shrinks back on a stall, and the direction flips once
/// before giving up.
pub struct AdaptiveStepSizeSearch {
    patience: usize,
}

impl AdaptiveStepSizeSearch {
    pub fn new(patience: usize) -> Self {
        AdaptiveStepSizeSearch { patience }
    }
}

fn next_unexplored(from: i64, direction: i64, upper: i64, explored: &HashSet<usize>) -> Option<i64> {
    let mut candidate = from;
    while candidate >= 1 && candidate <= upper {
        if !explored.contains(&(candidate as usize)) {
            return Some(candidate);
        }
        candidate += direction;
    }
    None
}

impl SearchStrategy for AdaptiveStepSizeSearch {
    fn search(&mut self, ctx: &mut CandidateSearch) {
        let upper = ctx.max_servers.max(1) as i64;

        let mut explored: HashSet<usize> = HashSet::new();
        let mut nr_of_servers: i64 = 1;
        let mut step: i64 = 1;
        let mut best = f64::INFINITY;
        let mut stalls = 0;
        let mut flipped = false;

        // cap to stay safe against pathological score landscapes
        for _ in 0..(4 * upper + 16) {
            if explored.len() as i64 >= upper {
                break;
            }

            let score = ctx.evaluate(nr_of_servers as usize);
            explored.insert(nr_of_servers as usize);

            if score < best {
                best = score;
                stalls = 0;
                step *= 2;
            } else if step.abs() > 1 {
                step /= 2;
            } else {
                stalls += 1;
                if stalls > self.patience {
                    if flipped {
                        break;
                    }
                    flipped = true;
                    step = -1;
                    stalls = 0;
                }
            }

            let target = (nr_of_servers + step).clamp(1, upper);
            nr_of_servers = match next_unexplored(target, step.signum(), upper, &explored)
                .or_else(|| next_unexplored(target, -step.signum(), upper, &explored))
            {
                Some(next) => {
                    if (next - nr_of_servers).abs() < step.abs() {
                        // the jump was cut short, resume pacing by one
                        step = step.signum();
                    }
                    next
                }
                None => break,
            };
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::strategy::tests::{toy_logs, toy_search};

    #[test]
    pub fn test_descent_settles_on_one_server() {
        let (arrivals, departures) = toy_logs();
        let mut ctx = toy_search(&arrivals, &departures);

        AdaptiveStepSizeSearch::new(1).search(&mut ctx);

        assert_eq!(ctx.best.as_ref().unwrap().nr_of_servers, 1);
    }

    #[test]
    pub fn test_every_count_is_reached_on_a_flat_landscape() {
        let (arrivals, departures) = toy_logs();
        let mut ctx = toy_search(&arrivals, &departures);
        ctx.max_servers = 3;

        AdaptiveStepSizeSearch::new(3).search(&mut ctx);

        assert_eq!(ctx.nr_of_evaluated(), 3);
    }
}
