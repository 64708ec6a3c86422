use super::{CandidateSearch, SearchStrategy};

/// Scans the server counts in order, stopping once the score has not
/// improved for `patience` steps.
pub struct LinearSearch {
    min_override: Option<usize>,
    max_override: Option<usize>,
    patience: usize,
}

impl LinearSearch {
    pub fn new(min_override: Option<usize>, max_override: Option<usize>, patience: usize) -> Self {
        LinearSearch { min_override, max_override, patience }
    }
}

impl SearchStrategy for LinearSearch {
    fn search(&mut self, ctx: &mut CandidateSearch) {
        let min = self.min_override.unwrap_or(ctx.min_servers).max(1);
        let max = self.max_override.unwrap_or(ctx.max_servers).max(min);

        let mut best = f64::INFINITY;
        let mut stalls = 0;
        for nr_of_servers in min..=max {
            let score = ctx.evaluate(nr_of_servers);
            if score < best {
                best = score;
                stalls = 0;
            } else {
                stalls += 1;
            }
            if stalls > self.patience && nr_of_servers > min {
                break;
            }
        }
    }
}
