use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{CandidateSearch, SearchStrategy};

const TEMPERATURE_MAX: f64 = 25_000.0;
const TEMPERATURE_MIN: f64 = 2.5;

/// Simulated annealing over the server count: a reflecting random walk
/// in steps of one, with uphill moves accepted at a geometrically
/// cooling temperature. Energies are memoized by the context, so
/// revisits are free.
pub struct SimulatedAnnealingSearch {
    budget: usize,
    seed: u64,
}

impl SimulatedAnnealingSearch {
    pub fn new(budget: usize, seed: u64) -> Self {
        SimulatedAnnealingSearch { budget, seed }
    }
}

impl SearchStrategy for SimulatedAnnealingSearch {
    fn search(&mut self, ctx: &mut CandidateSearch) {
        let upper = ctx.max_servers.max(1);
        let mut energy = ctx.evaluate(1);
        if upper == 1 || self.budget == 0 {
            return;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let steps = self.budget.max(2);
        let cooling = (TEMPERATURE_MIN / TEMPERATURE_MAX).powf(1.0 / (steps - 1) as f64);
        let mut temperature = TEMPERATURE_MAX;
        let mut nr_of_servers = 1;

        for _ in 0..steps {
            if ctx.nr_of_evaluated() >= upper {
                break;
            }

            // walls reflect the walk back into the range
            let proposal = if nr_of_servers == 1 {
                2
            } else if nr_of_servers == upper {
                upper - 1
            } else if rng.gen::<bool>() {
                nr_of_servers + 1
            } else {
                nr_of_servers - 1
            };

            let proposal_energy = ctx.evaluate(proposal);
            let accepted = proposal_energy <= energy || {
                let uphill = proposal_energy - energy;
                rng.gen::<f64>() < (-uphill / temperature).exp()
            };
            if accepted {
                nr_of_servers = proposal;
                energy = proposal_energy;
            }

            temperature *= cooling;
        }
    }
}
