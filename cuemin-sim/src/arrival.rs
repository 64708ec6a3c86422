use rand::SeedableRng;
use rand::rngs::StdRng;

use cuemin_core::distribution::DiscreteDistribution;
use cuemin_core::job::Job;
use cuemin_core::observation::ObservationLog;
use cuemin_core::time::*;

use crate::population::Population;

/// Produces the stream of (instant, job) arrivals feeding a queue.
#[derive(Debug)]
pub enum ArrivalProcess {
    /// Replays a fixed list of observed arrival instants.
    Fixed {
        population: Population,
        arrival_times: Vec<Time>,
        next: usize,
    },
    /// Samples inter-arrival times from a distribution.
    WithDistribution {
        population: Population,
        distribution: DiscreteDistribution,
        last_arrival: Time,
        rng: StdRng,
        seed: u64,
    },
}

impl ArrivalProcess {
    /// Replays the arrival log: same jobs, same instants, same order.
    pub fn fixed_from_observation(arrivals: &ObservationLog) -> Self {
        let jobs: Vec<Job> = arrivals.jobs().copied().collect();
        let arrival_times: Vec<Time> = arrivals.observations().map(|o| o.instant).collect();

        ArrivalProcess::Fixed {
            population: Population::from_jobs(jobs),
            arrival_times,
            next: 0,
        }
    }

    pub fn with_distribution(population: Population, distribution: DiscreteDistribution, seed: u64) -> Self {
        ArrivalProcess::WithDistribution {
            population,
            distribution,
            last_arrival: 0,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn next_arrival(&mut self) -> Option<(Time, Job)> {
        match self {
            ArrivalProcess::Fixed { population, arrival_times, next } => {
                let instant = *arrival_times.get(*next)?;
                let job = population.next_job()?;
                *next += 1;
                Some((instant, job))
            }
            ArrivalProcess::WithDistribution { population, distribution, last_arrival, rng, .. } => {
                let job = population.next_job()?;
                *last_arrival += distribution.sample(rng).max(0);
                Some((*last_arrival, job))
            }
        }
    }

    pub fn mean_inter_arrival_time(&self) -> Option<f64> {
        match self {
            ArrivalProcess::Fixed { arrival_times, .. } => {
                if arrival_times.len() < 2 {
                    return None;
                }
                let span = (arrival_times[arrival_times.len() - 1] - arrival_times[0]) as f64;
                Some(span / (arrival_times.len() - 1) as f64)
            }
            ArrivalProcess::WithDistribution { distribution, .. } => Some(distribution.mean()),
        }
    }

    /// A copy rewound to the first arrival.
    pub fn restarted(&self) -> Self {
        match self {
            ArrivalProcess::Fixed { population, arrival_times, .. } => ArrivalProcess::Fixed {
                population: population.restarted(),
                arrival_times: arrival_times.clone(),
                next: 0,
            },
            ArrivalProcess::WithDistribution { population, distribution, seed, .. } => {
                ArrivalProcess::with_distribution(population.restarted(), distribution.clone(), *seed)
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::ArrivalProcess;
    use crate::population::Population;
    use cuemin_core::distribution::DiscreteDistribution;
    use cuemin_core::job::Job;
    use cuemin_core::observation::ObservationLog;

    #[test]
    pub fn test_fixed_arrival_replays_the_log() {
        let log = ObservationLog::from([(Job(0), 3), (Job(1), 4), (Job(2), 5)]);
        let mut arrivals = ArrivalProcess::fixed_from_observation(&log);

        assert_eq!(arrivals.next_arrival(), Some((3, Job(0))));
        assert_eq!(arrivals.next_arrival(), Some((4, Job(1))));
        assert_eq!(arrivals.next_arrival(), Some((5, Job(2))));
        assert_eq!(arrivals.next_arrival(), None);

        assert_eq!(arrivals.mean_inter_arrival_time(), Some(1.0));

        let mut rewound = arrivals.restarted();
        assert_eq!(rewound.next_arrival(), Some((3, Job(0))));
    }

    #[test]
    pub fn test_distribution_arrivals_accumulate() {
        let mut arrivals = ArrivalProcess::with_distribution(
            Population::infinite(),
            DiscreteDistribution::Degenerate { value: 7 },
            0,
        );

        assert_eq!(arrivals.next_arrival(), Some((7, Job(0))));
        assert_eq!(arrivals.next_arrival(), Some((14, Job(1))));
        assert_eq!(arrivals.mean_inter_arrival_time(), Some(7.0));
    }
}
