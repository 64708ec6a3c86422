//! Bounds on the number of servers, bracketing the search space.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::rc::Rc;

use cuemin_core::job::Job;
use cuemin_core::observation::ObservationLog;
use cuemin_core::time::*;
use cuemin_sim::arrival::ArrivalProcess;
use cuemin_sim::environment::Environment;
use cuemin_sim::queue::{Queue, QueueError};
use cuemin_sim::service_time::OracleServiceTime;
use cuemin_sim::waiting_area::{SortKey, WaitingArea};

use crate::utils::count_nr_of_jobs_in_system;

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.partial_cmp(y) {
            Some(Ordering::Equal) | None => continue,
            Some(ordering) => return ordering,
        }
    }
    a.len().cmp(&b.len())
}

/// Fewest servers that can explain the departures under the given
/// discipline: replays the serve order and counts how many jobs must
/// be in service at once.
pub struct LowerBoundEstimator;

impl LowerBoundEstimator {
    pub fn estimate(
        &self,
        arrivals: &ObservationLog,
        departures: &ObservationLog,
        waiting_area: &mut dyn WaitingArea,
    ) -> usize {
        if arrivals.is_empty() || departures.is_empty() {
            return 1;
        }

        let exit_time_per_job = departures.instant_per_job();

        // same-instant arrivals ordered so the discipline needs the
        // fewest servers
        let mut known: Vec<(Time, Job, SortKey)> = arrivals
            .observations()
            .filter(|o| exit_time_per_job.contains_key(&o.job))
            .map(|o| {
                let key = waiting_area.best_case_key(&o.job, &exit_time_per_job);
                (o.instant, o.job, key)
            })
            .collect();
        known.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| compare_keys(&a.2, &b.2)));

        let replayed: HashSet<Job> = known.iter().map(|(_, job, _)| *job).collect();
        let departed: Vec<Job> = departures
            .observations()
            .map(|o| o.job)
            .filter(|job| replayed.contains(job))
            .collect();

        let mut nr_of_servers = 1;
        let mut jobs_at_service: Vec<Job> = vec![];
        let mut added: HashSet<Job> = HashSet::new();
        let mut next = 0;

        for leaving in departed {
            while !added.contains(&leaving) && next < known.len() {
                let (instant, job, _) = known[next];
                waiting_area.add_job(job, instant);
                added.insert(job);
                next += 1;
            }

            if let Some(pos) = jobs_at_service.iter().position(|j| *j == leaving) {
                jobs_at_service.remove(pos);
                continue;
            }

            let leaving_exit = exit_time_per_job.get(&leaving).copied();
            loop {
                let nr_in_system = waiting_area.len() + jobs_at_service.len();
                let popped = match waiting_area.pop_next_job(nr_in_system) {
                    Some(job) => job,
                    None => break,
                };
                // jobs departing at the same instant can share a batch,
                // so only other instants force extra servers
                let concurrent = jobs_at_service
                    .iter()
                    .filter(|j| exit_time_per_job.get(j).copied() != leaving_exit)
                    .count();
                nr_of_servers = nr_of_servers.max(concurrent + 1);

                if popped == leaving {
                    break;
                }
                jobs_at_service.push(popped);
            }
        }

        nr_of_servers
    }
}

/// Most servers worth considering: with same-instant arrivals ordered
/// against the discipline, serve every job on its observed schedule
/// and count the servers that ever work.
pub struct UpperBoundEstimator {
    pub max_upper_bound: usize,
}

impl Default for UpperBoundEstimator {
    fn default() -> Self {
        UpperBoundEstimator { max_upper_bound: 1000 }
    }
}

impl UpperBoundEstimator {
    pub fn estimate(
        &self,
        arrivals: &ObservationLog,
        departures: &ObservationLog,
        waiting_area: &mut dyn WaitingArea,
    ) -> Result<usize, QueueError> {
        if arrivals.is_empty() {
            return Ok(1);
        }

        let exit_time_per_job = Rc::new(departures.instant_per_job());

        let mut sorted: Vec<(Time, Job, SortKey)> = arrivals
            .observations()
            .map(|o| {
                let key = waiting_area.worst_case_key(&o.job, &exit_time_per_job);
                (o.instant, o.job, key)
            })
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| compare_keys(&a.2, &b.2)));

        let pairs: Vec<(Job, Time)> = sorted.iter().map(|(instant, job, _)| (*job, *instant)).collect();
        let log = ObservationLog::from(pairs);

        // never more servers busy than jobs in the system, so the peak
        // count plus one idle witness is enough
        let (_, counts) = count_nr_of_jobs_in_system(arrivals, departures);
        let peak = counts.iter().copied().max().unwrap_or(0);
        let nr_of_servers = self.max_upper_bound.min(peak + 1).max(2);

        let mut queue = Queue::new(
            ArrivalProcess::fixed_from_observation(&log),
            waiting_area.copy_empty(),
            Box::new(OracleServiceTime::new(Rc::clone(&exit_time_per_job))),
            nr_of_servers,
        );

        let mut env = Environment::new();
        queue.schedule_next_arrival(&mut env)?;
        match departures.last_instant() {
            Some(last) => queue.run_timesteps(&mut env, last)?,
            None => queue.run(&mut env)?,
        }

        match queue.servers().iter().position(|s| s.nr_of_served_jobs == 0) {
            Some(index) => Ok(index.max(1)),
            // every server worked: the cap was too small
            None => UpperBoundEstimator { max_upper_bound: self.max_upper_bound * 2 }
                .estimate(arrivals, departures, waiting_area),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use cuemin_sim::waiting_area::FcfsWaitingArea;

    #[test]
    pub fn test_lower_bound_on_sequential_data_is_one() {
        let arrivals = ObservationLog::from([(Job(0), 3), (Job(1), 4), (Job(2), 5), (Job(3), 6)]);
        let departures = ObservationLog::from([(Job(0), 8), (Job(1), 13), (Job(2), 18), (Job(3), 23)]);

        let bound = LowerBoundEstimator.estimate(&arrivals, &departures, &mut FcfsWaitingArea::new());
        assert_eq!(bound, 1);
    }

    #[test]
    pub fn test_lower_bound_detects_overtaking() {
        let arrivals = ObservationLog::from([
            (Job(0), 10), (Job(1), 42), (Job(2), 55), (Job(3), 57), (Job(4), 98),
        ]);
        let departures = ObservationLog::from([
            (Job(0), 15), (Job(1), 47), (Job(3), 60), (Job(2), 62), (Job(4), 103),
        ]);

        // the fourth job overtakes the third under FCFS, so a second
        // server must exist
        let bound = LowerBoundEstimator.estimate(&arrivals, &departures, &mut FcfsWaitingArea::new());
        assert_eq!(bound, 2);
    }

    #[test]
    pub fn test_lower_bound_on_empty_logs_is_one() {
        let arrivals = ObservationLog::new();
        let departures = ObservationLog::from([(Job(0), 1)]);

        assert_eq!(LowerBoundEstimator.estimate(&arrivals, &departures, &mut FcfsWaitingArea::new()), 1);
        assert_eq!(LowerBoundEstimator.estimate(&departures, &arrivals, &mut FcfsWaitingArea::new()), 1);
    }

    #[test]
    pub fn test_upper_bound_counts_overlapping_schedules() -> Result<(), QueueError> {
        let arrivals = ObservationLog::from([(Job(0), 3), (Job(1), 4), (Job(2), 5), (Job(3), 6)]);
        let departures = ObservationLog::from([(Job(0), 8), (Job(1), 13), (Job(2), 18), (Job(3), 23)]);

        // all four schedules overlap when each job is served on arrival
        let bound = UpperBoundEstimator::default().estimate(&arrivals, &departures, &mut FcfsWaitingArea::new())?;
        assert_eq!(bound, 4);

        Ok(())
    }

    #[test]
    pub fn test_upper_bound_doubles_a_cap_that_is_too_small() -> Result<(), QueueError> {
        let arrivals = ObservationLog::from([(Job(0), 0), (Job(1), 0), (Job(2), 0)]);
        let departures = ObservationLog::from([(Job(0), 5), (Job(1), 5), (Job(2), 5)]);

        let bound = UpperBoundEstimator { max_upper_bound: 2 }
            .estimate(&arrivals, &departures, &mut FcfsWaitingArea::new())?;
        assert_eq!(bound, 3);

        Ok(())
    }
}
