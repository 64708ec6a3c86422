//! Reconstructs per-job waiting and service times from the two logs by
//! replaying the station under an assumed discipline and server count.
//!
//! The replay runs outside the simulation environment: an inferred
//! completion may lie before the service start when the assumption is
//! wrong, and the environment would reject such an event. Negative
//! service times are kept, they are evidence against the assumption.

use std::collections::HashMap;

use cuemin_core::job::Job;
use cuemin_core::observation::ObservationLog;
use cuemin_core::time::*;
use cuemin_sim::waiting_area::WaitingArea;

#[derive(Debug)]
pub struct InferredTimes {
    pub waiting_time_per_job: HashMap<Job, Duration>,
    pub service_time_per_job: HashMap<Job, Duration>,
    pub jobs_per_server: Vec<Vec<Job>>,
    /// Jobs in the system at the instant each job entered service.
    pub load_at_service_start_per_job: HashMap<Job, usize>,
}

/// Batches reconstructed from simultaneous departures, with one service
/// time per batch.
#[derive(PartialEq, Debug)]
pub struct BatchObservation {
    pub batches: Vec<Vec<Job>>,
    pub service_times: Vec<Duration>,
}

impl BatchObservation {
    pub fn batch_sizes(&self) -> Vec<i64> {
        self.batches.iter().map(|b| b.len() as i64).collect()
    }
}

/// Replays the arrival log against the departure log. Jobs that never
/// depart are left out; they would block the replay forever.
pub fn infer_waiting_and_service_times(
    arrivals: &ObservationLog,
    departures: &ObservationLog,
    waiting_area: &mut dyn WaitingArea,
    nr_of_servers: usize,
) -> InferredTimes {
    let exit_time_per_job = departures.instant_per_job();
    let replayed: Vec<(Time, Job)> = arrivals
        .observations()
        .filter(|o| exit_time_per_job.contains_key(&o.job))
        .map(|o| (o.instant, o.job))
        .collect();

    let mut times = InferredTimes {
        waiting_time_per_job: HashMap::new(),
        service_time_per_job: HashMap::new(),
        jobs_per_server: vec![vec![]; nr_of_servers],
        load_at_service_start_per_job: HashMap::new(),
    };

    let mut arrival_time_per_job = HashMap::new();
    // completion instant per busy server
    let mut busy: Vec<Option<Time>> = vec![None; nr_of_servers];
    let mut next_arrival = 0;

    loop {
        let arrival_instant = replayed.get(next_arrival).map(|(t, _)| *t);
        let completion = busy
            .iter()
            .enumerate()
            .filter_map(|(server, c)| c.map(|t| (t, server)))
            .min();

        // simultaneous events: the arrival is handled first
        let now = match (arrival_instant, completion) {
            (Some(a), Some((c, server))) => {
                if a <= c {
                    let (instant, job) = replayed[next_arrival];
                    next_arrival += 1;
                    arrival_time_per_job.insert(job, instant);
                    waiting_area.add_job(job, instant);
                    a
                } else {
                    busy[server] = None;
                    c
                }
            }
            (Some(_), None) => {
                let (instant, job) = replayed[next_arrival];
                next_arrival += 1;
                arrival_time_per_job.insert(job, instant);
                waiting_area.add_job(job, instant);
                instant
            }
            (None, Some((c, server))) => {
                busy[server] = None;
                c
            }
            (None, None) => break,
        };

        for server in 0..nr_of_servers {
            if busy[server].is_some() || !waiting_area.has_next_job() {
                continue;
            }
            let nr_in_system = waiting_area.len() + busy.iter().filter(|b| b.is_some()).count();
            let job = match waiting_area.pop_next_job(nr_in_system) {
                Some(job) => job,
                None => break,
            };

            let arrival = arrival_time_per_job.get(&job).copied().unwrap_or(now);
            // present for every replayed job, see the filter above
            let exit = exit_time_per_job.get(&job).copied().unwrap_or(now);
            times.waiting_time_per_job.insert(job, now - arrival);
            times.service_time_per_job.insert(job, exit - now);
            times.load_at_service_start_per_job.insert(job, nr_in_system);
            times.jobs_per_server[server].push(job);
            busy[server] = Some(now.max(exit));
        }
    }

    times
}

/// Groups simultaneous departures into batches and assigns each batch
/// to the server that frees earliest. The batch service time runs from
/// the later of that server freeing and the last member arriving.
pub fn infer_service_times_batch(
    arrivals: &ObservationLog,
    departures: &ObservationLog,
    nr_of_servers: usize,
) -> BatchObservation {
    let arrival_time_per_job = arrivals.instant_per_job();

    let mut batches: Vec<(Time, Vec<Job>)> = vec![];
    for o in departures.observations() {
        match batches.last_mut() {
            Some((instant, jobs)) if *instant == o.instant => jobs.push(o.job),
            _ => batches.push((o.instant, vec![o.job])),
        }
    }

    let mut previous_departure: Vec<Option<Time>> = vec![None; nr_of_servers];
    let mut observation = BatchObservation { batches: vec![], service_times: vec![] };

    for (instant, jobs) in batches {
        let server = (0..nr_of_servers)
            .min_by_key(|s| previous_departure[*s].unwrap_or(Time::MIN))
            .unwrap_or(0);

        let last_member_arrival = jobs
            .iter()
            .filter_map(|job| arrival_time_per_job.get(job))
            .max()
            .copied();
        let start = match (previous_departure[server], last_member_arrival) {
            (Some(freed), Some(arrived)) => freed.max(arrived),
            (Some(freed), None) => freed,
            (None, Some(arrived)) => arrived,
            (None, None) => instant,
        };

        previous_departure[server] = Some(instant);
        observation.batches.push(jobs);
        observation.service_times.push(instant - start);
    }

    observation
}
