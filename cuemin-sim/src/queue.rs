use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use cuemin_core::distribution::DiscreteDistribution;
use cuemin_core::job::Job;
use cuemin_core::time::*;

use crate::arrival::ArrivalProcess;
use crate::environment::{Environment, SimEvent, SimulationError, PRIORITY_ARRIVAL, PRIORITY_COMPLETION};
use crate::exit::Exit;
use crate::observer::{QueueLengthObserver, SojournTimeObserver, WaitingTimeObserver};
use crate::server::Server;
use crate::service_time::ServiceTime;
use crate::waiting_area::WaitingArea;

/// Produces the batch size a server commits to next. The size persists
/// on the server until enough jobs have accumulated.
pub trait BatchSizeSampler {
    fn next_batch_size(&mut self) -> usize;

    fn describe(&self) -> String;
}

pub struct DistributionBatchSizes {
    distribution: DiscreteDistribution,
    rng: StdRng,
}

impl DistributionBatchSizes {
    pub fn new(distribution: DiscreteDistribution, seed: u64) -> Self {
        DistributionBatchSizes {
            distribution,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl BatchSizeSampler for DistributionBatchSizes {
    fn next_batch_size(&mut self) -> usize {
        self.distribution.sample(&mut self.rng).max(1) as usize
    }

    fn describe(&self) -> String {
        self.distribution.to_string()
    }
}

#[derive(Debug)]
pub enum QueueError {
    Simulation(SimulationError),
}

impl From<SimulationError> for QueueError {
    fn from(e: SimulationError) -> QueueError {
        QueueError::Simulation(e)
    }
}

/// A single service station: arrivals wait in the waiting area until a
/// server takes them, one job or one batch at a time. All servers share
/// one service time model.
pub struct Queue {
    arrival_process: ArrivalProcess,
    waiting_area: Box<dyn WaitingArea>,
    service_time: Box<dyn ServiceTime>,
    servers: Vec<Server>,
    batch_sizes: Option<Box<dyn BatchSizeSampler>>,
    exit: Exit,
    pending_arrival: Option<(Time, Job)>,
    arrival_time_per_job: HashMap<Job, Time>,
    waiting_time_observer: WaitingTimeObserver,
    sojourn_time_observer: SojournTimeObserver,
    queue_length_observer: QueueLengthObserver,
}

impl Queue {
    pub fn new(
        arrival_process: ArrivalProcess,
        waiting_area: Box<dyn WaitingArea>,
        service_time: Box<dyn ServiceTime>,
        nr_of_servers: usize,
    ) -> Queue {
        Queue {
            arrival_process,
            waiting_area,
            service_time,
            servers: (0..nr_of_servers).map(|_| Server::new()).collect(),
            batch_sizes: None,
            exit: Exit::Discard,
            pending_arrival: None,
            arrival_time_per_job: HashMap::new(),
            waiting_time_observer: WaitingTimeObserver::Null,
            sojourn_time_observer: SojournTimeObserver::Null,
            queue_length_observer: QueueLengthObserver::Null,
        }
    }

    pub fn set_exit(&mut self, exit: Exit) {
        self.exit = exit;
    }

    pub fn set_batch_size_sampler(&mut self, sampler: Box<dyn BatchSizeSampler>) {
        self.batch_sizes = Some(sampler);
    }

    pub fn set_waiting_time_observer(&mut self, observer: WaitingTimeObserver) {
        self.waiting_time_observer = observer;
    }

    pub fn set_sojourn_time_observer(&mut self, observer: SojournTimeObserver) {
        self.sojourn_time_observer = observer;
    }

    pub fn set_queue_length_observer(&mut self, observer: QueueLengthObserver) {
        self.queue_length_observer = observer;
    }

    pub fn waiting_area(&self) -> &dyn WaitingArea {
        self.waiting_area.as_ref()
    }

    pub fn waiting_area_mut(&mut self) -> &mut dyn WaitingArea {
        self.waiting_area.as_mut()
    }

    pub fn service_time_mut(&mut self) -> &mut dyn ServiceTime {
        self.service_time.as_mut()
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn exit(&self) -> &Exit {
        &self.exit
    }

    pub fn waiting_time_observer(&self) -> &WaitingTimeObserver {
        &self.waiting_time_observer
    }

    pub fn sojourn_time_observer(&self) -> &SojournTimeObserver {
        &self.sojourn_time_observer
    }

    pub fn queue_length_observer(&self) -> &QueueLengthObserver {
        &self.queue_length_observer
    }

    pub fn nr_of_jobs_in_system(&self) -> usize {
        self.waiting_area.len() + self.servers.iter().map(|s| s.in_service.len()).sum::<usize>()
    }

    /// Puts the first (or next) arrival on the schedule. Arrivals are
    /// chained: each one schedules its successor.
    pub fn schedule_next_arrival(&mut self, env: &mut Environment) -> Result<(), QueueError> {
        if let Some((instant, job)) = self.arrival_process.next_arrival() {
            self.pending_arrival = Some((instant, job));
            env.schedule_at(instant, PRIORITY_ARRIVAL, SimEvent::Arrival)?;
        }
        Ok(())
    }

    pub fn handle_event(&mut self, env: &mut Environment, event: SimEvent) -> Result<(), QueueError> {
        match event {
            SimEvent::Arrival => self.handle_arrival(env),
            SimEvent::ServiceCompletion { server } => self.handle_completion(env, server),
        }
    }

    fn handle_arrival(&mut self, env: &mut Environment) -> Result<(), QueueError> {
        if let Some((instant, job)) = self.pending_arrival.take() {
            self.arrival_time_per_job.insert(job, instant);
            self.waiting_area.add_job(job, instant);
            self.queue_length_observer.notify(instant, self.waiting_area.len());
            self.schedule_next_arrival(env)?;
            self.try_start_service(env)?;
        }
        Ok(())
    }

    fn handle_completion(&mut self, env: &mut Environment, server_id: ServerId) -> Result<(), QueueError> {
        let now = env.now();
        let batch = std::mem::take(&mut self.servers[server_id].in_service);
        self.servers[server_id].nr_of_served_jobs += batch.len();

        for job in batch {
            self.exit.notify(job, now);
            if let Some(arrival) = self.arrival_time_per_job.get(&job) {
                self.sojourn_time_observer.notify(now - arrival);
            }
        }

        self.try_start_service(env)
    }

    fn try_start_service(&mut self, env: &mut Environment) -> Result<(), QueueError> {
        for server_id in 0..self.servers.len() {
            if !self.servers[server_id].is_idle() {
                continue;
            }

            let batch_size = match self.servers[server_id].pending_batch_size {
                Some(k) => k,
                None => {
                    let k = match self.batch_sizes.as_mut() {
                        Some(sampler) => sampler.next_batch_size(),
                        None => 1,
                    };
                    self.servers[server_id].pending_batch_size = Some(k);
                    k
                }
            };

            let nr_in_system = self.nr_of_jobs_in_system();
            let batch = match self.waiting_area.pop_batch(batch_size, nr_in_system) {
                Some(batch) => batch,
                // not enough jobs yet; the sampled size stays pending
                None => continue,
            };
            self.servers[server_id].pending_batch_size = None;

            let now = env.now();
            let still_waiting = self.waiting_area.waiting_jobs();
            for job in batch.iter() {
                let arrival = self.arrival_time_per_job.get(job).copied().unwrap_or(now);
                self.waiting_time_observer.notify(*job, now - arrival, &still_waiting, nr_in_system);
            }

            let service = if batch.len() == 1 {
                self.service_time.sample(now, &batch[0], nr_in_system)
            } else {
                self.service_time.sample_batch(now, &batch, nr_in_system)
            };

            self.servers[server_id].in_service = batch;
            env.schedule_at(now + service.max(0), PRIORITY_COMPLETION, SimEvent::ServiceCompletion { server: server_id })?;
            self.queue_length_observer.notify(now, self.waiting_area.len());
        }
        Ok(())
    }

    /// Runs until no events are left: all arrivals consumed, all
    /// started services completed. Stranded jobs stay in the waiting
    /// area.
    pub fn run(&mut self, env: &mut Environment) -> Result<(), QueueError> {
        env.run_until_event_queue_is_empty(|env, event| self.handle_event(env, event))
    }

    pub fn run_timesteps(&mut self, env: &mut Environment, timesteps: Duration) -> Result<(), QueueError> {
        env.run_timesteps(timesteps, |env, event| self.handle_event(env, event))
    }

    /// Runs until the predicate holds, checked before each event.
    pub fn run_until<P>(&mut self, env: &mut Environment, mut predicate: P) -> Result<(), QueueError>
    where P: FnMut(&Queue) -> bool
    {
        while !predicate(self) {
            match env.pop_next_event() {
                Some(event) => self.handle_event(env, event)?,
                None => break,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::service_time::FixedServiceTime;
    use crate::waiting_area::FcfsWaitingArea;
    use cuemin_core::observation::ObservationLog;

    fn run_fcfs_queue(
        arrivals: ObservationLog,
        service: Duration,
        nr_of_servers: usize,
        batch: Option<DiscreteDistribution>,
    ) -> Queue {
        let mut queue = Queue::new(
            ArrivalProcess::fixed_from_observation(&arrivals),
            Box::new(FcfsWaitingArea::new()),
            Box::new(FixedServiceTime::new(service)),
            nr_of_servers,
        );
        queue.set_exit(Exit::list_collector());
        if let Some(distribution) = batch {
            queue.set_batch_size_sampler(Box::new(DistributionBatchSizes::new(distribution, 0)));
        }

        let mut env = Environment::new();
        queue.schedule_next_arrival(&mut env).unwrap();
        queue.run(&mut env).unwrap();
        queue
    }

    #[test]
    pub fn test_fcfs_single_server_departures() {
        let arrivals = ObservationLog::from([(Job(0), 3), (Job(1), 4), (Job(2), 5), (Job(3), 6)]);
        let queue = run_fcfs_queue(arrivals, 5, 1, None);

        assert_eq!(queue.exit().collected_jobs(), &[Job(0), Job(1), Job(2), Job(3)]);
        assert_eq!(queue.exit().collected_instants(), &[8, 13, 18, 23]);
        assert_eq!(queue.nr_of_jobs_in_system(), 0);
        assert_eq!(queue.servers()[0].nr_of_served_jobs, 4);
    }

    #[test]
    pub fn test_batches_of_two_strand_the_odd_job_out() {
        let arrivals = ObservationLog::from([
            (Job(0), 10), (Job(1), 42), (Job(2), 55), (Job(3), 67), (Job(4), 98),
        ]);
        let queue = run_fcfs_queue(arrivals, 5, 1, Some(DiscreteDistribution::Degenerate { value: 2 }));

        assert_eq!(queue.exit().collected_jobs(), &[Job(0), Job(1), Job(2), Job(3)]);
        assert_eq!(queue.exit().collected_instants(), &[47, 47, 72, 72]);

        // the fifth job can never fill a batch of two
        assert_eq!(queue.waiting_area().waiting_jobs(), vec![Job(4)]);
        assert_eq!(queue.nr_of_jobs_in_system(), 1);
    }

    #[test]
    pub fn test_every_arrived_job_departs_without_batching() {
        let arrivals = ObservationLog::from([
            (Job(0), 0), (Job(1), 1), (Job(2), 1), (Job(3), 2), (Job(4), 30),
        ]);
        let queue = run_fcfs_queue(arrivals, 7, 2, None);

        assert_eq!(queue.exit().collected_jobs().len(), 5);
        assert_eq!(queue.nr_of_jobs_in_system(), 0);
    }

    #[test]
    pub fn test_observers_see_waits_and_sojourns() {
        let arrivals = ObservationLog::from([(Job(0), 0), (Job(1), 1)]);
        let mut queue = Queue::new(
            ArrivalProcess::fixed_from_observation(&arrivals),
            Box::new(FcfsWaitingArea::new()),
            Box::new(FixedServiceTime::new(4)),
            1,
        );
        queue.set_waiting_time_observer(WaitingTimeObserver::recording());
        queue.set_sojourn_time_observer(SojournTimeObserver::recording());

        let mut env = Environment::new();
        queue.schedule_next_arrival(&mut env).unwrap();
        queue.run(&mut env).unwrap();

        assert_eq!(queue.waiting_time_observer().waiting_times(), &[0, 3]);
        assert_eq!(queue.sojourn_time_observer().sojourn_times(), &[4, 7]);
    }

    #[test]
    pub fn test_run_until_stops_on_the_predicate() {
        let arrivals = ObservationLog::from([(Job(0), 0), (Job(1), 10), (Job(2), 20)]);
        let mut queue = Queue::new(
            ArrivalProcess::fixed_from_observation(&arrivals),
            Box::new(FcfsWaitingArea::new()),
            Box::new(FixedServiceTime::new(2)),
            1,
        );
        queue.set_exit(Exit::list_collector());

        let mut env = Environment::new();
        queue.schedule_next_arrival(&mut env).unwrap();
        queue.run_until(&mut env, |q| q.exit().collected_jobs().len() >= 2).unwrap();

        assert_eq!(queue.exit().collected_jobs(), &[Job(0), Job(1)]);
    }
}
