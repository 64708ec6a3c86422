use cuemin_core::job::Job;
use cuemin_core::time::*;

/// One serve decision: the job taken into service and the jobs it was
/// picked over, with the system load at that instant.
#[derive(PartialEq, Debug, Clone)]
pub struct ServeOrderRecord {
    pub served_job: Job,
    pub still_waiting: Vec<Job>,
    pub nr_of_jobs_in_system: usize,
}

/// Notified whenever a job leaves the waiting area for a server.
#[derive(PartialEq, Debug, Clone)]
pub enum WaitingTimeObserver {
    Null,
    Recording { waiting_times: Vec<Duration> },
    /// Keeps the full serve decisions, for discipline estimation.
    ServeOrder { records: Vec<ServeOrderRecord> },
}

impl WaitingTimeObserver {
    pub fn recording() -> Self {
        WaitingTimeObserver::Recording { waiting_times: vec![] }
    }

    pub fn serve_order() -> Self {
        WaitingTimeObserver::ServeOrder { records: vec![] }
    }

    pub fn notify(&mut self, job: Job, waiting_time: Duration, still_waiting: &[Job], nr_of_jobs_in_system: usize) {
        match self {
            WaitingTimeObserver::Null => {}
            WaitingTimeObserver::Recording { waiting_times } => {
                waiting_times.push(waiting_time);
            }
            WaitingTimeObserver::ServeOrder { records } => {
                records.push(ServeOrderRecord {
                    served_job: job,
                    still_waiting: still_waiting.to_vec(),
                    nr_of_jobs_in_system,
                });
            }
        }
    }

    pub fn waiting_times(&self) -> &[Duration] {
        match self {
            WaitingTimeObserver::Recording { waiting_times } => waiting_times,
            _ => &[],
        }
    }

    pub fn serve_order_records(&self) -> &[ServeOrderRecord] {
        match self {
            WaitingTimeObserver::ServeOrder { records } => records,
            _ => &[],
        }
    }
}

/// Notified on departure with the job's total time in the system.
#[derive(PartialEq, Debug, Clone)]
pub enum SojournTimeObserver {
    Null,
    Recording { sojourn_times: Vec<Duration> },
}

impl SojournTimeObserver {
    pub fn recording() -> Self {
        SojournTimeObserver::Recording { sojourn_times: vec![] }
    }

    pub fn notify(&mut self, sojourn_time: Duration) {
        if let SojournTimeObserver::Recording { sojourn_times } = self {
            sojourn_times.push(sojourn_time);
        }
    }

    pub fn sojourn_times(&self) -> &[Duration] {
        match self {
            SojournTimeObserver::Null => &[],
            SojournTimeObserver::Recording { sojourn_times } => sojourn_times,
        }
    }
}

/// Samples the waiting-area length whenever it changes.
#[derive(PartialEq, Debug, Clone)]
pub enum QueueLengthObserver {
    Null,
    Recording { instants: Vec<Time>, lengths: Vec<usize> },
}

impl QueueLengthObserver {
    pub fn recording() -> Self {
        QueueLengthObserver::Recording { instants: vec![], lengths: vec![] }
    }

    pub fn notify(&mut self, instant: Time, length: usize) {
        if let QueueLengthObserver::Recording { instants, lengths } = self {
            instants.push(instant);
            lengths.push(length);
        }
    }

    pub fn samples(&self) -> (&[Time], &[usize]) {
        match self {
            QueueLengthObserver::Null => (&[], &[]),
            QueueLengthObserver::Recording { instants, lengths } => (instants, lengths),
        }
    }
}
