use cuemin_core::job::Job;
use cuemin_core::time::Time;

/// Where departed jobs go.
#[derive(PartialEq, Debug, Clone)]
pub enum Exit {
    Discard,
    /// Records departures in order, jobs and instants in parallel lists.
    ListCollector { jobs: Vec<Job>, instants: Vec<Time> },
}

impl Exit {
    pub fn list_collector() -> Self {
        Exit::ListCollector { jobs: vec![], instants: vec![] }
    }

    pub fn notify(&mut self, job: Job, instant: Time) {
        if let Exit::ListCollector { jobs, instants } = self {
            jobs.push(job);
            instants.push(instant);
        }
    }

    pub fn collected_jobs(&self) -> &[Job] {
        match self {
            Exit::Discard => &[],
            Exit::ListCollector { jobs, .. } => jobs,
        }
    }

    pub fn collected_instants(&self) -> &[Time] {
        match self {
            Exit::Discard => &[],
            Exit::ListCollector { instants, .. } => instants,
        }
    }

    pub fn copy_empty(&self) -> Self {
        match self {
            Exit::Discard => Exit::Discard,
            Exit::ListCollector { .. } => Exit::list_collector(),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::Exit;
    use cuemin_core::job::Job;

    #[test]
    pub fn test_list_collector_records_in_order() {
        let mut exit = Exit::list_collector();

        exit.notify(Job(1), 8);
        exit.notify(Job(0), 13);

        assert_eq!(exit.collected_jobs(), &[Job(1), Job(0)]);
        assert_eq!(exit.collected_instants(), &[8, 13]);

        let empty = exit.copy_empty();
        assert_eq!(empty.collected_jobs(), &[] as &[Job]);
    }

    #[test]
    pub fn test_discard_keeps_nothing() {
        let mut exit = Exit::Discard;
        exit.notify(Job(0), 1);
        assert!(exit.collected_jobs().is_empty());
    }
}
