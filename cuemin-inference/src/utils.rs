use cuemin_core::observation::ObservationLog;
use cuemin_core::time::*;

/// Number of jobs in the system at every integer instant from zero to
/// the last observed event.
pub fn count_nr_of_jobs_in_system(
    arrivals: &ObservationLog,
    departures: &ObservationLog,
) -> (Vec<Time>, Vec<usize>) {
    let last = arrivals.last_instant().unwrap_or(0).max(departures.last_instant().unwrap_or(0));

    let arrival_instants: Vec<Time> = arrivals.observations().map(|o| o.instant).collect();
    let departure_instants: Vec<Time> = departures.observations().map(|o| o.instant).collect();

    let mut instants = Vec::with_capacity((last + 1).max(0) as usize);
    let mut counts = Vec::with_capacity((last + 1).max(0) as usize);
    let mut arrived = 0;
    let mut departed = 0;

    for t in 0..=last {
        while arrived < arrival_instants.len() && arrival_instants[arrived] <= t {
            arrived += 1;
        }
        while departed < departure_instants.len() && departure_instants[departed] <= t {
            departed += 1;
        }
        instants.push(t);
        counts.push(arrived.saturating_sub(departed));
    }

    (instants, counts)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use cuemin_core::job::Job;

    #[test]
    pub fn test_counts_track_arrivals_and_departures() {
        let arrivals = ObservationLog::from([(Job(0), 1), (Job(1), 2)]);
        let departures = ObservationLog::from([(Job(0), 3), (Job(1), 5)]);

        let (instants, counts) = count_nr_of_jobs_in_system(&arrivals, &departures);

        assert_eq!(instants, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(counts, vec![0, 1, 2, 1, 1, 0]);
    }
}
