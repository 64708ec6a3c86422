//! Estimates the queueing discipline from the serve order implied by
//! the two logs.
//!
//! The serve order is reconstructed by replaying the arrivals against
//! an oracle that always serves the job scheduled to depart first; the
//! resulting serve decisions are then mined for FIFO or LIFO evidence,
//! overall, per load, and per categorical class.

use std::collections::HashMap;
use std::rc::Rc;

use cuemin_core::job::{CategoricalAttribute, Job};
use cuemin_core::observation::ObservationLog;
use cuemin_core::time::*;
use cuemin_sim::arrival::ArrivalProcess;
use cuemin_sim::environment::Environment;
use cuemin_sim::observer::{ServeOrderRecord, WaitingTimeObserver};
use cuemin_sim::queue::{Queue, QueueError};
use cuemin_sim::service_time::OracleServiceTime;
use cuemin_sim::waiting_area::{
    DepartureScheduledWaitingArea, FcfsWaitingArea, FlifoWaitingArea, LcfsWaitingArea,
    PriorityClassWaitingArea, WaitingArea,
};

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum ServeSignal {
    Fifo,
    Lifo,
}

/// Replays the logs under the departure oracle and returns every serve
/// decision together with the arrival instants.
pub fn collect_serve_order_records(
    arrivals: &ObservationLog,
    departures: &ObservationLog,
    nr_of_servers: usize,
) -> Result<(Vec<ServeOrderRecord>, HashMap<Job, Time>), QueueError> {
    let exit_time_per_job = Rc::new(departures.instant_per_job());

    let replayed: Vec<(Job, Time)> = arrivals
        .observations()
        .filter(|o| exit_time_per_job.contains_key(&o.job))
        .map(|o| (o.job, o.instant))
        .collect();
    let arrival_time_per_job: HashMap<Job, Time> = replayed.iter().copied().collect();
    let log = ObservationLog::from(replayed);

    let mut queue = Queue::new(
        ArrivalProcess::fixed_from_observation(&log),
        Box::new(DepartureScheduledWaitingArea::new(Rc::clone(&exit_time_per_job))),
        Box::new(OracleServiceTime::new(Rc::clone(&exit_time_per_job))),
        nr_of_servers,
    );
    queue.set_waiting_time_observer(WaitingTimeObserver::serve_order());

    let mut env = Environment::new();
    queue.schedule_next_arrival(&mut env)?;
    queue.run(&mut env)?;

    Ok((queue.waiting_time_observer().serve_order_records().to_vec(), arrival_time_per_job))
}

/// Classifies a serve decision: FIFO when the served job arrived no
/// later than every waiting job, LIFO when no earlier. Ambiguous
/// decisions carry no signal.
fn classify(
    record: &ServeOrderRecord,
    arrival_time_per_job: &HashMap<Job, Time>,
) -> Option<(usize, ServeSignal)> {
    if record.still_waiting.is_empty() {
        return None;
    }
    let served = arrival_time_per_job.get(&record.served_job)?;
    let waiting: Vec<Time> = record
        .still_waiting
        .iter()
        .filter_map(|job| arrival_time_per_job.get(job).copied())
        .collect();
    let min = *waiting.iter().min()?;
    let max = *waiting.iter().max()?;

    if *served <= min {
        Some((record.nr_of_jobs_in_system, ServeSignal::Fifo))
    } else if *served >= max {
        Some((record.nr_of_jobs_in_system, ServeSignal::Lifo))
    } else {
        None
    }
}

/// Best 2-leaf split of the signals over the load: the threshold that
/// misclassifies the fewest decisions, with the two sides disagreeing.
/// Returns the threshold and whether the low-load side is FIFO.
pub fn fit_load_split(samples: &[(usize, ServeSignal)]) -> Option<(usize, bool)> {
    let mut loads: Vec<usize> = samples.iter().map(|(load, _)| *load).collect();
    loads.sort_unstable();
    loads.dedup();

    let mut thresholds: Vec<usize> = loads.windows(2).map(|w| (w[0] + w[1]) / 2 + 1).collect();
    thresholds.dedup();

    let majority = |side: &[&ServeSignal]| -> ServeSignal {
        let fifo = side.iter().filter(|s| ***s == ServeSignal::Fifo).count();
        // ties default to FIFO
        if fifo * 2 >= side.len() { ServeSignal::Fifo } else { ServeSignal::Lifo }
    };

    let mut best: Option<(usize, usize, bool)> = None;
    for threshold in thresholds {
        let low: Vec<&ServeSignal> = samples.iter().filter(|(l, _)| *l < threshold).map(|(_, s)| s).collect();
        let high: Vec<&ServeSignal> = samples.iter().filter(|(l, _)| *l >= threshold).map(|(_, s)| s).collect();
        if low.is_empty() || high.is_empty() {
            continue;
        }

        let low_majority = majority(&low);
        let high_majority = majority(&high);
        if low_majority == high_majority {
            continue;
        }

        let errors = low.iter().filter(|s| ***s != low_majority).count()
            + high.iter().filter(|s| ***s != high_majority).count();
        let better = match best {
            Some((best_errors, _, _)) => errors < best_errors,
            None => true,
        };
        if better {
            best = Some((errors, threshold, low_majority == ServeSignal::Fifo));
        }
    }

    best.map(|(_, threshold, fifo_on_low_load)| (threshold, fifo_on_low_load))
}

/// FLIFO: FIFO below some load, LIFO above it (or the reverse). `None`
/// when the serve order never switches.
pub struct FlifoEstimator;

impl FlifoEstimator {
    pub fn estimate(
        &self,
        arrivals: &ObservationLog,
        departures: &ObservationLog,
        nr_of_servers: usize,
    ) -> Result<Option<FlifoWaitingArea>, QueueError> {
        let (records, arrival_time_per_job) =
            collect_serve_order_records(arrivals, departures, nr_of_servers)?;

        let samples: Vec<(usize, ServeSignal)> = records
            .iter()
            .filter_map(|record| classify(record, &arrival_time_per_job))
            .collect();

        Ok(fit_load_split(&samples)
            .map(|(threshold, fifo_on_low_load)| FlifoWaitingArea::new(threshold, fifo_on_low_load)))
    }
}

/// Majority vote between FIFO and LIFO, ignoring the load.
pub struct NaiveLifoOrFifoEstimator;

impl NaiveLifoOrFifoEstimator {
    pub fn estimate(
        &self,
        arrivals: &ObservationLog,
        departures: &ObservationLog,
        nr_of_servers: usize,
    ) -> Result<Box<dyn WaitingArea>, QueueError> {
        let (records, arrival_time_per_job) =
            collect_serve_order_records(arrivals, departures, nr_of_servers)?;

        let mut fifo = 0;
        let mut lifo = 0;
        for record in records.iter() {
            match classify(record, &arrival_time_per_job) {
                Some((_, ServeSignal::Fifo)) => fifo += 1,
                Some((_, ServeSignal::Lifo)) => lifo += 1,
                None => {}
            }
        }

        if fifo >= lifo {
            Ok(Box::new(FcfsWaitingArea::new()))
        } else {
            Ok(Box::new(LcfsWaitingArea::new()))
        }
    }
}

/// Strict class priority over a categorical attribute: picks the
/// attribute whose classes best separate the serve order and ranks the
/// classes by how often they win.
pub struct PriorityClassEstimator;

struct AttributeEvidence {
    conditional_entropy: f64,
    class_order: Vec<String>,
    same_class_fifo: usize,
    same_class_lifo: usize,
}

impl PriorityClassEstimator {
    pub fn estimate(
        &self,
        arrivals: &ObservationLog,
        departures: &ObservationLog,
        nr_of_servers: usize,
        attributes: &[CategoricalAttribute],
    ) -> Result<Option<PriorityClassWaitingArea>, QueueError> {
        let (records, arrival_time_per_job) =
            collect_serve_order_records(arrivals, departures, nr_of_servers)?;

        let mut best: Option<(AttributeEvidence, &CategoricalAttribute)> = None;
        for attribute in attributes {
            if let Some(evidence) = Self::evidence_for(attribute, &records, &arrival_time_per_job) {
                let better = match &best {
                    Some((current, _)) => evidence.conditional_entropy < current.conditional_entropy,
                    None => true,
                };
                if better {
                    best = Some((evidence, attribute));
                }
            }
        }

        Ok(best.map(|(evidence, attribute)| {
            let sub_area: Box<dyn WaitingArea> = if evidence.same_class_fifo >= evidence.same_class_lifo {
                Box::new(FcfsWaitingArea::new())
            } else {
                Box::new(LcfsWaitingArea::new())
            };
            PriorityClassWaitingArea::new(
                attribute.name.clone(),
                Rc::new(attribute.value_per_job.clone()),
                evidence.class_order,
                sub_area.as_ref(),
            )
        }))
    }

    fn evidence_for(
        attribute: &CategoricalAttribute,
        records: &[ServeOrderRecord],
        arrival_time_per_job: &HashMap<Job, Time>,
    ) -> Option<AttributeEvidence> {
        let mut wins: HashMap<&str, usize> = HashMap::new();
        let mut losses: HashMap<&str, usize> = HashMap::new();
        let mut same_class_fifo = 0;
        let mut same_class_lifo = 0;

        for record in records {
            let served_class = match attribute.value_of(&record.served_job) {
                Some(class) => class,
                None => continue,
            };

            let mut same_class_arrivals: Vec<Time> = vec![];
            for job in record.still_waiting.iter() {
                match attribute.value_of(job) {
                    Some(class) if class == served_class => {
                        if let Some(arrival) = arrival_time_per_job.get(job) {
                            same_class_arrivals.push(*arrival);
                        }
                    }
                    Some(class) => {
                        *wins.entry(served_class).or_insert(0) += 1;
                        *losses.entry(class).or_insert(0) += 1;
                    }
                    None => {}
                }
            }

            if let (Some(served), Some(min), Some(max)) = (
                arrival_time_per_job.get(&record.served_job),
                same_class_arrivals.iter().min(),
                same_class_arrivals.iter().max(),
            ) {
                if served <= min {
                    same_class_fifo += 1;
                } else if served >= max {
                    same_class_lifo += 1;
                }
            }
        }

        let mut classes: Vec<&str> = attribute
            .categories()
            .into_iter()
            .filter(|class| wins.contains_key(class) || losses.contains_key(class))
            .collect();
        if classes.len() < 2 {
            return None;
        }

        let total_evidence: usize = classes
            .iter()
            .map(|c| wins.get(c).unwrap_or(&0) + losses.get(c).unwrap_or(&0))
            .sum();

        let win_rate = |class: &str| -> f64 {
            let w = *wins.get(class).unwrap_or(&0) as f64;
            let l = *losses.get(class).unwrap_or(&0) as f64;
            (w + 0.5) / (w + l + 1.0)
        };

        let mut conditional_entropy = 0.0;
        for class in classes.iter() {
            let w = *wins.get(*class).unwrap_or(&0) as f64;
            let l = *losses.get(*class).unwrap_or(&0) as f64;
            let p = win_rate(class);
            let entropy = -p * p.log2() - (1.0 - p) * (1.0 - p).log2();
            conditional_entropy += (w + l) / total_evidence as f64 * entropy;
        }

        // highest win rate serves first; names break ties for a
        // deterministic order
        classes.sort_by(|a, b| {
            win_rate(b).partial_cmp(&win_rate(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });

        Some(AttributeEvidence {
            conditional_entropy,
            class_order: classes.into_iter().map(|c| c.to_string()).collect(),
            same_class_fifo,
            same_class_lifo,
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_fit_load_split_finds_the_boundary() {
        let samples = vec![
            (1, ServeSignal::Fifo),
            (2, ServeSignal::Fifo),
            (5, ServeSignal::Lifo),
            (6, ServeSignal::Lifo),
        ];

        assert_eq!(fit_load_split(&samples), Some((4, true)));
    }

    #[test]
    pub fn test_fit_load_split_needs_disagreeing_sides() {
        let samples = vec![(1, ServeSignal::Fifo), (5, ServeSignal::Fifo)];
        assert_eq!(fit_load_split(&samples), None);
    }

    #[test]
    pub fn test_naive_estimator_recognizes_lifo() -> Result<(), QueueError> {
        let arrivals = ObservationLog::from([(Job(0), 0), (Job(1), 1), (Job(2), 2)]);
        let departures = ObservationLog::from([(Job(0), 5), (Job(2), 8), (Job(1), 11)]);

        let area = NaiveLifoOrFifoEstimator.estimate(&arrivals, &departures, 1)?;
        assert_eq!(area.discipline_name(), "LCFS");

        Ok(())
    }

    #[test]
    pub fn test_naive_estimator_recognizes_fifo() -> Result<(), QueueError> {
        let arrivals = ObservationLog::from([(Job(0), 0), (Job(1), 1), (Job(2), 2)]);
        let departures = ObservationLog::from([(Job(0), 5), (Job(1), 8), (Job(2), 11)]);

        let area = NaiveLifoOrFifoEstimator.estimate(&arrivals, &departures, 1)?;
        assert_eq!(area.discipline_name(), "FCFS");

        Ok(())
    }

    #[test]
    pub fn test_flifo_estimator_finds_the_switch() -> Result<(), QueueError> {
        // one server, FIFO below three jobs in the system, LIFO above
        let arrivals = ObservationLog::from([
            (Job(0), 0), (Job(1), 1), (Job(2), 2), (Job(3), 3), (Job(4), 4),
        ]);
        let departures = ObservationLog::from([
            (Job(0), 10), (Job(4), 12), (Job(3), 14), (Job(1), 16), (Job(2), 18),
        ]);

        let area = FlifoEstimator.estimate(&arrivals, &departures, 1)?.unwrap();
        assert_eq!(area.load_threshold(), 3);
        assert!(area.fifo_on_low_load());

        Ok(())
    }

    #[test]
    pub fn test_flifo_estimator_rejects_pure_fifo() -> Result<(), QueueError> {
        let arrivals = ObservationLog::from([(Job(0), 0), (Job(1), 1), (Job(2), 2)]);
        let departures = ObservationLog::from([(Job(0), 5), (Job(1), 8), (Job(2), 11)]);

        assert!(FlifoEstimator.estimate(&arrivals, &departures, 1)?.is_none());

        Ok(())
    }

    #[test]
    pub fn test_priority_class_estimator_ranks_the_classes() -> Result<(), QueueError> {
        let mut value_per_job = HashMap::new();
        value_per_job.insert(Job(0), "silver".to_string());
        value_per_job.insert(Job(1), "gold".to_string());
        value_per_job.insert(Job(2), "silver".to_string());
        value_per_job.insert(Job(3), "gold".to_string());
        let attribute = CategoricalAttribute::new("class", value_per_job);

        let arrivals = ObservationLog::from([(Job(0), 0), (Job(1), 1), (Job(2), 2), (Job(3), 3)]);
        // gold always departs before waiting silver
        let departures = ObservationLog::from([(Job(0), 10), (Job(1), 12), (Job(3), 14), (Job(2), 16)]);

        let area = PriorityClassEstimator
            .estimate(&arrivals, &departures, 1, &[attribute])?
            .unwrap();

        assert_eq!(area.class_order(), &["gold".to_string(), "silver".to_string()]);
        assert!(area.discipline_name().starts_with("PC(class"));

        Ok(())
    }

    #[test]
    pub fn test_priority_class_estimator_needs_mixed_evidence() -> Result<(), QueueError> {
        let mut value_per_job = HashMap::new();
        value_per_job.insert(Job(0), "gold".to_string());
        value_per_job.insert(Job(1), "gold".to_string());
        let attribute = CategoricalAttribute::new("class", value_per_job);

        let arrivals = ObservationLog::from([(Job(0), 0), (Job(1), 1)]);
        let departures = ObservationLog::from([(Job(0), 5), (Job(1), 8)]);

        let estimated = PriorityClassEstimator.estimate(&arrivals, &departures, 1, &[attribute])?;
        assert!(estimated.is_none());

        Ok(())
    }
}
