use std::collections::HashMap;
use std::path::Path;

use serde::{Serialize, Deserialize};
use serde_yaml;

use crate::job::Job;
use crate::time::*;

/// One observed event: a job crossing the measurement point at an instant.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub job: Job,
    pub instant: Time,
}

impl Observation {
    pub fn new(job: Job, instant: Time) -> Self {
        Observation { job, instant }
    }
}

/// A time-ordered log of observations, either arrivals or departures.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ObservationLog {
    observations: Vec<Observation>,
}

#[derive(Debug)]
pub enum ObservationError {
    Monotonicity { pos: usize, prev: Observation, event: Observation },
    IO(std::io::Error),
    YAMLParsing(serde_yaml::Error),
}

impl ObservationLog {
    pub fn new() -> ObservationLog {
        ObservationLog { observations: vec![] }
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn push(&mut self, o: Observation) -> Result<(), ObservationError> {
        if let Some(prev) = self.observations.last() {
            if prev.instant > o.instant {
                let pos = self.observations.len();
                return Err(ObservationError::Monotonicity { pos, prev: *prev, event: o });
            }
        }

        self.observations.push(o);

        Ok(())
    }

    /// Timestamp of the last observation, if any.
    pub fn last_instant(&self) -> Option<Time> {
        self.observations.last().map(|o| o.instant)
    }

    /// One entry per job. A job observed twice keeps its first instant.
    pub fn instant_per_job(&self) -> HashMap<Job, Time> {
        let mut map = HashMap::new();
        for o in self.observations.iter() {
            map.entry(o.job).or_insert(o.instant);
        }
        map
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.observations.iter().map(|o| &o.job)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<ObservationLog, ObservationError> {
        let mut ret = ObservationLog::new();

        let f = std::fs::read_to_string(path);

        match f {
            Err(e) => return Err(ObservationError::IO(e)),
            Ok(s) => {
                match serde_yaml::from_str::<Vec<Observation>>(s.as_str()) {
                    Err(e) => return Err(ObservationError::YAMLParsing(e)),
                    Ok(v) => {
                        for observation in v {
                            ret.push(observation)?;
                        }
                    }
                }
            }
        }

        return Ok(ret)
    }
}

impl<T> From<T> for ObservationLog
where T: AsRef<[(Job, Time)]>
{
    fn from(pairs: T) -> Self {
        ObservationLog {
            observations: pairs.as_ref()
                               .iter()
                               .map(|(job, instant)| Observation::new(*job, *instant))
                               .collect()
        }
    }
}
