use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use cuemin_core::time::*;

/// Events are executed in (time, priority, insertion order). Completions
/// get the lower priority number so a server frees before a same-instant
/// arrival is handled.
pub const PRIORITY_COMPLETION: u8 = 0;
pub const PRIORITY_ARRIVAL: u8 = 1;

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum SimEvent {
    Arrival,
    ServiceCompletion { server: ServerId },
}

#[derive(Debug)]
pub enum SimulationError {
    ScheduleInPast { now: Time, requested: Time },
}

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
struct Scheduled {
    time: Time,
    priority: u8,
    seq: u64,
    event: SimEvent,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, self.priority, self.seq).cmp(&(other.time, other.priority, other.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Discrete-event clock and schedule.
#[derive(Debug)]
pub struct Environment {
    now: Time,
    schedule: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            now: 0,
            schedule: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn now(&self) -> Time {
        self.now
    }

    pub fn has_pending_events(&self) -> bool {
        !self.schedule.is_empty()
    }

    pub fn peek_next_instant(&self) -> Option<Time> {
        self.schedule.peek().map(|Reverse(s)| s.time)
    }

    pub fn schedule_at(&mut self, time: Time, priority: u8, event: SimEvent) -> Result<(), SimulationError> {
        if time < self.now {
            return Err(SimulationError::ScheduleInPast { now: self.now, requested: time });
        }

        self.schedule.push(Reverse(Scheduled {
            time,
            priority,
            seq: self.next_seq,
            event,
        }));
        self.next_seq += 1;

        Ok(())
    }

    /// Removes the next event and advances the clock to it.
    pub fn pop_next_event(&mut self) -> Option<SimEvent> {
        self.schedule.pop().map(|Reverse(s)| {
            self.now = s.time;
            s.event
        })
    }

    pub fn run_until_event_queue_is_empty<E, F>(&mut self, mut handler: F) -> Result<(), E>
    where F: FnMut(&mut Environment, SimEvent) -> Result<(), E>
    {
        while let Some(event) = self.pop_next_event() {
            handler(self, event)?;
        }
        Ok(())
    }

    /// Executes all events within the next `timesteps` timesteps and
    /// leaves the clock at the horizon.
    pub fn run_timesteps<E, F>(&mut self, timesteps: Duration, mut handler: F) -> Result<(), E>
    where F: FnMut(&mut Environment, SimEvent) -> Result<(), E>
    {
        let horizon = self.now + timesteps;

        while let Some(next) = self.peek_next_instant() {
            if next > horizon {
                break;
            }
            if let Some(event) = self.pop_next_event() {
                handler(self, event)?;
            }
        }

        if self.now < horizon {
            self.now = horizon;
        }

        Ok(())
    }

    /// Executes events until the predicate holds, checked before each
    /// event, or until the schedule runs dry.
    pub fn run_until<E, F, P>(&mut self, mut predicate: P, mut handler: F) -> Result<(), E>
    where
        P: FnMut(&Environment) -> bool,
        F: FnMut(&mut Environment, SimEvent) -> Result<(), E>,
    {
        while !predicate(self) {
            match self.pop_next_event() {
                Some(event) => handler(self, event)?,
                None => break,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_events_are_ordered_by_time_priority_insertion() -> Result<(), SimulationError> {
        let mut env = Environment::new();

        env.schedule_at(5, PRIORITY_ARRIVAL, SimEvent::Arrival)?;
        env.schedule_at(5, PRIORITY_COMPLETION, SimEvent::ServiceCompletion { server: 0 })?;
        env.schedule_at(3, PRIORITY_ARRIVAL, SimEvent::Arrival)?;
        env.schedule_at(5, PRIORITY_COMPLETION, SimEvent::ServiceCompletion { server: 1 })?;

        assert_eq!(env.pop_next_event(), Some(SimEvent::Arrival));
        assert_eq!(env.now(), 3);
        assert_eq!(env.pop_next_event(), Some(SimEvent::ServiceCompletion { server: 0 }));
        assert_eq!(env.pop_next_event(), Some(SimEvent::ServiceCompletion { server: 1 }));
        assert_eq!(env.pop_next_event(), Some(SimEvent::Arrival));
        assert_eq!(env.now(), 5);
        assert_eq!(env.pop_next_event(), None);

        Ok(())
    }

    #[test]
    pub fn test_scheduling_in_the_past_is_rejected() {
        let mut env = Environment::new();

        env.schedule_at(10, PRIORITY_ARRIVAL, SimEvent::Arrival).unwrap();
        assert_eq!(env.pop_next_event(), Some(SimEvent::Arrival));

        assert!(env.schedule_at(9, PRIORITY_ARRIVAL, SimEvent::Arrival).is_err());
        assert!(env.schedule_at(10, PRIORITY_ARRIVAL, SimEvent::Arrival).is_ok());
    }

    #[test]
    pub fn test_run_timesteps_stops_at_the_horizon() -> Result<(), SimulationError> {
        let mut env = Environment::new();
        env.schedule_at(4, PRIORITY_ARRIVAL, SimEvent::Arrival)?;
        env.schedule_at(8, PRIORITY_ARRIVAL, SimEvent::Arrival)?;

        let mut seen = 0;
        env.run_timesteps(5, |_, _| -> Result<(), SimulationError> {
            seen += 1;
            Ok(())
        })?;

        assert_eq!(seen, 1);
        assert_eq!(env.now(), 5);
        assert!(env.has_pending_events());

        Ok(())
    }

    #[test]
    pub fn test_run_until_checks_the_predicate_before_each_event() -> Result<(), SimulationError> {
        let mut env = Environment::new();
        env.schedule_at(1, PRIORITY_ARRIVAL, SimEvent::Arrival)?;
        env.schedule_at(2, PRIORITY_ARRIVAL, SimEvent::Arrival)?;
        env.schedule_at(3, PRIORITY_ARRIVAL, SimEvent::Arrival)?;

        let mut seen = 0;
        env.run_until(|env| env.now() >= 2, |_, _| -> Result<(), SimulationError> {
            seen += 1;
            Ok(())
        })?;

        assert_eq!(seen, 2);
        assert_eq!(env.now(), 2);

        Ok(())
    }
}
