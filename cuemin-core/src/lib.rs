pub mod time;
pub mod job;
pub mod observation;
pub mod mdl;
pub mod math;
pub mod distribution;
