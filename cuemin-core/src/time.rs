pub type JobId = u32;
pub type Time = i64; // Integer timesteps
pub type Duration = Time;
pub type ServerId = usize;
