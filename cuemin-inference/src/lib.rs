pub mod times;
pub mod utils;
pub mod mdl_service_time;
pub mod mdl_batch_size;
pub mod score;
pub mod servers;
pub mod discipline;
pub mod candidates;
pub mod strategy;
pub mod cuemin;
