pub mod environment;
pub mod population;
pub mod arrival;
pub mod waiting_area;
pub mod service_time;
pub mod server;
pub mod exit;
pub mod observer;
pub mod regressor;
pub mod queue;
