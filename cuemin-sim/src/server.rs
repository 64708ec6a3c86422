use cuemin_core::job::Job;

/// Pure per-server state. Service time sampling and batch policy live
/// on the queue, which shares one service time model across servers.
#[derive(PartialEq, Debug, Clone)]
pub struct Server {
    /// The batch currently in service, empty when idle.
    pub in_service: Vec<Job>,
    /// A sampled batch size waiting for enough jobs to accumulate.
    pub pending_batch_size: Option<usize>,
    pub nr_of_served_jobs: usize,
}

impl Server {
    pub fn new() -> Server {
        Server {
            in_service: vec![],
            pending_batch_size: None,
            nr_of_served_jobs: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.in_service.is_empty()
    }
}
