//! Shared state of the HTTP front-end.

use crate::config::ConversionConfig;
use crate::output::BatchOutput;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Conversion settings; `include_summary` may be overridden per request.
    pub config: ConversionConfig,
    /// Finished batches waiting to be downloaded.
    pub jobs: Arc<JobStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("jobs", &"Arc<JobStore>")
            .finish()
    }
}

impl AppState {
    pub fn new(config: ConversionConfig, max_retained_jobs: usize) -> Self {
        Self {
            config,
            jobs: Arc::new(JobStore::new(max_retained_jobs)),
        }
    }
}

/// Bounded in-memory store of finished batches, keyed by job id.
///
/// Once `capacity` jobs are held, inserting evicts the oldest one.
#[derive(Debug)]
pub struct JobStore {
    capacity: usize,
    jobs: Mutex<VecDeque<(String, Arc<BatchOutput>)>>,
}

impl JobStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            jobs: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Store `output` under a fresh id and return the id.
    pub async fn insert(&self, output: Arc<BatchOutput>) -> String {
        let id = Uuid::new_v4().to_string();
        let mut jobs = self.jobs.lock().await;
        while jobs.len() >= self.capacity {
            if let Some((old, _)) = jobs.pop_front() {
                debug!("evicting job {}", old);
            }
        }
        jobs.push_back((id.clone(), output));
        id
    }

    pub async fn get(&self, id: &str) -> Option<Arc<BatchOutput>> {
        let jobs = self.jobs.lock().await;
        jobs.iter()
            .find(|(job_id, _)| job_id == id)
            .map(|(_, output)| Arc::clone(output))
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
