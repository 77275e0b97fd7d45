use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::observation::{Observation, ObservationData, by_rate};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend failure: {0}")]
    Backend(String),

    #[error("Corrupt observation row: {0}")]
    Corrupt(String),
}

/// Persistence for observations.
///
/// Stores assign `id` and `created_at` and must keep ids unique under concurrent writes.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Every stored observation, highest rate first.
    async fn find_many_by_rate(&self) -> Result<Vec<Observation>, StoreError>;

    async fn create(&self, data: ObservationData) -> Result<Observation, StoreError>;
}

#[derive(Default)]
struct Rows {
    next_id: u64,
    observations: Vec<Observation>,
}

/// In-process store, used when no Redis is configured.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Rows>,
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn find_many_by_rate(&self) -> Result<Vec<Observation>, StoreError> {
        let mut observations = self.rows.lock().await.observations.clone();
        observations.sort_by(by_rate);

        Ok(observations)
    }

    async fn create(&self, data: ObservationData) -> Result<Observation, StoreError> {
        let mut rows = self.rows.lock().await;
        rows.next_id += 1;

        let observation = Observation {
            id: rows.next_id,
            name: data.name,
            meteors: data.meteors,
            minutes: data.minutes,
            rate: data.rate,
            created_at: Utc::now(),
        };
        rows.observations.push(observation.clone());

        Ok(observation)
    }
}
