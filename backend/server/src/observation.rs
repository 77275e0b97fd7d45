//! # Observations
//!
//! A single meteor count over a watch period, ranked by hourly rate.
//!
//! ## Rate
//! `rate = (meteors / minutes) * 60`, computed once when the observation is created and never
//! recomputed afterwards. Callers cannot supply it.
//!
//! A tiny `minutes` can push the rate to infinity. Such an observation tops the leaderboard and its
//! `rate` is rendered as JSON `null`, the same as `JSON.stringify(Infinity)`.
//!
//! ## Ordering
//! Listings are sorted by rate, highest first. Equal rates keep submission order (lower `id` first)
//! so the leaderboard is stable no matter which store backs it.
use std::{cmp::Ordering, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::store::{ObservationStore, StoreError};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: u64,
    pub name: String,
    pub meteors: u32,
    pub minutes: f64,
    pub rate: f64,
    pub created_at: DateTime<Utc>,
}

/// Validated submission, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    pub name: String,
    pub meteors: u32,
    pub minutes: f64,
}

/// What gets handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationData {
    pub name: String,
    pub meteors: u32,
    pub minutes: f64,
    pub rate: f64,
}

impl From<NewObservation> for ObservationData {
    fn from(record: NewObservation) -> Self {
        let rate = hourly_rate(record.meteors, record.minutes);

        Self {
            name: record.name,
            meteors: record.meteors,
            minutes: record.minutes,
            rate,
        }
    }
}

/// Page data for the leaderboard view.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Leaderboard {
    pub observations: Vec<Observation>,
    pub error: bool,
}

pub fn hourly_rate(meteors: u32, minutes: f64) -> f64 {
    (f64::from(meteors) / minutes) * 60.0
}

/// Rate descending, then id ascending.
pub fn by_rate(a: &Observation, b: &Observation) -> Ordering {
    b.rate.total_cmp(&a.rate).then(a.id.cmp(&b.id))
}

#[derive(Clone)]
pub struct ObservationService {
    store: Arc<dyn ObservationStore>,
}

impl ObservationService {
    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, record: NewObservation) -> Result<Observation, StoreError> {
        let data = ObservationData::from(record);

        let created = self.store.create(data).await?;
        info!(
            "Stored observation {} from {} at {:.2}/h",
            created.id, created.name, created.rate
        );

        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<Observation>, StoreError> {
        let mut observations = self.store.find_many_by_rate().await?;
        observations.sort_by(by_rate);

        Ok(observations)
    }

    /// Like [`Self::list`], but a store failure yields an empty board flagged with `error`.
    pub async fn leaderboard(&self) -> Leaderboard {
        match self.list().await {
            Ok(observations) => Leaderboard {
                observations,
                error: false,
            },
            Err(e) => {
                warn!("Failed to load leaderboard: {e}");

                Leaderboard {
                    observations: Vec::new(),
                    error: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::store::MemoryStore;

    struct BrokenStore;

    #[async_trait]
    impl ObservationStore for BrokenStore {
        async fn find_many_by_rate(&self) -> Result<Vec<Observation>, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn create(&self, _data: ObservationData) -> Result<Observation, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    fn service() -> ObservationService {
        ObservationService::new(Arc::new(MemoryStore::default()))
    }

    fn record(name: &str, meteors: u32, minutes: f64) -> NewObservation {
        NewObservation {
            name: name.to_string(),
            meteors,
            minutes,
        }
    }

    #[test]
    fn test_hourly_rate() {
        assert_eq!(hourly_rate(30, 60.0), 30.0);
        assert_eq!(hourly_rate(12, 30.0), 24.0);
        assert_eq!(hourly_rate(0, 15.0), 0.0);
        assert!((hourly_rate(7, 13.0) - 7.0 / 13.0 * 60.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_create_computes_rate() {
        let service = service();

        let created = service.create(record("Alice", 30, 60.0)).await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.name, "Alice");
        assert_eq!(created.meteors, 30);
        assert_eq!(created.minutes, 60.0);
        assert_eq!(created.rate, 30.0);
    }

    #[tokio::test]
    async fn test_create_does_not_deduplicate() {
        let service = service();

        let first = service.create(record("Alice", 1, 1.0)).await.unwrap();
        let second = service.create(record("Alice", 1, 1.0)).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_orders_by_rate_then_id() {
        let service = service();

        service.create(record("slow", 5, 60.0)).await.unwrap();
        service.create(record("fast", 50, 30.0)).await.unwrap();
        service.create(record("tie-a", 10, 60.0)).await.unwrap();
        service.create(record("tie-b", 20, 120.0)).await.unwrap();

        let names: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();

        assert_eq!(names, ["fast", "tie-a", "tie-b", "slow"]);
    }

    #[tokio::test]
    async fn test_list_is_non_increasing() {
        let service = service();

        for (meteors, minutes) in [(3, 7.0), (100, 240.0), (0, 1.0), (500, 0.5), (42, 42.0)] {
            service.create(record("x", meteors, minutes)).await.unwrap();
        }

        let rates: Vec<f64> = service.list().await.unwrap().iter().map(|o| o.rate).collect();
        assert!(rates.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let service = ObservationService::new(Arc::new(BrokenStore));

        assert!(matches!(
            service.create(record("Alice", 1, 1.0)).await,
            Err(StoreError::Backend(_))
        ));
        assert!(service.list().await.is_err());
    }

    #[tokio::test]
    async fn test_leaderboard_degrades_on_failure() {
        let board = ObservationService::new(Arc::new(BrokenStore))
            .leaderboard()
            .await;

        assert!(board.error);
        assert!(board.observations.is_empty());
    }

    #[tokio::test]
    async fn test_leaderboard() {
        let service = service();
        service.create(record("Dee", 12, 30.0)).await.unwrap();

        let board = service.leaderboard().await;

        assert!(!board.error);
        assert_eq!(board.observations.len(), 1);
        assert_eq!(board.observations[0].rate, 24.0);
    }
}
