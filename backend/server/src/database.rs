//! # Redis
//!
//! Durable store for observations.
//!
//! ## Requirements
//!
//! - Unique, increasing ids even with concurrent submissions
//! - A row is either fully written or not written at all
//! - Cheap listing by rate, highest first
//!
//! ## Implementation
//!
//! - `observations:next_id`: counter, `INCR` hands out ids atomically
//! - `observations`: Redis hash, id to JSON row (`rate` kept as text so `inf` survives)
//! - `observations:by_rate`: sorted set, id scored by rate
//! - Hash and sorted set are written in one `MULTI` block
//! - Listing is `ZREVRANGE` for ids then `HMGET` for the rows
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{
    AsyncCommands, Client, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    observation::{Observation, ObservationData, by_rate},
    store::{ObservationStore, StoreError},
};

pub const NEXT_ID_KEY: &str = "observations:next_id";
pub const ROWS_KEY: &str = "observations";
pub const BY_RATE_KEY: &str = "observations:by_rate";

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

/// Stored form of an [`Observation`].
///
/// JSON has no encoding for infinity, and a tiny `minutes` gives an infinite rate.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Row {
    id: u64,
    name: String,
    meteors: u32,
    minutes: f64,
    rate: String,
    created_at: DateTime<Utc>,
}

impl From<&Observation> for Row {
    fn from(observation: &Observation) -> Self {
        Self {
            id: observation.id,
            name: observation.name.clone(),
            meteors: observation.meteors,
            minutes: observation.minutes,
            rate: observation.rate.to_string(),
            created_at: observation.created_at,
        }
    }
}

impl TryFrom<Row> for Observation {
    type Error = StoreError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let rate = row
            .rate
            .parse::<f64>()
            .map_err(|e| StoreError::Corrupt(format!("row {} rate {:?}: {e}", row.id, row.rate)))?;

        Ok(Self {
            id: row.id,
            name: row.name,
            meteors: row.meteors,
            minutes: row.minutes,
            rate,
            created_at: row.created_at,
        })
    }
}

fn encode_row(observation: &Observation) -> Result<String, StoreError> {
    serde_json::to_string(&Row::from(observation))
        .map_err(|e| StoreError::Corrupt(format!("row {}: {e}", observation.id)))
}

fn decode_row(id: u64, row: &str) -> Result<Observation, StoreError> {
    serde_json::from_str::<Row>(row)
        .map_err(|e| StoreError::Corrupt(format!("row {id}: {e}")))?
        .try_into()
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let connection = init_redis(redis_url).await?;
        info!("Connected to Redis");

        Ok(Self { connection })
    }
}

#[async_trait]
impl ObservationStore for RedisStore {
    async fn find_many_by_rate(&self) -> Result<Vec<Observation>, StoreError> {
        let mut conn = self.connection.clone();

        let ids: Vec<u64> = conn.zrevrange(BY_RATE_KEY, 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(ROWS_KEY)
            .arg(&ids)
            .query_async(&mut conn)
            .await?;

        let mut observations = rows
            .into_iter()
            .zip(&ids)
            .map(|(row, id)| {
                let row = row.ok_or_else(|| StoreError::Corrupt(format!("missing row {id}")))?;
                decode_row(*id, &row)
            })
            .collect::<Result<Vec<_>, _>>()?;

        // sorted sets break score ties by member bytes, not by id
        observations.sort_by(by_rate);

        Ok(observations)
    }

    async fn create(&self, data: ObservationData) -> Result<Observation, StoreError> {
        let mut conn = self.connection.clone();

        let id: u64 = conn.incr(NEXT_ID_KEY, 1).await?;
        let observation = Observation {
            id,
            name: data.name,
            meteors: data.meteors,
            minutes: data.minutes,
            rate: data.rate,
            created_at: Utc::now(),
        };
        let row = encode_row(&observation)?;

        let _result: () = redis::pipe()
            .atomic()
            .hset(ROWS_KEY, id, row)
            .ignore()
            .zadd(BY_RATE_KEY, id, observation.rate)
            .ignore()
            .query_async(&mut conn)
            .await?;

        #[cfg(feature = "verbose")]
        info!("Redis stored observation {id}");

        Ok(observation)
    }
}
