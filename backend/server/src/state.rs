use std::sync::Arc;

use tracing::info;

use super::{
    config::Config,
    database::RedisStore,
    error::StartupError,
    observation::ObservationService,
    store::{MemoryStore, ObservationStore},
};

pub struct State {
    pub config: Config,
    pub observations: ObservationService,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, StartupError> {
        let config = Config::load()?;

        let store: Arc<dyn ObservationStore> = match &config.redis_url {
            Some(redis_url) => Arc::new(RedisStore::connect(redis_url).await?),
            None => {
                info!("Using in-memory store");
                Arc::new(MemoryStore::default())
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn ObservationStore>) -> Arc<Self> {
        Arc::new(Self {
            config,
            observations: ObservationService::new(store),
        })
    }
}
