use crate::api::HttpHabitApi;
use crate::config::ClientConfig;
use crate::date_key::{Clock, SystemClock};
use crate::errors::HabitError;
use crate::store::HabitStore;
use std::sync::Arc;
use tracing::info;

pub fn connect(config: &ClientConfig) -> Result<HabitStore<HttpHabitApi>, HabitError> {
    connect_with_clock(config, Arc::new(SystemClock))
}

pub fn connect_with_clock(
    config: &ClientConfig,
    clock: Arc<dyn Clock>,
) -> Result<HabitStore<HttpHabitApi>, HabitError> {
    let api = HttpHabitApi::new(config)?;
    info!(
        base_url = api.base_url(),
        authenticated = config.token.is_some(),
        "habit service configured"
    );
    Ok(HabitStore::new(api, clock))
}
