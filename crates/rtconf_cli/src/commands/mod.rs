//! CLI command implementations.

pub mod check_config;
pub mod find;
pub mod load;
pub mod translate;

use rtconf_core::{BridgeSettings, ConfFile, CoreResult, RealtimeBridge};
use rtconf_store::{ClientPool, InMemoryPool};
use std::sync::Arc;
use tracing::info;

/// Builds a bridge over `pool`, taking the partition from `settings` when
/// a settings file was given.
pub fn open_bridge(settings: Option<&ConfFile>, pool: InMemoryPool) -> CoreResult<RealtimeBridge> {
    let Some(source) = settings else {
        return Ok(RealtimeBridge::new(Arc::new(pool), None));
    };
    let connector = move |settings: &BridgeSettings| -> CoreResult<Arc<dyn ClientPool>> {
        info!(uri = %settings.uri, "serving the fixture in place of the store");
        Ok(Arc::new(pool.clone()))
    };
    RealtimeBridge::connect(source, &connector)
}
