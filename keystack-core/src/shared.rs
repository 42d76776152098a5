//! Process-wide shared core engine
//!
//! The engine is constructed lazily on first use and lives until process
//! exit. Concurrent first callers wait on a single construction attempt. A
//! failed construction is not cached: the next caller tries again.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::engine::Core;
use crate::error::CoreError;
use crate::http::HttpCore;
use crate::settings::CoreSettings;

static SHARED_CORE: OnceCell<Arc<dyn Core>> = OnceCell::const_new();

/// Get the shared core engine, constructing it on first use
pub async fn shared_core() -> Result<Arc<dyn Core>, CoreError> {
    let core = SHARED_CORE
        .get_or_try_init(|| async {
            let settings = CoreSettings::load()?;
            let core = HttpCore::connect(&settings).await?;
            info!(endpoint = %core.base_url(), "shared core engine ready");
            Ok::<_, CoreError>(Arc::new(core) as Arc<dyn Core>)
        })
        .await?;

    Ok(Arc::clone(core))
}

/// Publish a custom engine as the shared core
///
/// Fails if an engine has already been published or constructed.
pub fn install_shared_core(core: Arc<dyn Core>) -> Result<(), CoreError> {
    SHARED_CORE
        .set(core)
        .map_err(|_| CoreError::AlreadyInitialized)
}
