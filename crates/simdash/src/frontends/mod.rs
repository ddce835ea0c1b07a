//! Presentation adapters.
//!
//! A frontend renders engine snapshots and forwards user input (typed
//! commands, button presses) back to the engine through an
//! [`EngineHandle`]. Frontends register a factory in [`REGISTRY`]; the
//! binary builds every enabled one from configuration.

#[cfg(feature = "frontend_console")]
mod console;
#[cfg(feature = "frontend_http")]
mod http;

use async_trait::async_trait;
use linkme::distributed_slice;
use tokio::sync::watch;

use crate::config::Config;
use crate::engine::EngineHandle;

/// Result type for frontend factory functions
pub type FrontendFactoryResult = anyhow::Result<Option<Box<dyn Frontend>>>;

pub struct FrontendContext<'a> {
    pub config: &'a Config,
}

#[distributed_slice]
pub static REGISTRY: [fn(&FrontendContext) -> FrontendFactoryResult];

/// Frontend trait that all presentation adapters implement
#[async_trait]
pub trait Frontend: Send {
    /// Get the name/identifier of this frontend
    fn name(&self) -> &str;

    /// Serve until `shutdown` becomes `true` or the frontend's input ends.
    async fn run(
        self: Box<Self>,
        engine: EngineHandle,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()>;
}

/// Build every frontend enabled in `config`.
///
/// A factory that fails is logged and skipped; the others still start.
pub fn from_config(config: &Config) -> Vec<Box<dyn Frontend>> {
    let ctx = FrontendContext { config };
    let mut frontends = Vec::new();
    for constr in REGISTRY {
        match constr(&ctx) {
            Ok(Some(frontend)) => frontends.push(frontend),
            Ok(None) => continue,
            Err(e) => tracing::error!("failed to set up frontend: {:#}", e),
        }
    }
    frontends
}

/// Resolves once `shutdown` is `true` (or its sender is gone).
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
