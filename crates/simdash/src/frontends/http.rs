use async_trait::async_trait;
use linkme::distributed_slice;
use tokio::sync::watch;
use tracing::info;

use super::Frontend;
use super::FrontendContext;
use super::FrontendFactoryResult;
use super::REGISTRY;
use crate::api;
use crate::engine::EngineHandle;

/// Browser dashboard and JSON API.
pub struct Http {
    listen: String,
    port: u16,
    refresh_ms: u64,
}

#[distributed_slice(REGISTRY)]
fn http_factory(ctx: &FrontendContext) -> FrontendFactoryResult {
    let cfg = &ctx.config.http;
    if !cfg.enabled {
        info!("HTTP frontend is disabled, skipping");
        return Ok(None);
    }
    Ok(Some(Box::new(Http {
        listen: cfg.listen.clone(),
        port: cfg.port,
        refresh_ms: cfg.refresh_ms,
    })))
}

#[async_trait]
impl Frontend for Http {
    fn name(&self) -> &str {
        "http"
    }

    async fn run(
        self: Box<Self>,
        engine: EngineHandle,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        api::serve(&self.listen, self.port, engine, self.refresh_ms, shutdown).await
    }
}
