//! Terminal frontend: commands from stdin, log lines to stdout.

use std::time::Duration;

use async_trait::async_trait;
use linkme::distributed_slice;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::broadcast;
use tokio::sync::watch;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::shutdown_requested;
use super::Frontend;
use super::FrontendContext;
use super::FrontendFactoryResult;
use super::REGISTRY;
use crate::engine::EngineHandle;
use crate::render;

pub struct Console {
    summary_interval: Option<Duration>,
}

#[distributed_slice(REGISTRY)]
fn console_factory(ctx: &FrontendContext) -> FrontendFactoryResult {
    let cfg = &ctx.config.console;
    if !cfg.enabled {
        info!("Console frontend is disabled, skipping");
        return Ok(None);
    }
    let summary_interval =
        (cfg.summary_interval_ms > 0).then(|| Duration::from_millis(cfg.summary_interval_ms));
    Ok(Some(Box::new(Console { summary_interval })))
}

#[async_trait]
impl Frontend for Console {
    fn name(&self) -> &str {
        "console"
    }

    async fn run(
        self: Box<Self>,
        engine: EngineHandle,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let mut feed = engine.subscribe_log();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        let mut summary = self.summary_interval.map(tokio::time::interval);
        let mut input_open = true;

        // Catch up on what was logged before we subscribed; the feed may
        // repeat some of it, so only print sequence numbers not yet shown.
        let mut next_seq = 0;
        for entry in engine.log_since(0).await? {
            write_line(&mut stdout, &entry.event.to_string()).await?;
            next_seq = entry.seq + 1;
        }

        loop {
            tokio::select! {
                line = lines.next_line(), if input_open => match line? {
                    Some(line) => {
                        // Output arrives through the log feed.
                        engine.submit(line).await?;
                    }
                    None => {
                        debug!("stdin closed, console input stopped");
                        input_open = false;
                    }
                },
                entry = feed.recv() => match entry {
                    Ok(entry) if entry.seq >= next_seq => {
                        write_line(&mut stdout, &entry.event.to_string()).await?;
                        next_seq = entry.seq + 1;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("console fell behind, skipped {} log lines", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = tick(&mut summary) => {
                    let line = render::summary_line(&engine.snapshot());
                    write_line(&mut stdout, &line).await?;
                }
                _ = shutdown_requested(&mut shutdown) => break,
            }
        }

        Ok(())
    }
}

/// Next summary tick, or never when summaries are off.
async fn tick(interval: &mut Option<tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
