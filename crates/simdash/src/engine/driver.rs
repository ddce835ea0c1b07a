//! Runs an [`Engine`] on its own task.
//!
//! The task is the only owner of the engine, so ticks and frontend requests
//! are applied one at a time and never interleave. Frontends talk to it
//! through a cloneable [`EngineHandle`].

use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::info;

use super::engine::Engine;
use super::error::EngineError;
use super::event::LogEntry;
use super::event::LogEvent;
use super::intent::Intent;
use super::state::State;

/// Capacity for the frontend→engine request channel
const REQUEST_CHANNEL_SIZE: usize = 256;

/// Capacity of the live log feed; slow subscribers skip lines rather than
/// hold the engine back.
const LOG_FEED_SIZE: usize = 1024;

enum Request {
    Submit {
        line: String,
        reply: oneshot::Sender<Vec<LogEvent>>,
    },
    Apply {
        intent: Intent,
        reply: oneshot::Sender<Vec<LogEvent>>,
    },
    Log {
        since: u64,
        reply: oneshot::Sender<Vec<LogEntry>>,
    },
}

/// Cloneable access to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<Arc<State>>,
    log_feed: broadcast::Sender<LogEntry>,
}

impl EngineHandle {
    /// Submit a typed command line; returns the log lines it produced.
    pub async fn submit(&self, line: impl Into<String>) -> Result<Vec<LogEvent>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Submit {
                line: line.into(),
                reply,
            })
            .await?;
        Ok(rx.await?)
    }

    /// Apply a dashboard intent; returns the log lines it produced.
    pub async fn apply(&self, intent: Intent) -> Result<Vec<LogEvent>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.requests.send(Request::Apply { intent, reply }).await?;
        Ok(rx.await?)
    }

    /// Retained log entries with sequence number `>= since`.
    pub async fn log_since(&self, since: u64) -> Result<Vec<LogEntry>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.requests.send(Request::Log { since, reply }).await?;
        Ok(rx.await?)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> Arc<State> {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified whenever a new snapshot is published.
    pub fn watch(&self) -> watch::Receiver<Arc<State>> {
        self.snapshots.clone()
    }

    /// Live feed of every log entry written after subscribing.
    pub fn subscribe_log(&self) -> broadcast::Receiver<LogEntry> {
        self.log_feed.subscribe()
    }
}

/// Spawn `engine` on a task ticking every `tick`.
///
/// The task stops once `shutdown` becomes `true` or every handle is dropped.
pub fn spawn(
    engine: Engine,
    tick: Duration,
    shutdown: watch::Receiver<bool>,
) -> (EngineHandle, JoinHandle<Engine>) {
    let (requests, request_rx) = mpsc::channel(REQUEST_CHANNEL_SIZE);
    let (snapshot_tx, snapshots) = watch::channel(engine.snapshot());
    let (log_feed, _) = broadcast::channel(LOG_FEED_SIZE);

    let handle = EngineHandle {
        requests,
        snapshots,
        log_feed: log_feed.clone(),
    };

    let task = tokio::spawn(run(engine, tick, request_rx, snapshot_tx, log_feed, shutdown));
    (handle, task)
}

async fn run(
    mut engine: Engine,
    tick: Duration,
    mut requests: mpsc::Receiver<Request>,
    snapshots: watch::Sender<Arc<State>>,
    log_feed: broadcast::Sender<LogEntry>,
    mut shutdown: watch::Receiver<bool>,
) -> Engine {
    info!("Engine starting, tick period {:?}", tick);

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Lines already in the log book (the ready banner) go out first.
    let mut published = publish_log(&engine, &log_feed, 0);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                engine.tick(now_ms());
            }
            request = requests.recv() => {
                let Some(request) = request else {
                    debug!("All engine handles dropped");
                    break;
                };
                let reply = handle_request(&mut engine, request);
                snapshots.send_replace(engine.snapshot());
                published = publish_log(&engine, &log_feed, published);
                reply();
                continue;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        snapshots.send_replace(engine.snapshot());
        published = publish_log(&engine, &log_feed, published);
    }

    info!("Engine shutting down");
    engine
}

/// Apply a request and return its reply, to be sent once the resulting
/// snapshot has been published.
fn handle_request(engine: &mut Engine, request: Request) -> Box<dyn FnOnce()> {
    // A dropped reply receiver just means the caller lost interest.
    match request {
        Request::Submit { line, reply } => {
            let events = engine.submit(&line);
            Box::new(move || {
                let _ = reply.send(events);
            })
        }
        Request::Apply { intent, reply } => {
            let events = engine.apply(intent);
            Box::new(move || {
                let _ = reply.send(events);
            })
        }
        Request::Log { since, reply } => {
            let entries = engine.log_since(since);
            Box::new(move || {
                let _ = reply.send(entries);
            })
        }
    }
}

/// Broadcast log entries from `from` onwards; returns the next unpublished
/// sequence number.
fn publish_log(engine: &Engine, feed: &broadcast::Sender<LogEntry>, from: u64) -> u64 {
    for entry in engine.log_since(from) {
        // No subscribers is fine.
        let _ = feed.send(entry);
    }
    engine.log().next_seq()
}

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::engine::device::DeviceId;
    use crate::engine::event::Severity;

    fn start(tick: Duration) -> (EngineHandle, JoinHandle<Engine>, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let engine = Engine::new(StdRng::seed_from_u64(4));
        let (handle, task) = spawn(engine, tick, shutdown_rx);
        (handle, task, shutdown_tx)
    }

    #[tokio::test]
    async fn test_submit_round_trip() {
        let (handle, task, shutdown) = start(Duration::from_secs(3600));

        let events = handle.submit("set factory.robot start").await.unwrap();
        assert_eq!(events[1].severity, Severity::Ok);
        assert!(handle.snapshot().factory.robot);

        shutdown.send(true).unwrap();
        let engine = task.await.unwrap();
        assert!(engine.state().factory.robot);
    }

    #[tokio::test]
    async fn test_apply_and_log() {
        let (handle, task, shutdown) = start(Duration::from_secs(3600));
        let mut feed = handle.subscribe_log();

        handle.apply(Intent::Toggle(DeviceId::HomeLight)).await.unwrap();
        handle.apply(Intent::CoolingBoost).await.unwrap();

        let entry = feed.recv().await.unwrap();
        assert_eq!(entry.event.message, "Cooling boost applied");

        let log = handle.log_since(0).await.unwrap();
        assert_eq!(log.len(), 1);
        assert!(handle.snapshot().home.light);

        shutdown.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_ticks_advance_state() {
        let (handle, task, shutdown) = start(Duration::from_millis(5));
        let initial = handle.snapshot();

        let mut snapshots = handle.watch();
        snapshots
            .wait_for(|state| state.factory.temperature != initial.factory.temperature
                || state.city.aqi != initial.city.aqi
                || state.home.energy_history != initial.home.energy_history)
            .await
            .unwrap();

        shutdown.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_errors_after_shutdown() {
        let (handle, task, shutdown) = start(Duration::from_secs(3600));
        shutdown.send(true).unwrap();
        task.await.unwrap();

        assert!(matches!(handle.submit("status").await, Err(EngineError::Stopped)));
    }
}
