//! Per-connection change stream
//!
//! One [`FeedHandle`] per connected client. Opening it computes the current
//! version and queues `init`; a spawned task then drives two timers from a
//! single `select!` loop:
//!
//! - poll timer: recompute the version and emit `update`, `heartbeat` or
//!   `error`
//! - keep-alive timer: emit a protocol comment so proxies keep the
//!   connection open
//!
//! The task stops when the receiving side goes away or when the handle is
//! closed. Closing happens in [`FeedHandle::close`], which `Drop` also calls,
//! so a client disconnect (axum drops the response stream and with it the
//! handle) clears both timers.

use lingo_common::{time::now_ms, ChangeEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::version::{Scope, VersionSource};
use super::FeedError;

/// Buffered messages per stream before the poller waits on the client
const CHANNEL_CAPACITY: usize = 16;

/// Timer settings for a change stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub poll_interval: Duration,
    pub keepalive_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(lingo_common::config::DEFAULT_POLL_INTERVAL_MS),
            keepalive_interval: Duration::from_millis(
                lingo_common::config::DEFAULT_KEEPALIVE_INTERVAL_MS,
            ),
        }
    }
}

/// Item produced by a change stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// JSON data event
    Event(ChangeEvent),
    /// Protocol-level keep-alive (SSE comment, not a data event)
    KeepAlive,
}

/// Handle owning one open change stream and its timer task
pub struct FeedHandle {
    scope: Scope,
    rx: mpsc::Receiver<FeedMessage>,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Open a stream for `scope`
    ///
    /// Fails with [`FeedError::ChannelSetup`] when the initial version
    /// cannot be computed; nothing is spawned in that case.
    pub async fn open(
        source: Arc<dyn VersionSource>,
        scope: Scope,
        config: FeedConfig,
    ) -> Result<Self, FeedError> {
        let version = source
            .compute_version(&scope)
            .await
            .map_err(|source| FeedError::ChannelSetup {
                scope: scope.to_string(),
                source,
            })?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tx.try_send(FeedMessage::Event(ChangeEvent::Init {
            version,
            now: now_ms(),
        }))
        .map_err(|e| FeedError::Closed(e.to_string()))?;

        info!("Change stream opened for {} at version {}", scope, version);

        let task = tokio::spawn(run_feed(source, scope.clone(), config, version, tx));

        Ok(Self {
            scope,
            rx,
            task: Some(task),
        })
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Next message, or `None` once the stream is closed and drained
    pub async fn next(&mut self) -> Option<FeedMessage> {
        self.rx.recv().await
    }

    /// Stop both timers and close the channel. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.rx.close();
            info!("Change stream closed for {}", self.scope);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Timer loop for one stream
async fn run_feed(
    source: Arc<dyn VersionSource>,
    scope: Scope,
    config: FeedConfig,
    mut last_version: i64,
    tx: mpsc::Sender<FeedMessage>,
) {
    let start = Instant::now();
    let mut poll = interval_at(start + config.poll_interval, config.poll_interval);
    let mut keepalive = interval_at(start + config.keepalive_interval, config.keepalive_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let message = tokio::select! {
            _ = tx.closed() => break,
            _ = poll.tick() => {
                let event = match source.compute_version(&scope).await {
                    Ok(version) if version != last_version => {
                        last_version = version;
                        ChangeEvent::Update { version, at: now_ms() }
                    }
                    Ok(_) => ChangeEvent::Heartbeat { at: now_ms() },
                    Err(source) => {
                        let failure = FeedError::VersionComputation {
                            scope: scope.to_string(),
                            source,
                        };
                        warn!("{}", failure);
                        ChangeEvent::poll_failed()
                    }
                };
                debug!("Change stream {}: {}", scope, event.event_type());
                FeedMessage::Event(event)
            }
            _ = keepalive.tick() => FeedMessage::KeepAlive,
        };

        if tx.send(message).await.is_err() {
            break;
        }
    }

    debug!("Change stream task for {} finished", scope);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

    /// In-memory version source with a failure switch
    #[derive(Default)]
    struct FakeSource {
        version: AtomicI64,
        fail_next: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn at(version: i64) -> Arc<Self> {
            let source = Self::default();
            source.version.store(version, Ordering::SeqCst);
            Arc::new(source)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VersionSource for FakeSource {
        async fn compute_version(&self, _scope: &Scope) -> lingo_common::Result<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(lingo_common::Error::Internal("storage offline".to_string()));
            }
            Ok(self.version.load(Ordering::SeqCst))
        }
    }

    fn config(poll_secs: u64, keepalive_secs: u64) -> FeedConfig {
        FeedConfig {
            poll_interval: Duration::from_secs(poll_secs),
            keepalive_interval: Duration::from_secs(keepalive_secs),
        }
    }

    async fn open(source: &Arc<FakeSource>, config: FeedConfig) -> FeedHandle {
        FeedHandle::open(source.clone(), Scope::Global, config)
            .await
            .expect("stream should open")
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_is_first_event() {
        let source = FakeSource::at(42);
        let mut handle = open(&source, FeedConfig::default()).await;

        match handle.next().await {
            Some(FeedMessage::Event(ChangeEvent::Init { version, .. })) => assert_eq!(version, 42),
            other => panic!("expected init, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_tick_is_heartbeat() {
        let source = FakeSource::at(42);
        let mut handle = open(&source, config(5, 15)).await;
        handle.next().await;

        let start = Instant::now();
        let message = handle.next().await;
        assert!(matches!(message, Some(FeedMessage::Event(ChangeEvent::Heartbeat { .. }))));
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_emits_exactly_one_update() {
        let source = FakeSource::at(42);
        let mut handle = open(&source, config(5, 15)).await;
        handle.next().await;

        source.version.store(43, Ordering::SeqCst);

        match handle.next().await {
            Some(FeedMessage::Event(ChangeEvent::Update { version, .. })) => assert_eq!(version, 43),
            other => panic!("expected update, got {:?}", other),
        }
        assert!(matches!(
            handle.next().await,
            Some(FeedMessage::Event(ChangeEvent::Heartbeat { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_runs_on_its_own_timer() {
        let source = FakeSource::at(1);
        let mut handle = open(&source, config(10, 3)).await;
        handle.next().await;

        assert_eq!(handle.next().await, Some(FeedMessage::KeepAlive));
        assert_eq!(handle.next().await, Some(FeedMessage::KeepAlive));
        assert_eq!(handle.next().await, Some(FeedMessage::KeepAlive));
        // 9s in, no poll yet
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_tick_reports_error_and_keeps_polling() {
        let source = FakeSource::at(5);
        let mut handle = open(&source, config(5, 60)).await;
        handle.next().await;

        source.fail_next.store(true, Ordering::SeqCst);
        assert_eq!(
            handle.next().await,
            Some(FeedMessage::Event(ChangeEvent::poll_failed()))
        );

        source.version.store(6, Ordering::SeqCst);
        match handle.next().await {
            Some(FeedMessage::Event(ChangeEvent::Update { version, .. })) => assert_eq!(version, 6),
            other => panic!("expected update after recovery, got {:?}", other),
        }
        assert!(!handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_polling() {
        let source = FakeSource::at(1);
        let mut handle = open(&source, config(5, 15)).await;
        handle.next().await;

        handle.close();
        assert!(handle.is_closed());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(handle.next().await, None);

        // second close is a no-op
        handle.close();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let source = FakeSource::at(1);
        let handle = open(&source, config(5, 15)).await;
        drop(handle);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_failure_is_reported() {
        let source = FakeSource::at(1);
        source.fail_next.store(true, Ordering::SeqCst);

        let result = FeedHandle::open(source.clone(), Scope::Course("c1".into()), config(5, 15)).await;
        match result {
            Err(FeedError::ChannelSetup { scope, .. }) => assert_eq!(scope, "course:c1"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("open should fail"),
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), 1);
    }
}
