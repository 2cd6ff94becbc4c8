//! Keeps a byte source connected, reconnecting with back-off after a
//! connect failure or a lost connection, and forwards assembled items
//! to a bounded queue.
//!
//! Grounded on `meter_connection.py`'s `ConnectionManager`: `connect_loop`
//! here is `run`, `_try_connect` is `try_connect`, and the connection-loss
//! circuit breaker (`_update_connection_lost_circuit_breaker`,
//! `_get_back_off_time`) is carried over unchanged in spirit, using
//! `tokio::time::Instant` in place of `datetime.datetime.utcnow()`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

use han_core::HanResult;
use han_transport::ByteSource;

use crate::back_off::{BackOffStrategy, ExponentialBackOff};
use crate::frame_assembler::FrameAssembler;

/// Produces an opened byte source on demand. Implemented once per
/// transport kind (TCP, serial) so the manager stays transport-agnostic.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(&self) -> HanResult<Box<dyn ByteSource>>;
}

const READ_BUFFER_SIZE: usize = 4096;

/// Maintains a connection to a meter, reconnecting on loss.
///
/// `A` is the [`FrameAssembler`] that turns the raw byte stream into
/// the items pushed to `queue` — pass [`crate::frame_assembler::RawHdlcAssembler`],
/// [`crate::frame_assembler::HdlcContentAssembler`] or
/// [`crate::frame_assembler::ModeDAssembler`] depending on what the
/// caller wants delivered.
pub struct ConnectionManager<A: FrameAssembler> {
    factory: Arc<dyn ConnectionFactory>,
    make_assembler: Box<dyn Fn() -> A + Send + Sync>,
    queue: mpsc::Sender<A::Item>,
    closing: Arc<Notify>,
    is_closing: Arc<AtomicBool>,

    back_off_connect_error: Box<dyn BackOffStrategy>,
    connection_lost_back_off_threshold_sec: u64,
    connection_lost_back_off_sleep_sec: u64,
    connection_lost_last_time: Option<Instant>,
    connection_lost_sleep_before_reconnect: bool,
}

impl<A: FrameAssembler + 'static> ConnectionManager<A> {
    pub const DEFAULT_CONNECTION_LOST_BACK_OFF_THRESHOLD_SEC: u64 = 5;
    pub const DEFAULT_CONNECTION_LOST_BACK_OFF_SLEEP_SEC: u64 = 5;

    pub fn new(
        factory: Arc<dyn ConnectionFactory>,
        make_assembler: impl Fn() -> A + Send + Sync + 'static,
        queue: mpsc::Sender<A::Item>,
    ) -> Self {
        Self {
            factory,
            make_assembler: Box::new(make_assembler),
            queue,
            closing: Arc::new(Notify::new()),
            is_closing: Arc::new(AtomicBool::new(false)),
            back_off_connect_error: Box::new(ExponentialBackOff::new()),
            connection_lost_back_off_threshold_sec: Self::DEFAULT_CONNECTION_LOST_BACK_OFF_THRESHOLD_SEC,
            connection_lost_back_off_sleep_sec: Self::DEFAULT_CONNECTION_LOST_BACK_OFF_SLEEP_SEC,
            connection_lost_last_time: None,
            connection_lost_sleep_before_reconnect: false,
        }
    }

    /// Overrides the exponential back-off strategy used for connect
    /// failures, e.g. to cap the maximum delay below the 60s default.
    pub fn with_back_off_connect_error(mut self, back_off: impl BackOffStrategy + 'static) -> Self {
        self.back_off_connect_error = Box::new(back_off);
        self
    }

    /// Overrides the connection-loss circuit breaker's threshold window
    /// and the sleep it imposes when a reconnect happens inside it.
    pub fn with_connection_lost_back_off(mut self, threshold_sec: u64, sleep_sec: u64) -> Self {
        self.connection_lost_back_off_threshold_sec = threshold_sec;
        self.connection_lost_back_off_sleep_sec = sleep_sec;
        self
    }

    /// A handle that can be used to stop [`run`](Self::run) from another task.
    pub fn closer(&self) -> ConnectionCloser {
        ConnectionCloser {
            closing: self.closing.clone(),
            is_closing: self.is_closing.clone(),
        }
    }

    /// Connect, read until the connection is lost, and reconnect with
    /// back-off, until [`ConnectionCloser::close`] is called.
    pub async fn run(&mut self) {
        let closing = self.closing.clone();

        while !self.is_closing.load(Ordering::SeqCst) {
            let source = tokio::select! {
                source = self.try_connect() => source,
                _ = closing.notified() => None,
            };

            if let Some(mut source) = source {
                let mut assembler = (self.make_assembler)();
                let mut buf = [0u8; READ_BUFFER_SIZE];

                let lost = tokio::select! {
                    lost = Self::read_loop(&mut source, &mut assembler, &mut buf, &self.queue) => lost,
                    _ = closing.notified() => false,
                };

                let _ = source.close().await;

                if lost && !self.is_closing.load(Ordering::SeqCst) {
                    log::warn!("connection lost");
                    self.update_connection_lost_circuit_breaker();
                }
            }
        }

        self.is_closing.store(false, Ordering::SeqCst);
        log::info!("connect loop done");
    }

    async fn read_loop(
        source: &mut Box<dyn ByteSource>,
        assembler: &mut A,
        buf: &mut [u8],
        queue: &mpsc::Sender<A::Item>,
    ) -> bool {
        loop {
            match source.read_chunk(buf).await {
                Ok(0) => return true,
                Ok(n) => {
                    for item in assembler.assemble(&buf[..n]) {
                        if queue.send(item).await.is_err() {
                            return false;
                        }
                    }
                }
                Err(e) => {
                    log::warn!("connection lost: {}", e);
                    return true;
                }
            }
        }
    }

    fn update_connection_lost_circuit_breaker(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.connection_lost_last_time {
            let elapsed = now.duration_since(last);
            self.connection_lost_sleep_before_reconnect =
                elapsed < Duration::from_secs(self.connection_lost_back_off_threshold_sec);
        }
        self.connection_lost_last_time = Some(now);
    }

    fn back_off_time(&self) -> Duration {
        let connect_error_delay = self.back_off_connect_error.current_delay_sec();
        if connect_error_delay == 0 && !self.connection_lost_sleep_before_reconnect {
            return Duration::ZERO;
        }

        let reconnect_sleep = if self.connection_lost_sleep_before_reconnect {
            self.connection_lost_back_off_sleep_sec
        } else {
            0
        };
        let delay = connect_error_delay.max(reconnect_sleep);
        log::info!("back-off for {} sec before reconnecting", delay);
        Duration::from_secs(delay)
    }

    async fn try_connect(&mut self) -> Option<Box<dyn ByteSource>> {
        let sleep_time = self.back_off_time();
        if sleep_time > Duration::ZERO {
            tokio::time::sleep(sleep_time).await;
        }

        if self.is_closing.load(Ordering::SeqCst) {
            return None;
        }

        log::debug!("try to connect");
        match self.factory.connect().await {
            Ok(mut source) => match source.open().await {
                Ok(()) => {
                    self.back_off_connect_error.reset();
                    Some(source)
                }
                Err(e) => {
                    self.back_off_connect_error.failure();
                    log::warn!("error connecting: {}", e);
                    None
                }
            },
            Err(e) => {
                self.back_off_connect_error.failure();
                log::warn!("error connecting: {}", e);
                None
            }
        }
    }
}

/// Stops a running [`ConnectionManager::run`] loop from another task.
#[derive(Clone)]
pub struct ConnectionCloser {
    closing: Arc<Notify>,
    is_closing: Arc<AtomicBool>,
}

impl ConnectionCloser {
    pub fn close(&self) {
        self.is_closing.store(true, Ordering::SeqCst);
        self.closing.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_assembler::ModeDAssembler;
    use han_session::mode_d::ModeDReader;
    use std::sync::Mutex;

    struct FailingFactory {
        attempts: Mutex<u32>,
    }

    #[async_trait]
    impl ConnectionFactory for FailingFactory {
        async fn connect(&self) -> HanResult<Box<dyn ByteSource>> {
            *self.attempts.lock().unwrap() += 1;
            Err(han_core::HanError::InvalidData("no meter configured in test".into()))
        }
    }

    #[tokio::test]
    async fn closing_before_any_connect_attempt_returns_immediately() {
        let factory = Arc::new(FailingFactory { attempts: Mutex::new(0) });
        let (tx, _rx) = mpsc::channel(8);
        let mut manager = ConnectionManager::new(factory, || ModeDAssembler::new(ModeDReader::new()), tx);
        let closer = manager.closer();
        closer.close();
        manager.run().await;
    }

    struct FailTwiceThenSucceed {
        attempts: Mutex<u32>,
    }

    #[async_trait]
    impl ConnectionFactory for FailTwiceThenSucceed {
        async fn connect(&self) -> HanResult<Box<dyn ByteSource>> {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            if *attempts <= 2 {
                Err(han_core::HanError::InvalidData("simulated connect failure".into()))
            } else {
                Ok(Box::new(NeverOpensSource))
            }
        }
    }

    struct NeverOpensSource;

    #[async_trait]
    impl ByteSource for NeverOpensSource {
        async fn open(&mut self) -> HanResult<()> {
            Ok(())
        }
        async fn set_timeout(&mut self, _timeout: Option<Duration>) -> HanResult<()> {
            Ok(())
        }
        async fn read_chunk(&mut self, _buf: &mut [u8]) -> HanResult<usize> {
            Ok(0)
        }
        fn is_closed(&self) -> bool {
            false
        }
        async fn close(&mut self) -> HanResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn back_off_delays_double_on_failure_and_reset_on_success() {
        let factory = Arc::new(FailTwiceThenSucceed { attempts: Mutex::new(0) });
        let (tx, _rx) = mpsc::channel(8);
        let mut manager = ConnectionManager::new(factory, || ModeDAssembler::new(ModeDReader::new()), tx);

        let start = Instant::now();
        assert!(manager.try_connect().await.is_none());
        assert_eq!(start.elapsed(), Duration::from_secs(0));

        assert!(manager.try_connect().await.is_none());
        assert_eq!(start.elapsed(), Duration::from_secs(1));

        assert!(manager.try_connect().await.is_some());
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(manager.back_off_connect_error.current_delay_sec(), 0);
    }
}
