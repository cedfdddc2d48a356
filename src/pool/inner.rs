//! Shared pool state: the idle queue, FIFO acquire/release machinery, and connection-count
//! bookkeeping (spec §4.9).
//!
//! Grounded on the teacher's `pool::inner::SharedPool`: a bounded channel of idle connections
//! plus an atomic size counter, ported from `async-std`'s channel/task primitives to `tokio`'s.
//! The newer `pool::options::PoolOptions` bundled alongside the teacher's `SharedPool` in the
//! same example repo references an incompatible `PoolInner` type it never defines there — an
//! apparent version mismatch in that file — so this module follows `inner.rs` and `mod.rs`,
//! which are mutually consistent, rather than `options.rs`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::sleep;

use crate::connection::MySqlConnection;
use crate::error::Error;
use crate::options::MySqlConnectOptions;
use crate::pool::options::PoolOptions;

/// A connection sitting in the idle queue, plus when it became idle (spec §4.9 idle-timeout,
/// and the ping-interval health check in [`crate::pool::slot`]).
pub(crate) struct IdleConnection {
    pub(crate) conn: MySqlConnection,
    pub(crate) since: Instant,
}

pub(crate) struct SharedPool {
    connect_options: MySqlConnectOptions,
    pool_options: PoolOptions,
    idle_tx: mpsc::Sender<IdleConnection>,
    idle_rx: Mutex<mpsc::Receiver<IdleConnection>>,
    size: AtomicU32,
    closed: AtomicBool,
    closed_notify: Notify,
    last_connect_error: Mutex<Option<Arc<Error>>>,
}

impl SharedPool {
    pub(crate) fn new(connect_options: MySqlConnectOptions, pool_options: PoolOptions) -> Arc<Self> {
        let (idle_tx, idle_rx) = mpsc::channel(pool_options.max_size as usize);
        Arc::new(SharedPool {
            connect_options,
            pool_options,
            idle_tx,
            idle_rx: Mutex::new(idle_rx),
            size: AtomicU32::new(0),
            closed: AtomicBool::new(false),
            closed_notify: Notify::new(),
            last_connect_error: Mutex::new(None),
        })
    }

    pub(crate) fn options(&self) -> &PoolOptions {
        &self.pool_options
    }

    pub(crate) fn connect_options(&self) -> &MySqlConnectOptions {
        &self.connect_options
    }

    pub(crate) fn size(&self) -> u32 {
        self.size.load(Ordering::Acquire)
    }

    pub(crate) fn idle_len(&self) -> usize {
        self.idle_tx.max_capacity() - self.idle_tx.capacity()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn dec_size(&self) {
        self.size.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn idle_rx(&self) -> &Mutex<mpsc::Receiver<IdleConnection>> {
        &self.idle_rx
    }

    /// Opens `initial_size` connections up front and parks them in the idle queue (spec §4.9
    /// `initial-size`).
    pub(crate) async fn prime(&self) -> Result<(), Error> {
        for _ in 0..self.pool_options.initial_size {
            let conn = MySqlConnection::connect(&self.connect_options).await?;
            self.size.fetch_add(1, Ordering::AcqRel);
            let _ = self.idle_tx.try_send(IdleConnection {
                conn,
                since: Instant::now(),
            });
        }
        Ok(())
    }

    /// Hands an idle or freshly-opened connection to a caller, honoring `max_size` and
    /// `connect_timeout` (spec §4.9 `acquire`).
    pub(crate) async fn acquire(&self) -> Result<MySqlConnection, Error> {
        let deadline = Instant::now() + self.pool_options.connect_timeout;

        loop {
            if self.is_closed() {
                return Err(Error::PoolCancelled);
            }

            if let Some(conn) = self.try_take_idle().await {
                return Ok(conn);
            }

            let size = self.size.load(Ordering::Acquire);
            if size < self.pool_options.max_size {
                if self
                    .size
                    .compare_exchange(size, size + 1, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    match self.connect_with_retry(deadline).await {
                        Ok(conn) => return Ok(conn),
                        Err(err) => {
                            self.dec_size();
                            return Err(err);
                        }
                    }
                }
                continue;
            }

            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(self.timeout_error().await);
            };

            let mut idle_rx = self.idle_rx.lock().await;
            tokio::select! {
                biased;

                _ = self.closed_notify.notified() => {
                    return Err(Error::PoolCancelled);
                }
                received = idle_rx.recv() => {
                    let idle = received.expect("SharedPool owns idle_tx for its whole lifetime");
                    drop(idle_rx);
                    match self.accept_idle(idle) {
                        Some(conn) => return Ok(conn),
                        None => {
                            self.dec_size();
                            continue;
                        }
                    }
                }
                _ = sleep(remaining) => {
                    return Err(self.timeout_error().await);
                }
            }
        }
    }

    async fn try_take_idle(&self) -> Option<MySqlConnection> {
        let idle = {
            let mut idle_rx = self.idle_rx.lock().await;
            idle_rx.try_recv().ok()?
        };
        match self.accept_idle(idle) {
            Some(conn) => Some(conn),
            None => {
                self.dec_size();
                None
            }
        }
    }

    /// Rejects an idle connection that's sat longer than `idle_timeout`, closing it so the
    /// caller opens a fresh one in its place (spec §4.9 "slots idle longer than idle-timeout are
    /// recycled").
    fn accept_idle(&self, idle: IdleConnection) -> Option<MySqlConnection> {
        let stale = self
            .pool_options
            .idle_timeout
            .is_some_and(|timeout| idle.since.elapsed() >= timeout);
        if stale {
            tokio::spawn(async move { idle.conn.close().await });
            None
        } else {
            Some(idle.conn)
        }
    }

    async fn connect_with_retry(&self, deadline: Instant) -> Result<MySqlConnection, Error> {
        loop {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(self.timeout_error().await);
            };

            match tokio::time::timeout(remaining, MySqlConnection::connect(&self.connect_options)).await {
                Ok(Ok(conn)) => return Ok(conn),
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "pool: error establishing a connection, retrying");
                    *self.last_connect_error.lock().await = Some(Arc::new(err));
                    let backoff = self
                        .pool_options
                        .retry_interval
                        .min(deadline.saturating_duration_since(Instant::now()));
                    if backoff.is_zero() {
                        return Err(self.timeout_error().await);
                    }
                    sleep(backoff).await;
                }
                Err(_) => return Err(self.timeout_error().await),
            }
        }
    }

    async fn timeout_error(&self) -> Error {
        if let Some(last) = self.last_connect_error.lock().await.as_ref() {
            tracing::warn!(error = %last, "pool: timed out waiting for a connection");
        }
        Error::NoConnectionAvailable
    }

    /// Returns a connection to the pool, closing it instead if the pool has been shut down
    /// (spec §4.9 `release`). `broken` skips straight to close-and-drop for a connection a fatal
    /// error already poisoned. Otherwise, unless `healthy_unchanged` is set, `reset-connection`
    /// runs before the slot rejoins the idle queue (subject to `reset_after_return`).
    pub(crate) async fn release(&self, conn: MySqlConnection, healthy_unchanged: bool, broken: bool) {
        if broken || self.is_closed() {
            conn.close().await;
            self.dec_size();
            return;
        }

        let mut conn = conn;
        if self.pool_options.reset_after_return && !healthy_unchanged {
            if let Err(err) = conn.reset_connection().await {
                tracing::warn!(error = %err, "pool: reset-connection failed on release, dropping connection");
                conn.close().await;
                self.dec_size();
                return;
            }
        }

        self.return_idle(IdleConnection {
            conn,
            since: Instant::now(),
        });
    }

    /// Puts a connection back in the idle queue, or closes it if the queue is unexpectedly full
    /// (it never should be: the channel's capacity is `max_size` and `size` never exceeds that).
    pub(crate) fn return_idle(&self, idle: IdleConnection) {
        if let Err(mpsc::error::TrySendError::Full(idle)) | Err(mpsc::error::TrySendError::Closed(idle)) =
            self.idle_tx.try_send(idle)
        {
            tokio::spawn(async move { idle.conn.close().await });
            self.dec_size();
        }
    }

    /// Shuts the pool down: in-flight acquisitions fail with [`Error::PoolCancelled`], idle
    /// connections are closed immediately, and in-use connections are closed as they're released
    /// (spec §4.9 "pool-wide cancel").
    pub(crate) async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.closed_notify.notify_waiters();

        loop {
            let idle = {
                let mut idle_rx = self.idle_rx.lock().await;
                idle_rx.try_recv().ok()
            };
            match idle {
                Some(idle) => {
                    idle.conn.close().await;
                    self.dec_size();
                }
                None => {
                    if self.size.load(Ordering::Acquire) == 0 {
                        return;
                    }
                    tokio::task::yield_now().await;
                }
            }
        }
    }
}
