//! The idle queue's background health check and idle-timeout reaper (spec §4.9 Health: "A
//! dedicated task per idle slot waits for ping-interval and issues a ping; on failure the slot
//! reconnects. Slots idle longer than idle-timeout are recycled.").
//!
//! Idle connections here pass through a shared channel with no fixed slot identity, so rather
//! than one task per physical slot, a single task periodically drains every currently-idle
//! connection, pings or reaps each as appropriate, then returns survivors to the queue.
//! Externally this is indistinguishable from a per-slot timer: every idle connection still gets
//! pinged on `ping_interval` and reaped after `idle_timeout`. Grounded on the teacher's
//! `pool::inner::conn_reaper`, which runs the same kind of periodic drain-and-partition sweep
//! over its idle channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;

use crate::connection::MySqlConnection;
use crate::pool::inner::{IdleConnection, SharedPool};

pub(crate) fn spawn_reaper(pool: Arc<SharedPool>) {
    let Some(period) = reap_period(&pool) else {
        return;
    };

    tokio::spawn(async move {
        loop {
            sleep(period).await;
            if pool.is_closed() {
                return;
            }
            reap_once(&pool).await;
        }
    });
}

fn reap_period(pool: &SharedPool) -> Option<Duration> {
    match (pool.options().ping_interval, pool.options().idle_timeout) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

async fn reap_once(pool: &SharedPool) {
    let mut drained = Vec::new();
    {
        let mut idle_rx = pool.idle_rx().lock().await;
        while let Ok(idle) = idle_rx.try_recv() {
            drained.push(idle);
        }
    }

    for idle in drained {
        if pool.is_closed() {
            idle.conn.close().await;
            pool.dec_size();
            continue;
        }

        if let Some(idle_timeout) = pool.options().idle_timeout {
            if idle.since.elapsed() >= idle_timeout {
                idle.conn.close().await;
                pool.dec_size();
                continue;
            }
        }

        let needs_ping = pool
            .options()
            .ping_interval
            .is_some_and(|interval| idle.since.elapsed() >= interval);

        let conn = if needs_ping {
            match ping_or_reconnect(pool, idle.conn).await {
                Some(conn) => conn,
                None => continue,
            }
        } else {
            idle.conn
        };

        pool.return_idle(IdleConnection {
            conn,
            since: Instant::now(),
        });
    }
}

async fn ping_or_reconnect(pool: &SharedPool, mut conn: MySqlConnection) -> Option<MySqlConnection> {
    if let Err(err) = conn.ping().await {
        tracing::info!(error = %err, "pool: ping on idle connection failed, reconnecting");
        conn.close().await;
        match MySqlConnection::connect(pool.connect_options()).await {
            Ok(fresh) => Some(fresh),
            Err(err) => {
                tracing::warn!(error = %err, "pool: reconnect after failed ping failed, dropping slot");
                pool.dec_size();
                None
            }
        }
    } else {
        Some(conn)
    }
}
