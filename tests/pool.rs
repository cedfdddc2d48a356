//! Integration tests for [`maristream::MySqlPool`] against a live server, configured via
//! `DATABASE_URL` (mirrors the teacher's `tests/mysql/mysql.rs` pool coverage).

use std::env;
use std::time::Duration;

use maristream::pool::PoolOptions;
use maristream::{MySqlConnectOptions, MySqlPool};

fn connect_options() -> MySqlConnectOptions {
    let url = env::var("DATABASE_URL").expect("DATABASE_URL must be set to run integration tests");
    url.parse().expect("DATABASE_URL must be a valid mysql:// connection string")
}

#[tokio::test]
async fn acquire_and_release_recycles_a_connection() -> anyhow::Result<()> {
    let pool = PoolOptions::new()
        .max_size(1)
        .connect(connect_options())
        .await?;

    {
        let mut conn = pool.acquire().await?;
        conn.ping().await?;
    }

    // the single slot must be back in the idle queue, not leaked, once the guard drops.
    for _ in 0..50 {
        if pool.idle() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(pool.size(), 1);
    assert_eq!(pool.idle(), 1);

    pool.close().await;
    Ok(())
}

#[tokio::test]
async fn acquire_blocks_past_max_size_until_a_slot_is_released() -> anyhow::Result<()> {
    let pool = PoolOptions::new()
        .max_size(1)
        .connect_timeout(Duration::from_secs(5))
        .connect(connect_options())
        .await?;

    let first = pool.acquire().await?;

    let pool2 = pool.clone();
    let waiter = tokio::spawn(async move { pool2.acquire().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished(), "second acquire should block while the only slot is held");

    drop(first);
    let second = waiter.await??;
    assert_eq!(pool.size(), 1, "the released slot should be reused, not duplicated");

    drop(second);
    pool.close().await;
    Ok(())
}

#[tokio::test]
async fn acquire_times_out_when_the_pool_is_exhausted() -> anyhow::Result<()> {
    let pool = PoolOptions::new()
        .max_size(1)
        .connect_timeout(Duration::from_millis(200))
        .connect(connect_options())
        .await?;

    let _held = pool.acquire().await?;
    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(err, maristream::Error::NoConnectionAvailable));

    pool.close().await;
    Ok(())
}

#[tokio::test]
async fn closed_pool_rejects_new_acquisitions() -> anyhow::Result<()> {
    let pool = MySqlPool::connect(connect_options()).await?;
    pool.close().await;

    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(err, maristream::Error::PoolCancelled));

    Ok(())
}

#[tokio::test]
async fn mark_healthy_unchanged_skips_reset_on_release() -> anyhow::Result<()> {
    let pool = PoolOptions::new().max_size(1).connect(connect_options()).await?;

    {
        let mut conn = pool.acquire().await?;
        conn.prepare_statement("SELECT 1").await?;
        conn.mark_healthy_unchanged();
    }

    // give the detached release task a chance to run before the next acquire.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut conn = pool.acquire().await?;
    // a fresh prepare of the same SQL should hit the still-intact statement cache rather than
    // a server-invalidated one, i.e. reset-connection did not run.
    let first = conn.prepare_statement("SELECT 1").await?;
    let second = conn.prepare_statement("SELECT 1").await?;
    assert_eq!(first.id(), second.id());

    pool.close().await;
    Ok(())
}
