//! Integration tests against a live MySQL/MariaDB server, configured via `DATABASE_URL`
//! (mirrors the teacher's `tests/mysql/mysql.rs` shape).

use std::env;

use maristream::{MySqlConnectOptions, MySqlConnection};

fn connect_options() -> MySqlConnectOptions {
    let url = env::var("DATABASE_URL").expect("DATABASE_URL must be set to run integration tests");
    url.parse().expect("DATABASE_URL must be a valid mysql:// connection string")
}

#[tokio::test]
async fn it_connects_and_pings() -> anyhow::Result<()> {
    let mut conn = MySqlConnection::connect(&connect_options()).await?;

    conn.ping().await?;
    conn.close().await;

    Ok(())
}

#[tokio::test]
async fn it_runs_a_simple_query() -> anyhow::Result<()> {
    use maristream::connection::ExecutionHead;

    let mut conn = MySqlConnection::connect(&connect_options()).await?;

    match conn.start_execution("SELECT 1 + 1").await? {
        ExecutionHead::ResultSet(columns) => {
            let batch = conn
                .read_some_rows(&columns, maristream::connection::RowEncoding::Text, None)
                .await?;
            assert_eq!(batch.rows.len(), 1);
            let value: i64 = batch.rows[0].try_get(0)?;
            assert_eq!(value, 2);
        }
        ExecutionHead::NoResultSet(_) => panic!("SELECT 1 + 1 should produce a resultset"),
    }

    conn.close().await;
    Ok(())
}

#[tokio::test]
async fn prepared_statements_round_trip_through_the_cache() -> anyhow::Result<()> {
    let mut conn = MySqlConnection::connect(&connect_options()).await?;

    let first = conn.prepare_statement("SELECT ? + 1").await?;
    let second = conn.prepare_statement("SELECT ? + 1").await?;
    assert_eq!(first.id(), second.id(), "identical SQL should hit the statement cache");

    conn.close().await;
    Ok(())
}

#[tokio::test]
async fn reset_connection_clears_the_statement_cache() -> anyhow::Result<()> {
    let mut conn = MySqlConnection::connect(&connect_options()).await?;

    let before = conn.prepare_statement("SELECT 1").await?;
    conn.reset_connection().await?;
    let after = conn.prepare_statement("SELECT 1").await?;
    assert_ne!(
        before.id(),
        after.id(),
        "reset-connection invalidates every prior statement handle"
    );

    conn.close().await;
    Ok(())
}

#[tokio::test]
async fn set_character_set_updates_cached_session_state() -> anyhow::Result<()> {
    use maristream::CharacterSet;

    let mut conn = MySqlConnection::connect(&connect_options()).await?;

    conn.set_character_set(CharacterSet::default()).await?;
    assert_eq!(conn.character_set()?, CharacterSet::default());

    conn.close().await;
    Ok(())
}

#[tokio::test]
async fn busy_connection_rejects_a_second_operation() -> anyhow::Result<()> {
    // start_execution leaves the connection `Busy` until its resultset/summary is drained;
    // issuing a second command before that happens must fail without touching the wire
    // (spec §4.8).
    let mut conn = MySqlConnection::connect(&connect_options()).await?;

    let _ = conn.start_execution("SELECT 1").await?;
    let err = conn.ping().await.unwrap_err();
    assert!(matches!(err, maristream::Error::OperationInProgress));

    Ok(())
}
