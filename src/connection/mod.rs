//! Public façade over the session and execution engines (spec §4.8 Connection façade).
//!
//! Grounded on the teacher's `mysql/connection/mod.rs`: a single `MySqlConnection` struct owning
//! the stream, a scratch row-columns cache, and a statement cache, exposing one async method per
//! wire operation and refusing to start a new one while a prior reply is still outstanding.

pub mod establish;
pub mod executor;
pub mod pipeline;
pub mod session;
mod stmt_cache;
pub mod stream;
pub mod tls;

use std::sync::Arc;

use crate::charset::CharacterSet;
use crate::error::Error;
use crate::options::MySqlConnectOptions;
use crate::protocol::column::{ColumnDefinition, MetadataMode};
use crate::protocol::ServerStatus;
use crate::statement::MySqlStatement;
use crate::value::MySqlValue;

pub use executor::{ExecutionHead, RowBatch, RowEncoding};
pub use pipeline::{PipelineStage, QueryOutcome, StageOutcome};

use stmt_cache::StatementCache;
use stream::{Busy, MySqlStream};

/// One live MySQL/MariaDB connection (spec §3 Session state, §4.8).
pub struct MySqlConnection {
    stream: MySqlStream,
    connection_id: u32,
    character_set: Option<CharacterSet>,
    no_backslash_escapes: bool,
    metadata_mode: MetadataMode,
    statement_cache: StatementCache,
}

impl MySqlConnection {
    /// Opens a TCP connection and runs the handshake (spec §4.5).
    pub async fn connect(options: &MySqlConnectOptions) -> Result<Self, Error> {
        let established = establish::establish(options).await?;
        Ok(MySqlConnection {
            stream: established.stream,
            connection_id: established.connection_id,
            character_set: established.character_set,
            no_backslash_escapes: false,
            metadata_mode: MetadataMode::Minimal,
            statement_cache: StatementCache::new(options.statement_cache_capacity),
        })
    }

    /// Whether the transport is currently running over TLS.
    pub fn is_tls(&self) -> bool {
        self.stream.is_tls()
    }

    /// The server-assigned connection id from the initial handshake.
    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    /// The connection's current character set, or [`Error::UnknownCharacterSet`] if the
    /// handshake's collation wasn't recognized and no `set-character-set` has succeeded since
    /// (spec §4.8).
    pub fn character_set(&self) -> Result<CharacterSet, Error> {
        self.character_set.ok_or(Error::UnknownCharacterSet)
    }

    /// Whether the server's last-known status disables backslash escaping in string literals.
    pub fn no_backslash_escapes(&self) -> bool {
        self.no_backslash_escapes
    }

    pub fn metadata_mode(&self) -> MetadataMode {
        self.metadata_mode
    }

    pub fn set_metadata_mode(&mut self, mode: MetadataMode) {
        self.metadata_mode = mode;
    }

    fn check_not_busy(&self) -> Result<(), Error> {
        if self.stream.busy != Busy::NotBusy {
            return Err(Error::OperationInProgress);
        }
        Ok(())
    }

    /// Begins a text-protocol query, returning once its head packet (and, if present, full
    /// column metadata) has been read (spec §4.6 `start-execution`).
    pub async fn start_execution(&mut self, sql: &str) -> Result<ExecutionHead, Error> {
        self.check_not_busy()?;
        executor::start_query(&mut self.stream, sql).await
    }

    /// Executes a prepared statement with bound parameters (spec §4.6 `execute(handle,
    /// params)`): validates the parameter count, then proceeds with binary row encoding.
    pub async fn execute(
        &mut self,
        statement: &MySqlStatement,
        params: &[MySqlValue],
    ) -> Result<ExecutionHead, Error> {
        self.check_not_busy()?;
        if params.len() != statement.param_count() {
            return Err(Error::ProtocolValueError(format!(
                "statement expects {} parameter(s), got {}",
                statement.param_count(),
                params.len()
            )));
        }
        executor::start_execute(&mut self.stream, statement, params, self.metadata_mode).await
    }

    /// Advances to the next resultset of a multi-result reply (reading-head-subsequent; spec
    /// §4.6).
    pub async fn read_resultset_head(&mut self) -> Result<ExecutionHead, Error> {
        executor::read_resultset_head(&mut self.stream, self.metadata_mode).await
    }

    /// Reads whatever rows are currently buffered plus at most one additional network read
    /// (spec §4.6 Row streaming).
    pub async fn read_some_rows(
        &mut self,
        columns: &Arc<[ColumnDefinition]>,
        encoding: RowEncoding,
        max_rows: Option<usize>,
    ) -> Result<RowBatch, Error> {
        executor::read_some_rows(&mut self.stream, columns, encoding, max_rows).await
    }

    /// Prepares `sql`, reusing a cached handle if one exists (spec §6
    /// `statement_cache_capacity`). Evicting the cache's least-recently-used entry, if any,
    /// issues a `close-statement` for the evicted handle server-side.
    pub async fn prepare_statement(&mut self, sql: &str) -> Result<MySqlStatement, Error> {
        self.check_not_busy()?;
        if let Some(cached) = self.statement_cache.get(sql) {
            return Ok(cached);
        }
        let statement = executor::prepare_statement(&mut self.stream, sql, self.metadata_mode).await?;
        if let Some(evicted_id) = self.statement_cache.insert(sql.into(), statement.clone()) {
            executor::close_statement(&mut self.stream, evicted_id).await?;
        }
        Ok(statement)
    }

    /// Explicitly closes a statement handle server-side (spec §4.6 `close(handle)`). Handles
    /// returned from [`Self::prepare_statement`] are normally left for the statement cache's
    /// own LRU eviction to close; this is for handles the caller wants gone immediately.
    pub async fn close_statement(&mut self, statement: MySqlStatement) -> Result<(), Error> {
        self.check_not_busy()?;
        executor::close_statement(&mut self.stream, statement.id()).await
    }

    pub async fn ping(&mut self) -> Result<(), Error> {
        self.check_not_busy()?;
        session::ping(&mut self.stream).await
    }

    /// Resets session variables, temp tables, transactions, and prepared statements. On success,
    /// the cached character set becomes unknown again and the statement cache is cleared, since
    /// the server has already invalidated every handle (spec §4.5, §4.9).
    pub async fn reset_connection(&mut self) -> Result<(), Error> {
        self.check_not_busy()?;
        session::reset_connection(&mut self.stream).await?;
        self.character_set = None;
        self.statement_cache.clear();
        Ok(())
    }

    /// Runs `SET NAMES <charset>` and refreshes the cached character set and backslash-escapes
    /// flag from the reply (spec §4.5).
    pub async fn set_character_set(&mut self, charset: CharacterSet) -> Result<(), Error> {
        self.check_not_busy()?;
        let summary = session::set_character_set(&mut self.stream, charset).await?;
        self.character_set = Some(charset);
        self.no_backslash_escapes = summary.status.contains(ServerStatus::NO_BACKSLASH_ESCAPES);
        Ok(())
    }

    /// Runs an ordered batch of stages (spec §4.7), then resyncs this connection's cached
    /// character set, backslash-escapes flag, and statement cache from whichever stages
    /// succeeded — the wire-level runner in [`pipeline`] only knows about the stream, not about
    /// this façade's cached session state.
    pub async fn run_pipeline(
        &mut self,
        stages: Vec<PipelineStage>,
    ) -> (Vec<StageOutcome>, Option<Arc<Error>>) {
        if let Err(err) = self.check_not_busy() {
            return (Vec::new(), Some(Arc::new(err)));
        }
        let snapshot = stages.clone();
        let (outcomes, top_level_error) =
            pipeline::run(&mut self.stream, self.metadata_mode, stages).await;

        for (outcome, stage) in outcomes.iter().zip(snapshot.iter()) {
            match (outcome, stage) {
                (StageOutcome::SetCharacterSet(Ok(ok)), PipelineStage::SetCharacterSet(charset)) => {
                    self.character_set = Some(*charset);
                    self.no_backslash_escapes = ok.status.contains(ServerStatus::NO_BACKSLASH_ESCAPES);
                }
                (StageOutcome::ResetConnection(Ok(())), PipelineStage::ResetConnection) => {
                    self.character_set = None;
                    self.statement_cache.clear();
                }
                (StageOutcome::PrepareStatement(Ok(statement)), PipelineStage::PrepareStatement(sql)) => {
                    if let Some(evicted_id) =
                        self.statement_cache.insert(sql.as_str().into(), statement.clone())
                    {
                        if let Err(err) = executor::close_statement(&mut self.stream, evicted_id).await {
                            tracing::warn!(
                                error = %err,
                                "pipeline: failed to close LRU-evicted statement, leaking server-side handle"
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        (outcomes, top_level_error)
    }

    /// Sends `COM_QUIT`, shuts down TLS if active, and closes the transport (spec §4.5 `close`).
    pub async fn close(self) {
        session::close(self.stream).await;
    }
}
