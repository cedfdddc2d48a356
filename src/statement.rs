//! Prepared statement handles (spec §3 Statement handle, §4.6 Prepared statements).

use std::sync::Arc;

use crate::protocol::column::ColumnDefinition;

/// A server-side prepared statement handle.
///
/// Owned by the caller (via whatever handle type the connection hands back) but references
/// server-side state: valid until an explicit `close-statement`, a connection reset, or the
/// owning connection's destruction (spec §3 Statement handle lifecycle).
#[derive(Debug, Clone)]
pub struct MySqlStatement {
    pub(crate) id: u32,
    pub(crate) sql: Arc<str>,
    pub(crate) params: Arc<[ColumnDefinition]>,
    pub(crate) columns: Arc<[ColumnDefinition]>,
}

impl MySqlStatement {
    pub(crate) fn new(
        id: u32,
        sql: Arc<str>,
        params: Arc<[ColumnDefinition]>,
        columns: Arc<[ColumnDefinition]>,
    ) -> Self {
        MySqlStatement {
            id,
            sql,
            params,
            columns,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }
}
