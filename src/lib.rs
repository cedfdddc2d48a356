//! An asynchronous MySQL/MariaDB client: wire-protocol engine and connection pool.
//!
//! This crate is organized leaves-first, mirroring the way the protocol is actually
//! layered on the wire:
//!
//! - [`codec`] — fixed-width and length-encoded integer/string/temporal primitives.
//! - [`frame`] — packet framing and sequence-number discipline.
//! - [`protocol`] — wire messages (handshake, auth, OK/Err/EOF, columns, rows, statements).
//! - [`io`] — the socket/TLS plumbing the frame layer runs over.
//! - [`connection`] — the session and execution state machines, and the public façade.
//! - [`pool`] — the bounded connection pool built on top of the façade.
//!
//! See `DESIGN.md` at the repository root for where each piece is grounded.

mod charset;
pub mod codec;
pub mod connection;
pub mod error;
pub mod frame;
pub mod io;
pub mod options;
pub mod pool;
pub mod protocol;
pub mod row;
pub mod statement;
pub mod value;

pub use charset::CharacterSet;
pub use connection::MySqlConnection;
pub use error::{Diagnostics, Error, MySqlDatabaseError, Result};
pub use options::{MySqlConnectOptions, SslMode};
pub use pool::{MySqlPool, PoolOptions};
pub use row::{MySqlRow, RowTarget};
pub use statement::MySqlStatement;
pub use value::MySqlValue;
