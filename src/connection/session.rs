//! Ancillary session algorithms beyond the handshake itself (spec §4.5 "Other session
//! algorithms"): `ping`, `reset-connection`, `set-character-set`, `close`.

use tokio::io::AsyncWriteExt as _;

use crate::charset::CharacterSet;
use crate::connection::executor::{self, ExecutionHead};
use crate::connection::stream::MySqlStream;
use crate::error::Error;
use crate::protocol::command::{ComPing, ComQuit, ComResetConnection};
use crate::protocol::ok::OkPacket;

pub async fn ping(stream: &mut MySqlStream) -> Result<(), Error> {
    let mut payload = Vec::new();
    ComPing.encode(&mut payload);
    stream.write_command(&payload).await?;
    stream.read_ok_or_err().await?;
    Ok(())
}

/// Resets session variables, temp tables, transactions, and prepared statements while keeping
/// the transport and authenticated user (spec §4.9 `reset-connection`).
pub async fn reset_connection(stream: &mut MySqlStream) -> Result<(), Error> {
    let mut payload = Vec::new();
    ComResetConnection.encode(&mut payload);
    stream.write_command(&payload).await?;
    stream.read_ok_or_err().await?;
    Ok(())
}

/// Runs `SET NAMES <charset>` via the text execution path. Returns the terminating OK packet so
/// the caller can refresh its cached character set and backslash-escapes flag from the server
/// status it carries (spec §4.5).
pub async fn set_character_set(stream: &mut MySqlStream, charset: CharacterSet) -> Result<OkPacket, Error> {
    let sql = format!("SET NAMES {}", charset.name);
    match executor::start_query(stream, &sql).await? {
        ExecutionHead::NoResultSet(summary) => Ok(summary),
        ExecutionHead::ResultSet(_) => Err(Error::ProtocolValueError(
            "SET NAMES unexpectedly produced a resultset".to_string(),
        )),
    }
}

/// Sends `COM_QUIT`, then shuts down TLS (if active) and closes the transport (spec §4.5
/// `close`). The server never replies to `COM_QUIT`, so the write is best-effort: a failure
/// here doesn't matter, since the connection is being discarded either way.
pub async fn close(mut stream: MySqlStream) {
    let mut payload = Vec::new();
    ComQuit.encode(&mut payload);
    let _ = stream.write_command(&payload).await;
    let _ = stream.socket_mut().shutdown().await;
}
