//! The read/write half of one connection: frame layer driven against a [`Socket`]
//! (spec §4.2 Frame layer, §4.11 next-action boundaries restricted to this crate's one Tokio
//! binding).

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::Error;
use crate::frame::{self, MessageReader, SeqCounter};
use crate::io::Socket;
use crate::protocol::{header_byte, Capabilities};

/// Whether the stream currently expects more response packets before a new command may be
/// issued (spec §5 "at-most-one in flight", §4.8 `operation-in-progress`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Busy {
    NotBusy,
    Result,
    Row,
}

pub struct MySqlStream {
    socket: Socket,
    reader: MessageReader,
    /// The one sequence counter threaded through both directions of this connection (spec §3):
    /// writes advance it via [`frame::write_frames`], reads validate and advance it via
    /// [`MessageReader::try_take_message`]. Keeping a single field here, rather than a
    /// write-side and a read-side counter that could drift apart, is what lets
    /// `write_command`'s reset (below) put both sides back in sync in one write.
    seq: SeqCounter,
    read_buf: [u8; 4096],
    pub(crate) capabilities: Capabilities,
    pub(crate) busy: Busy,
}

impl MySqlStream {
    pub fn new(socket: Socket, initial_buffer_size: usize, max_buffer_size: usize) -> Self {
        MySqlStream {
            socket,
            reader: MessageReader::new(initial_buffer_size, max_buffer_size),
            seq: SeqCounter::default(),
            read_buf: [0u8; 4096],
            capabilities: Capabilities::empty(),
            busy: Busy::NotBusy,
        }
    }

    pub fn is_tls(&self) -> bool {
        self.socket.is_tls()
    }

    pub fn into_socket(self) -> Socket {
        self.socket
    }

    pub fn socket_mut(&mut self) -> &mut Socket {
        &mut self.socket
    }

    /// Upgrades the underlying socket to TLS in place, preserving the frame layer's buffered
    /// state and sequence counters (spec §4.5 TLS upgrade happens mid-handshake).
    #[cfg(feature = "rustls")]
    pub async fn upgrade_tls_rustls(
        self,
        connector: &tokio_rustls::TlsConnector,
        server_name: tokio_rustls::rustls::pki_types::ServerName<'static>,
    ) -> Result<Self, Error> {
        let MySqlStream {
            socket,
            reader,
            seq,
            read_buf,
            capabilities,
            busy,
        } = self;
        let socket = socket.upgrade_rustls(connector, server_name).await?;
        Ok(MySqlStream {
            socket,
            reader,
            seq,
            read_buf,
            capabilities,
            busy,
        })
    }

    #[cfg(feature = "native-tls")]
    pub async fn upgrade_tls_native_tls(
        self,
        connector: &tokio_native_tls::TlsConnector,
        domain: &str,
    ) -> Result<Self, Error> {
        let MySqlStream {
            socket,
            reader,
            seq,
            read_buf,
            capabilities,
            busy,
        } = self;
        let socket = socket.upgrade_native_tls(connector, domain).await?;
        Ok(MySqlStream {
            socket,
            reader,
            seq,
            read_buf,
            capabilities,
            busy,
        })
    }

    /// Resets the shared sequence counter for both directions, e.g. starting a fresh command or
    /// after `reset-connection` (spec §4.2).
    pub fn reset_sequence(&mut self) {
        self.seq.reset();
    }

    /// Writes one logical message as a fresh command (sequence number 0), per spec §4.5/§4.6
    /// "no request may begin before the prior one's full reply is consumed".
    pub async fn write_command(&mut self, payload: &[u8]) -> Result<(), Error> {
        self.reset_sequence();
        self.write_message(payload).await
    }

    /// Writes one logical message continuing the current sequence (used mid-handshake, where
    /// the client's handshake response continues the server's initial-handshake sequence).
    pub async fn write_message(&mut self, payload: &[u8]) -> Result<(), Error> {
        let mut wire = Vec::with_capacity(frame::HEADER_LEN + payload.len());
        frame::write_frames(payload, &mut self.seq, &mut wire);
        self.socket.write_all(&wire).await?;
        self.socket.flush().await?;
        Ok(())
    }

    /// Reads one logical message, blocking on the socket until a complete message is
    /// reassembled (spec §4.2 Reader contract).
    pub async fn read_message(&mut self) -> Result<Bytes, Error> {
        loop {
            if let Some(message) = self.reader.try_take_message(&mut self.seq)? {
                if message.seqnum_mismatch {
                    return Err(Error::SequenceMismatch {
                        expected: message.expected_first_seqnum,
                        actual: message.first_seqnum,
                    });
                }
                return Ok(Bytes::from(message.payload));
            }

            let n = self.socket.read(&mut self.read_buf).await?;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                )));
            }
            self.reader.feed(&self.read_buf[..n])?;
        }
    }

    /// Takes a message if one is already fully buffered, without touching the socket (spec
    /// §4.6 Row streaming: "reads whatever is currently buffered").
    pub fn try_take_message_buffered(&mut self) -> Result<Option<Bytes>, Error> {
        let Some(message) = self.reader.try_take_message(&mut self.seq)? else {
            return Ok(None);
        };
        if message.seqnum_mismatch {
            return Err(Error::SequenceMismatch {
                expected: message.expected_first_seqnum,
                actual: message.first_seqnum,
            });
        }
        Ok(Some(Bytes::from(message.payload)))
    }

    /// Performs exactly one socket read and feeds it to the reassembler, without blocking for
    /// a complete message (spec §4.6 Row streaming: "at most one additional network read").
    pub async fn fill_buffer_once(&mut self) -> Result<(), Error> {
        let n = self.socket.read(&mut self.read_buf).await?;
        if n == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed by peer",
            )));
        }
        self.reader.feed(&self.read_buf[..n])
    }

    pub async fn read_ok_or_err(&mut self) -> Result<crate::protocol::ok::OkPacket, Error> {
        let payload = self.read_message().await?;
        self.decode_ok_or_err(&payload)
    }

    pub fn decode_ok_or_err(&self, payload: &[u8]) -> Result<crate::protocol::ok::OkPacket, Error> {
        match payload.first() {
            Some(&header_byte::ERR) => {
                let protocol_41 = self.capabilities.contains(Capabilities::PROTOCOL_41);
                Err(Error::Server(crate::error::MySqlDatabaseError::decode(
                    payload,
                    protocol_41,
                )?))
            }
            Some(&header_byte::OK) | Some(&header_byte::EOF) => {
                crate::protocol::ok::OkPacket::decode(payload)
            }
            other => Err(Error::ProtocolValueError(format!(
                "expected OK or Err packet, got header {other:?}"
            ))),
        }
    }
}
