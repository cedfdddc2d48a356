//! Handshake and capability negotiation (spec §4.5 Session engine).

use crate::charset::CharacterSet;
use crate::connection::stream::MySqlStream;
use crate::connection::tls;
use crate::error::Error;
use crate::io::Socket;
use crate::options::{MySqlConnectOptions, SslMode};
use crate::protocol::auth::{AuthPlugin, AuthResponse};
use crate::protocol::auth_switch::{AuthMoreData, AuthSwitchRequest};
use crate::protocol::handshake::{HandshakeResponse41, InitialHandshake, SslRequest};
use crate::protocol::{header_byte, Capabilities};

/// Session state produced by a successful handshake (spec §3 Session state).
pub struct EstablishedSession {
    pub stream: MySqlStream,
    pub connection_id: u32,
    pub capabilities: Capabilities,
    pub character_set: Option<CharacterSet>,
}

pub async fn establish(options: &MySqlConnectOptions) -> Result<EstablishedSession, Error> {
    let socket = Socket::connect_tcp(&options.host, options.port).await?;
    let mut stream = MySqlStream::new(socket, options.initial_buffer_size, options.max_buffer_size);

    let handshake_payload = stream.read_message().await?;
    if handshake_payload.first() == Some(&header_byte::ERR) {
        return Err(Error::Server(crate::error::MySqlDatabaseError::decode(
            &handshake_payload,
            true,
        )?));
    }
    let handshake = InitialHandshake::decode(&handshake_payload)?;

    let missing = Capabilities::MANDATORY - handshake.capabilities;
    if !missing.is_empty() {
        return Err(Error::ServerUnsupported("server is missing a required handshake capability"));
    }

    let mut capabilities = Capabilities::MANDATORY | Capabilities::MULTI_RESULTS | Capabilities::PS_MULTI_RESULTS;
    if options.database.is_some() {
        capabilities |= Capabilities::CONNECT_WITH_DB;
    }
    if options.multi_statements {
        capabilities |= Capabilities::MULTI_STATEMENTS;
    }
    if !options.connect_attrs.is_empty() {
        capabilities |= Capabilities::CONNECT_ATTRS;
    }

    let wants_ssl = match options.ssl_mode {
        SslMode::Disable => false,
        SslMode::Enable => handshake.capabilities.contains(Capabilities::SSL),
        SslMode::Require => {
            if !handshake.capabilities.contains(Capabilities::SSL) {
                return Err(Error::ServerDoesntSupportSsl);
            }
            true
        }
    };
    if wants_ssl {
        capabilities |= Capabilities::SSL;
    }

    let collation = options
        .collation
        .or_else(|| CharacterSet::from_collation_id(handshake.default_collation as u16))
        .unwrap_or_default();

    if wants_ssl {
        let mut ssl_request_payload = Vec::new();
        SslRequest {
            capabilities,
            max_packet_size: crate::frame::MAX_FRAME_PAYLOAD as u32,
            collation: collation.collation_id as u8,
        }
        .encode(&mut ssl_request_payload);
        stream.write_message(&ssl_request_payload).await?;

        stream = tls::upgrade(stream, options).await?;
    }

    stream.capabilities = capabilities;

    let mut auth_plugin = handshake.auth_plugin.unwrap_or(AuthPlugin::MySqlNativePassword);
    let password = options.password.as_deref().unwrap_or("");
    let mut auth_response = auth_plugin.compute(password, &handshake.auth_plugin_data)?;

    let connect_attrs: Vec<(String, String)> = options
        .connect_attrs
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    loop {
        let mut response_payload = Vec::new();
        HandshakeResponse41 {
            capabilities,
            max_packet_size: crate::frame::MAX_FRAME_PAYLOAD as u32,
            collation: collation.collation_id as u8,
            username: &options.username,
            auth_response: &auth_response,
            database: options.database.as_deref(),
            auth_plugin_name: auth_plugin.name(),
            connect_attrs: &connect_attrs,
        }
        .encode(&mut response_payload);
        stream.write_message(&response_payload).await?;

        let reply = stream.read_message().await?;
        match reply.first() {
            Some(&header_byte::OK) => break,
            Some(&header_byte::ERR) => {
                let protocol_41 = capabilities.contains(Capabilities::PROTOCOL_41);
                return Err(Error::Server(crate::error::MySqlDatabaseError::decode(
                    &reply,
                    protocol_41,
                )?));
            }
            Some(&AuthSwitchRequest::HEADER) => {
                let switch = AuthSwitchRequest::decode(&reply)?;
                auth_plugin = AuthPlugin::by_name(&switch.plugin_name)?;
                auth_response = auth_plugin.compute(password, &switch.plugin_data)?;
            }
            Some(&AuthMoreData::HEADER) => {
                let more = AuthMoreData::decode(&reply)?;
                match auth_plugin.handle_more_data(
                    &more.data,
                    password,
                    &handshake.auth_plugin_data,
                    stream.is_tls(),
                )? {
                    AuthResponse::Data(data) => {
                        auth_response = data;
                    }
                    AuthResponse::WaitForServer => {
                        let final_reply = stream.read_message().await?;
                        match final_reply.first() {
                            Some(&header_byte::OK) => break,
                            Some(&header_byte::ERR) => {
                                let protocol_41 = capabilities.contains(Capabilities::PROTOCOL_41);
                                return Err(Error::Server(crate::error::MySqlDatabaseError::decode(
                                    &final_reply,
                                    protocol_41,
                                )?));
                            }
                            other => {
                                return Err(Error::ProtocolValueError(format!(
                                    "unexpected packet {other:?} waiting for fast-auth OK"
                                )))
                            }
                        }
                    }
                }
            }
            other => {
                return Err(Error::ProtocolValueError(format!(
                    "unexpected packet {other:?} during handshake"
                )))
            }
        }
    }

    Ok(EstablishedSession {
        stream,
        connection_id: handshake.connection_id,
        capabilities,
        character_set: Some(collation),
    })
}
