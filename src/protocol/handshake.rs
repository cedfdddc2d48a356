//! Initial handshake, handshake response, and SSL request packets (spec §4.5).

use crate::codec::{put_str_lenenc, BufExt, BufMutExt};
use crate::error::Error;
use crate::protocol::auth::AuthPlugin;
use crate::protocol::{Capabilities, ServerStatus};

/// `Handshake v10`, sent by the server immediately after the connection opens.
#[derive(Debug, Clone)]
pub struct InitialHandshake {
    pub protocol_version: u8,
    pub server_version: Box<str>,
    pub connection_id: u32,
    pub capabilities: Capabilities,
    pub default_collation: u8,
    pub status: ServerStatus,
    pub auth_plugin: Option<AuthPlugin>,
    pub auth_plugin_name: Box<str>,
    pub auth_plugin_data: Vec<u8>,
}

impl InitialHandshake {
    pub fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let protocol_version = buf.get_u8_checked("handshake.protocol_version")?;
        let server_version = buf.get_str_nul("handshake.server_version")?.to_string();
        let connection_id = buf.get_u32_le_checked("handshake.connection_id")?;

        let mut scramble = Vec::with_capacity(20);
        scramble.extend_from_slice(buf.checked_take(8, "handshake.scramble_1")?);
        let _ = buf.checked_take(1, "handshake.filler")?;

        let capabilities_1 = buf.get_u16_le_checked("handshake.capabilities_1")?;
        let mut capabilities = Capabilities::from_bits_truncate(u64::from(capabilities_1));

        let default_collation = buf.get_u8_checked("handshake.charset")?;
        let status = ServerStatus::from_bits_truncate(buf.get_u16_le_checked("handshake.status")?);

        let capabilities_2 = buf.get_u16_le_checked("handshake.capabilities_2")?;
        capabilities |= Capabilities::from_bits_truncate(u64::from(capabilities_2) << 16);

        let auth_plugin_data_len = if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            buf.get_u8_checked("handshake.auth_plugin_data_len")?
        } else {
            let _ = buf.checked_take(1, "handshake.reserved_auth_len")?;
            0
        };

        let _ = buf.checked_take(10, "handshake.reserved")?;

        if capabilities.contains(Capabilities::SECURE_CONNECTION) {
            let len = ((auth_plugin_data_len as i32) - 9).max(12) as usize;
            scramble.extend_from_slice(buf.checked_take(len, "handshake.scramble_2")?);
            // reserved: string<1>, the scramble's trailing NUL terminator.
            let _ = buf.checked_take(1, "handshake.scramble_2_nul")?;
        }

        let auth_plugin_name = if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            buf.get_str_nul("handshake.auth_plugin_name")?.to_string()
        } else {
            String::new()
        };

        let auth_plugin = if auth_plugin_name.is_empty() {
            None
        } else {
            Some(AuthPlugin::by_name(&auth_plugin_name)?)
        };

        Ok(InitialHandshake {
            protocol_version,
            server_version: server_version.into_boxed_str(),
            connection_id,
            capabilities,
            default_collation,
            status,
            auth_plugin,
            auth_plugin_name: auth_plugin_name.into_boxed_str(),
            auth_plugin_data: scramble,
        })
    }
}

/// `SSLRequest`, written before the TLS handshake to tell the server to expect an upgrade
/// (spec §4.5).
pub struct SslRequest {
    pub capabilities: Capabilities,
    pub max_packet_size: u32,
    pub collation: u8,
}

impl SslRequest {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u32_le((self.capabilities.bits() & 0xFFFF_FFFF) as u32);
        out.put_u32_le(self.max_packet_size);
        out.put_u8(self.collation);
        out.extend(std::iter::repeat(0).take(23));
    }
}

/// `HandshakeResponse41` (spec §4.5), written after capability negotiation and any TLS
/// upgrade.
pub struct HandshakeResponse41<'a> {
    pub capabilities: Capabilities,
    pub max_packet_size: u32,
    pub collation: u8,
    pub username: &'a str,
    pub auth_response: &'a [u8],
    pub database: Option<&'a str>,
    pub auth_plugin_name: &'a str,
    pub connect_attrs: &'a [(String, String)],
}

impl<'a> HandshakeResponse41<'a> {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u32_le((self.capabilities.bits() & 0xFFFF_FFFF) as u32);
        out.put_u32_le(self.max_packet_size);
        out.put_u8(self.collation);
        out.extend(std::iter::repeat(0).take(23));
        out.put_str_nul(self.username);

        if self
            .capabilities
            .contains(Capabilities::PLUGIN_AUTH_LENENC_CLIENT_DATA)
        {
            crate::codec::put_bytes_lenenc(out, self.auth_response);
        } else {
            out.put_u8(self.auth_response.len() as u8);
            out.extend_from_slice(self.auth_response);
        }

        if self.capabilities.contains(Capabilities::CONNECT_WITH_DB) {
            out.put_str_nul(self.database.unwrap_or(""));
        }

        if self.capabilities.contains(Capabilities::PLUGIN_AUTH) {
            out.put_str_nul(self.auth_plugin_name);
        }

        if self.capabilities.contains(Capabilities::CONNECT_ATTRS) {
            let mut attrs_buf = Vec::new();
            for (k, v) in self.connect_attrs {
                put_str_lenenc(&mut attrs_buf, k);
                put_str_lenenc(&mut attrs_buf, v);
            }
            crate::codec::put_uint_lenenc(out, attrs_buf.len() as u64);
            out.extend_from_slice(&attrs_buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Captured MariaDB 10.4.7 initial handshake packet.
    const HANDSHAKE_MARIADB: &[u8] = b"\n5.5.5-10.4.7-MariaDB-1:10.4.7+maria~bionic\x00\x0b\x00\x00\x00t6L\\j\"dS\x00\xfe\xf7\x08\x02\x00\xff\x81\x15\x00\x00\x00\x00\x00\x00\x07\x00\x00\x00U14Oph9\"<H5n\x00mysql_native_password\x00";

    #[test]
    fn decodes_mariadb_handshake() {
        let hs = InitialHandshake::decode(HANDSHAKE_MARIADB).unwrap();
        assert_eq!(hs.protocol_version, 10);
        assert_eq!(&*hs.server_version, "5.5.5-10.4.7-MariaDB-1:10.4.7+maria~bionic");
        assert_eq!(hs.auth_plugin, Some(AuthPlugin::MySqlNativePassword));
        assert_eq!(hs.auth_plugin_data.len(), 20);
        assert!(hs.capabilities.contains(Capabilities::PROTOCOL_41));
        assert!(hs.capabilities.contains(Capabilities::SECURE_CONNECTION));
    }
}
