//! `AuthSwitchRequest` / `AuthMoreData` packets (spec §4.5 handshake loop).

use crate::codec::BufExt;
use crate::error::Error;

/// Sent by the server to ask the client to switch to a different authentication plugin,
/// supplying a fresh challenge for it.
#[derive(Debug, Clone)]
pub struct AuthSwitchRequest {
    pub plugin_name: Box<str>,
    pub plugin_data: Vec<u8>,
}

impl AuthSwitchRequest {
    pub const HEADER: u8 = 0xFE;

    pub fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let header = buf.get_u8_checked("AuthSwitchRequest header")?;
        if header != Self::HEADER {
            return Err(Error::ProtocolValueError(format!(
                "expected AuthSwitchRequest header 0xFE, got {header:#04x}"
            )));
        }
        let plugin_name = buf.get_str_nul("AuthSwitchRequest plugin name")?.to_string();
        // Trailing NUL on the challenge data is optional depending on server version; strip
        // it if present so plugins always see the raw challenge bytes.
        let mut plugin_data = buf.to_vec();
        if plugin_data.last() == Some(&0) {
            plugin_data.pop();
        }
        Ok(AuthSwitchRequest {
            plugin_name: plugin_name.into_boxed_str(),
            plugin_data,
        })
    }
}

/// `AuthMoreData`: additional plugin-specific data mid-handshake (e.g. caching_sha2_password's
/// fast-auth-success marker or cleartext-password request).
#[derive(Debug, Clone)]
pub struct AuthMoreData {
    pub data: Vec<u8>,
}

impl AuthMoreData {
    pub const HEADER: u8 = 0x01;

    pub fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let header = buf.get_u8_checked("AuthMoreData header")?;
        if header != Self::HEADER {
            return Err(Error::ProtocolValueError(format!(
                "expected AuthMoreData header 0x01, got {header:#04x}"
            )));
        }
        Ok(AuthMoreData {
            data: buf.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_auth_switch_request() {
        let mut buf = vec![0xFE];
        buf.extend_from_slice(b"caching_sha2_password\0");
        buf.extend_from_slice(&[1; 20]);
        let req = AuthSwitchRequest::decode(&buf).unwrap();
        assert_eq!(&*req.plugin_name, "caching_sha2_password");
        assert_eq!(req.plugin_data.len(), 20);
    }
}
