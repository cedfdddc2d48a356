//! Authentication plugins (spec §4.4, L4): challenge/response calculators.
//!
//! Grounded on the teacher's `mysql/protocol/auth.rs` `AuthPlugin` enum, generalized into the
//! `auth_calculator`-style capability the original C++ implementation exposes (a name plus a
//! `(password, challenge, tls_active) -> response` function) rather than a closed match.

use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::error::Error;

/// Outcome of a plugin computing its challenge response (spec §4.5 handshake loop).
#[derive(Debug, Clone)]
pub enum AuthResponse {
    /// Send this response and continue the handshake loop.
    Data(Vec<u8>),
    /// The plugin needs no further client action; wait for the server's next packet.
    WaitForServer,
}

/// An authentication plugin, identified by its wire name (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlugin {
    MySqlNativePassword,
    CachingSha2Password,
}

impl AuthPlugin {
    pub fn by_name(name: &str) -> Result<Self, Error> {
        match name {
            "mysql_native_password" => Ok(AuthPlugin::MySqlNativePassword),
            "caching_sha2_password" => Ok(AuthPlugin::CachingSha2Password),
            other => Err(Error::UnknownAuthPlugin(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AuthPlugin::MySqlNativePassword => "mysql_native_password",
            AuthPlugin::CachingSha2Password => "caching_sha2_password",
        }
    }

    /// Computes the initial challenge response (spec §4.4).
    pub fn compute(
        self,
        password: &str,
        challenge: &[u8],
    ) -> Result<Vec<u8>, Error> {
        match self {
            AuthPlugin::MySqlNativePassword => native_password_response(password, challenge),
            AuthPlugin::CachingSha2Password => caching_sha2_challenge_response(password, challenge),
        }
    }

    /// Handles an `AuthMoreData` packet's payload, per spec §4.5's handshake loop and §4.4.
    ///
    /// `fast_auth_ok` signals the server sent the caching_sha2 "fast auth success" marker
    /// (`0x03`); any other payload signals a cleartext-password request (`0x04`) which this
    /// method only honors when `tls_active` is true, per spec §4.4.
    pub fn handle_more_data(
        self,
        payload: &[u8],
        password: &str,
        challenge: &[u8],
        tls_active: bool,
    ) -> Result<AuthResponse, Error> {
        match self {
            AuthPlugin::CachingSha2Password => match payload.first() {
                Some(0x03) => Ok(AuthResponse::WaitForServer),
                Some(0x04) => {
                    if !tls_active {
                        return Err(Error::AuthPluginRequiresSsl);
                    }
                    let mut out = password.as_bytes().to_vec();
                    out.push(0);
                    Ok(AuthResponse::Data(out))
                }
                _ => {
                    let response = caching_sha2_challenge_response(password, challenge)?;
                    Ok(AuthResponse::Data(response))
                }
            },
            AuthPlugin::MySqlNativePassword => {
                let response = native_password_response(password, challenge)?;
                Ok(AuthResponse::Data(response))
            }
        }
    }
}

/// `SHA1(password) XOR SHA1(challenge || SHA1(SHA1(password)))`, 20 bytes; empty password
/// yields an empty response (spec §4.4).
fn native_password_response(password: &str, challenge: &[u8]) -> Result<Vec<u8>, Error> {
    if password.is_empty() {
        return Ok(Vec::new());
    }
    if challenge.len() != 20 {
        return Err(Error::ProtocolValueError(format!(
            "mysql_native_password challenge must be 20 bytes, got {}",
            challenge.len()
        )));
    }

    let password_sha1 = Sha1::digest(password.as_bytes());
    let password_sha1_sha1 = Sha1::digest(password_sha1);

    let mut hasher = Sha1::new();
    hasher.update(challenge);
    hasher.update(password_sha1_sha1);
    let challenge_hash = hasher.finalize();

    Ok(xor(&password_sha1, &challenge_hash))
}

/// `SHA256(password) XOR SHA256(challenge || SHA256(SHA256(password)))`, 32 bytes; empty
/// password yields an empty response (spec §4.4).
fn caching_sha2_challenge_response(password: &str, challenge: &[u8]) -> Result<Vec<u8>, Error> {
    if password.is_empty() {
        return Ok(Vec::new());
    }

    let password_sha256 = Sha256::digest(password.as_bytes());
    let password_sha256_sha256 = Sha256::digest(password_sha256);

    let mut hasher = Sha256::new();
    hasher.update(challenge);
    hasher.update(password_sha256_sha256);
    let challenge_hash = hasher.finalize();

    Ok(xor(&password_sha256, &challenge_hash))
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_empty_password_gives_empty_response() {
        let challenge = [0u8; 20];
        let response = AuthPlugin::MySqlNativePassword
            .compute("", &challenge)
            .unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn native_password_response_is_20_bytes_for_nonempty_password() {
        let challenge = *b"01234567890123456789";
        let response = AuthPlugin::MySqlNativePassword
            .compute("hunter2", &challenge)
            .unwrap();
        assert_eq!(response.len(), 20);
    }

    #[test]
    fn native_password_rejects_wrong_challenge_length() {
        let err = AuthPlugin::MySqlNativePassword
            .compute("hunter2", &[0u8; 19])
            .unwrap_err();
        assert!(matches!(err, Error::ProtocolValueError(_)));
    }

    #[test]
    fn caching_sha2_response_is_32_bytes() {
        let challenge = *b"01234567890123456789";
        let response = AuthPlugin::CachingSha2Password
            .compute("hunter2", &challenge)
            .unwrap();
        assert_eq!(response.len(), 32);
    }

    #[test]
    fn caching_sha2_cleartext_requires_tls() {
        let plugin = AuthPlugin::CachingSha2Password;
        let err = plugin
            .handle_more_data(&[0x04], "hunter2", &[0u8; 20], false)
            .unwrap_err();
        assert!(matches!(err, Error::AuthPluginRequiresSsl));

        let ok = plugin
            .handle_more_data(&[0x04], "hunter2", &[0u8; 20], true)
            .unwrap();
        assert!(matches!(ok, AuthResponse::Data(_)));
    }

    #[test]
    fn caching_sha2_fast_auth_waits_for_server() {
        let plugin = AuthPlugin::CachingSha2Password;
        let resp = plugin
            .handle_more_data(&[0x03], "hunter2", &[0u8; 20], false)
            .unwrap();
        assert!(matches!(resp, AuthResponse::WaitForServer));
    }
}
