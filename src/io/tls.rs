//! Builds the TLS connector for the `tls-mode` options (spec §4.5, §6 Configuration).
//!
//! Grounded on the teacher's `mysql/connection/tls.rs::maybe_upgrade`, generalized over two
//! TLS engines selected by Cargo feature rather than hard-coded to one library — this crate
//! defaults to `rustls` and offers `native-tls` as an alternative, matching how the broader
//! example pack treats TLS as a pluggable engine (spec §1 Non-goals: "TLS primitives
//! themselves; the core consumes a TLS engine").

use std::path::Path;
use std::sync::Arc;

use crate::error::Error;

/// The TLS engine this build was compiled with, built once per connection attempt from the
/// connect options' `ssl_ca`.
pub enum TlsConfig {
    #[cfg(feature = "rustls")]
    Rustls(tokio_rustls::TlsConnector),
    #[cfg(feature = "native-tls")]
    NativeTls(tokio_native_tls::TlsConnector),
}

impl TlsConfig {
    #[cfg(feature = "rustls")]
    pub fn build(ssl_ca: Option<&Path>) -> Result<Self, Error> {
        let mut roots = tokio_rustls::rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        if let Some(path) = ssl_ca {
            let pem = std::fs::read(path).map_err(Error::Io)?;
            let mut reader = std::io::Cursor::new(pem);
            for cert in rustls_pemfile::certs(&mut reader) {
                let cert = cert.map_err(Error::Io)?;
                roots
                    .add(cert)
                    .map_err(|e| Error::Tls(format!("invalid CA certificate: {e}").into()))?;
            }
        }

        let config = tokio_rustls::rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(TlsConfig::Rustls(tokio_rustls::TlsConnector::from(Arc::new(config))))
    }

    #[cfg(all(feature = "native-tls", not(feature = "rustls")))]
    pub fn build(ssl_ca: Option<&Path>) -> Result<Self, Error> {
        let mut builder = native_tls::TlsConnector::builder();
        if let Some(path) = ssl_ca {
            let pem = std::fs::read(path).map_err(Error::Io)?;
            let cert = native_tls::Certificate::from_pem(&pem)
                .map_err(|e| Error::Tls(Box::new(e)))?;
            builder.add_root_certificate(cert);
        }
        let connector = builder.build().map_err(|e| Error::Tls(Box::new(e)))?;
        Ok(TlsConfig::NativeTls(tokio_native_tls::TlsConnector::from(connector)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "rustls")]
    fn builds_default_connector_without_custom_ca() {
        assert!(TlsConfig::build(None).is_ok());
    }
}
