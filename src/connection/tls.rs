//! Connects the connect options' TLS settings to the engine-neutral upgrade in [`crate::io`]
//! (spec §4.5).
//!
//! Grounded on the teacher's `mysql/connection/tls.rs::maybe_upgrade`/`upgrade`: build a
//! connector from the connect options, then hand the plaintext socket to it.

use crate::connection::stream::MySqlStream;
use crate::error::Error;
use crate::io::TlsConfig;
use crate::options::MySqlConnectOptions;

/// Upgrades `stream`'s socket to TLS using whichever engine this build was compiled with.
/// Called after the client has written `SSLRequest` and before it writes
/// `HandshakeResponse41` (spec §4.5).
pub async fn upgrade(stream: MySqlStream, options: &MySqlConnectOptions) -> Result<MySqlStream, Error> {
    let config = TlsConfig::build(options.ssl_ca.as_deref())?;
    match config {
        #[cfg(feature = "rustls")]
        TlsConfig::Rustls(connector) => {
            let server_name =
                tokio_rustls::rustls::pki_types::ServerName::try_from(options.host.clone())
                    .map_err(|e| Error::Tls(Box::new(e)))?;
            stream.upgrade_tls_rustls(&connector, server_name).await
        }
        #[cfg(feature = "native-tls")]
        TlsConfig::NativeTls(connector) => {
            stream.upgrade_tls_native_tls(&connector, &options.host).await
        }
    }
}
