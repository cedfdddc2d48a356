//! A TCP stream that may or may not have been upgraded to TLS (spec §4.5 TLS upgrade).
//!
//! Grounded on the teacher's `io::MaybeTlsStream`: one enum, manually delegating
//! [`AsyncRead`]/[`AsyncWrite`] to whichever variant is active, so the rest of the crate never
//! has to know whether a connection is encrypted.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

use crate::error::Error;

pub enum Socket {
    Tcp(TcpStream),
    #[cfg(feature = "rustls")]
    Rustls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
    #[cfg(feature = "native-tls")]
    NativeTls(Box<tokio_native_tls::TlsStream<TcpStream>>),
}

impl Socket {
    pub async fn connect_tcp(host: &str, port: u16) -> Result<Self, Error> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(Socket::Tcp(stream))
    }

    pub fn is_tls(&self) -> bool {
        match self {
            Socket::Tcp(_) => false,
            #[cfg(feature = "rustls")]
            Socket::Rustls(_) => true,
            #[cfg(feature = "native-tls")]
            Socket::NativeTls(_) => true,
        }
    }

    #[cfg(feature = "rustls")]
    pub async fn upgrade_rustls(
        self,
        connector: &tokio_rustls::TlsConnector,
        server_name: tokio_rustls::rustls::pki_types::ServerName<'static>,
    ) -> Result<Self, Error> {
        let Socket::Tcp(tcp) = self else {
            return Err(Error::Tls("socket is already upgraded to TLS".into()));
        };
        let tls = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| Error::Tls(Box::new(e)))?;
        Ok(Socket::Rustls(Box::new(tls)))
    }

    #[cfg(feature = "native-tls")]
    pub async fn upgrade_native_tls(
        self,
        connector: &tokio_native_tls::TlsConnector,
        domain: &str,
    ) -> Result<Self, Error> {
        let Socket::Tcp(tcp) = self else {
            return Err(Error::Tls("socket is already upgraded to TLS".into()));
        };
        let tls = connector
            .connect(domain, tcp)
            .await
            .map_err(|e| Error::Tls(Box::new(e)))?;
        Ok(Socket::NativeTls(Box::new(tls)))
    }
}

impl AsyncRead for Socket {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Socket::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            #[cfg(feature = "rustls")]
            Socket::Rustls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
            #[cfg(feature = "native-tls")]
            Socket::NativeTls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Socket {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Socket::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            #[cfg(feature = "rustls")]
            Socket::Rustls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
            #[cfg(feature = "native-tls")]
            Socket::NativeTls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Socket::Tcp(s) => Pin::new(s).poll_flush(cx),
            #[cfg(feature = "rustls")]
            Socket::Rustls(s) => Pin::new(s.as_mut()).poll_flush(cx),
            #[cfg(feature = "native-tls")]
            Socket::NativeTls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Socket::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            #[cfg(feature = "rustls")]
            Socket::Rustls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
            #[cfg(feature = "native-tls")]
            Socket::NativeTls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}
