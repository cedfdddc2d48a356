//! Transport plumbing the frame layer runs over (spec §4.11 Async runtime glue, restricted to
//! the one concrete Tokio binding this crate ships).

mod socket;
mod tls;

pub use socket::Socket;
pub use tls::TlsConfig;
