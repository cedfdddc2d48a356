//! Wire messages: handshake, authentication, OK/Err/EOF, column metadata, rows, and
//! prepared-statement packets (spec §4.2-§4.6, §6).

pub mod auth;
pub mod auth_switch;
pub mod binary;
pub mod column;
pub mod command;
pub mod eof;
pub mod err;
pub mod handshake;
pub mod ok;
pub mod text;

use bitflags::bitflags;

bitflags! {
    /// The 32(+)-bit client/server capability flag field (spec §3 Capability set).
    ///
    /// The wire handshake actually carries this as two/three 16/32-bit halves (capabilities 1,
    /// 2, and — for MariaDB's "extended" bit — 3); [`handshake::InitialHandshake::read`]
    /// reassembles them into one value before this type ever sees it.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct Capabilities: u64 {
        const LONG_PASSWORD                  = 0x0000_0001;
        const FOUND_ROWS                     = 0x0000_0002;
        const LONG_FLAG                      = 0x0000_0004;
        const CONNECT_WITH_DB                = 0x0000_0008;
        const NO_SCHEMA                      = 0x0000_0010;
        const COMPRESS                       = 0x0000_0020;
        const ODBC                           = 0x0000_0040;
        const LOCAL_FILES                    = 0x0000_0080;
        const IGNORE_SPACE                   = 0x0000_0100;
        const PROTOCOL_41                    = 0x0000_0200;
        const INTERACTIVE                    = 0x0000_0400;
        const SSL                            = 0x0000_0800;
        const IGNORE_SIGPIPE                 = 0x0000_1000;
        const TRANSACTIONS                   = 0x0000_2000;
        const RESERVED                       = 0x0000_4000;
        const SECURE_CONNECTION              = 0x0000_8000;
        const MULTI_STATEMENTS               = 0x0001_0000;
        const MULTI_RESULTS                  = 0x0002_0000;
        const PS_MULTI_RESULTS               = 0x0004_0000;
        const PLUGIN_AUTH                    = 0x0008_0000;
        const CONNECT_ATTRS                  = 0x0010_0000;
        const PLUGIN_AUTH_LENENC_CLIENT_DATA = 0x0020_0000;
        const CAN_HANDLE_EXPIRED_PASSWORDS   = 0x0040_0000;
        const SESSION_TRACK                  = 0x0080_0000;
        const DEPRECATE_EOF                  = 0x0100_0000;
        const OPTIONAL_RESULTSET_METADATA    = 0x0200_0000;
        const ZSTD_COMPRESSION_ALGORITHM     = 0x0400_0000;
        const CLIENT_MYSQL                   = 0x8000_0000_0000_0000;
    }
}

impl Capabilities {
    /// The capabilities this engine requires unconditionally (spec §3).
    pub const MANDATORY: Capabilities = Capabilities::LONG_PASSWORD
        .union(Capabilities::PROTOCOL_41)
        .union(Capabilities::SECURE_CONNECTION)
        .union(Capabilities::PLUGIN_AUTH)
        .union(Capabilities::PLUGIN_AUTH_LENENC_CLIENT_DATA)
        .union(Capabilities::DEPRECATE_EOF);
}

bitflags! {
    /// Server status flags (spec §3 Session state, §6 OK packet).
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct ServerStatus: u16 {
        const AUTOCOMMIT              = 0x0002;
        const MORE_RESULTS_EXIST      = 0x0008;
        const NO_GOOD_INDEX_USED      = 0x0010;
        const NO_INDEX_USED           = 0x0020;
        const CURSOR_EXISTS           = 0x0040;
        const LAST_ROW_SENT           = 0x0080;
        const DB_DROPPED              = 0x0100;
        const NO_BACKSLASH_ESCAPES    = 0x0200;
        const METADATA_CHANGED        = 0x0400;
        const QUERY_WAS_SLOW          = 0x0800;
        const PS_OUT_PARAMS           = 0x1000;
        const IN_TRANS_READONLY       = 0x2000;
        const SESSION_STATE_CHANGED   = 0x4000;
    }
}

/// Header byte values that identify a packet's kind at the start of a resultset or row
/// stream (spec §4.6, §6).
pub mod header_byte {
    pub const OK: u8 = 0x00;
    pub const ERR: u8 = 0xFF;
    pub const EOF: u8 = 0xFE;
    pub const LOCAL_INFILE: u8 = 0xFB;
}
