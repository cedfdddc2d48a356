//! Column definition packets and the wire-type → semantic-type map (spec §6).

use bitflags::bitflags;

use crate::codec::{get_int_lenenc, get_str_lenenc, BufExt};
use crate::error::Error;

/// MySQL wire type codes (spec §6 table). Named per the MySQL/MariaDB source rather than
/// grouped by semantic family, since that's how the wire actually identifies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType(pub u8);

impl ColumnType {
    pub const DECIMAL: ColumnType = ColumnType(0);
    pub const TINY: ColumnType = ColumnType(1);
    pub const SHORT: ColumnType = ColumnType(2);
    pub const LONG: ColumnType = ColumnType(3);
    pub const FLOAT: ColumnType = ColumnType(4);
    pub const DOUBLE: ColumnType = ColumnType(5);
    pub const NULL: ColumnType = ColumnType(6);
    pub const TIMESTAMP: ColumnType = ColumnType(7);
    pub const LONGLONG: ColumnType = ColumnType(8);
    pub const INT24: ColumnType = ColumnType(9);
    pub const DATE: ColumnType = ColumnType(10);
    pub const TIME: ColumnType = ColumnType(11);
    pub const DATETIME: ColumnType = ColumnType(12);
    pub const YEAR: ColumnType = ColumnType(13);
    pub const VARCHAR: ColumnType = ColumnType(15);
    pub const BIT: ColumnType = ColumnType(16);
    pub const NEWDECIMAL: ColumnType = ColumnType(246);
    pub const ENUM: ColumnType = ColumnType(247);
    pub const SET: ColumnType = ColumnType(248);
    pub const TINY_BLOB: ColumnType = ColumnType(249);
    pub const MEDIUM_BLOB: ColumnType = ColumnType(250);
    pub const LONG_BLOB: ColumnType = ColumnType(251);
    pub const BLOB: ColumnType = ColumnType(252);
    pub const VAR_STRING: ColumnType = ColumnType(253);
    pub const STRING: ColumnType = ColumnType(254);
    pub const GEOMETRY: ColumnType = ColumnType(255);

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::TINY | Self::SHORT | Self::LONG | Self::INT24 | Self::LONGLONG | Self::YEAR
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::FLOAT | Self::DOUBLE)
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::DATE | Self::DATETIME | Self::TIMESTAMP | Self::TIME
        )
    }

    /// Human-readable name for use in metadata-check diagnostics (spec §4.6, S6).
    pub fn name(self) -> &'static str {
        match self {
            Self::DECIMAL => "DECIMAL",
            Self::TINY => "TINYINT",
            Self::SHORT => "SMALLINT",
            Self::LONG => "INT",
            Self::FLOAT => "FLOAT",
            Self::DOUBLE => "DOUBLE",
            Self::NULL => "NULL",
            Self::TIMESTAMP => "TIMESTAMP",
            Self::LONGLONG => "BIGINT",
            Self::INT24 => "MEDIUMINT",
            Self::DATE => "DATE",
            Self::TIME => "TIME",
            Self::DATETIME => "DATETIME",
            Self::YEAR => "YEAR",
            Self::VARCHAR => "VARCHAR",
            Self::BIT => "BIT",
            Self::NEWDECIMAL => "DECIMAL",
            Self::ENUM => "ENUM",
            Self::SET => "SET",
            Self::TINY_BLOB => "TINYBLOB",
            Self::MEDIUM_BLOB => "MEDIUMBLOB",
            Self::LONG_BLOB => "LONGBLOB",
            Self::BLOB => "BLOB",
            Self::VAR_STRING => "VARCHAR",
            Self::STRING => "CHAR",
            Self::GEOMETRY => "GEOMETRY",
            _ => "UNKNOWN",
        }
    }
}

bitflags! {
    /// Column attribute flags (spec §3 Metadata).
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct ColumnFlags: u16 {
        const NOT_NULL       = 0x0001;
        const PRIMARY_KEY    = 0x0002;
        const UNIQUE_KEY     = 0x0004;
        const MULTIPLE_KEY   = 0x0008;
        const BLOB           = 0x0010;
        const UNSIGNED       = 0x0020;
        const ZEROFILL       = 0x0040;
        const BINARY         = 0x0080;
        const ENUM           = 0x0100;
        const AUTO_INCREMENT = 0x0200;
        const TIMESTAMP      = 0x0400;
        const SET            = 0x0800;
        const NO_DEFAULT_VALUE = 0x1000;
        const ON_UPDATE_NOW  = 0x2000;
    }
}

/// Two-mode metadata retention (spec §3 Metadata).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataMode {
    /// Keep only the fields required for parsing (name, type, flags, collation, length,
    /// decimals).
    #[default]
    Minimal,
    /// Additionally retain database/table/original-table/original-name.
    Full,
}

/// A column definition (spec §3 Metadata, §6 Column definition packet).
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub schema: Option<Box<str>>,
    pub table: Option<Box<str>>,
    pub org_table: Option<Box<str>>,
    pub name: Box<str>,
    pub org_name: Box<str>,
    pub collation: u16,
    pub column_length: u32,
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
    pub decimals: u8,
}

impl ColumnDefinition {
    pub fn decode(mut buf: &[u8], mode: MetadataMode) -> Result<Self, Error> {
        let catalog = get_str_lenenc(&mut buf)?;
        debug_assert_eq!(catalog, "def");
        let schema = get_str_lenenc(&mut buf)?;
        let table = get_str_lenenc(&mut buf)?;
        let org_table = get_str_lenenc(&mut buf)?;
        let name = get_str_lenenc(&mut buf)?;
        let org_name = get_str_lenenc(&mut buf)?;

        let fixed_len = get_int_lenenc(&mut buf)?;
        if fixed_len != 0x0C {
            return Err(Error::ProtocolValueError(format!(
                "expected column definition fixed-length marker 0x0C, got {fixed_len:#x}"
            )));
        }

        let collation = buf.get_u16_le_checked("column collation")?;
        let column_length = buf.get_u32_le_checked("column length")?;
        let column_type = ColumnType(buf.get_u8_checked("column type")?);
        let flags = ColumnFlags::from_bits_truncate(buf.get_u16_le_checked("column flags")?);
        let decimals = buf.get_u8_checked("column decimals")?;
        // 2 filler bytes, always zero.
        let _ = buf.checked_take(2, "column definition filler")?;

        Ok(ColumnDefinition {
            schema: (mode == MetadataMode::Full && !schema.is_empty()).then(|| schema.into()),
            table: (mode == MetadataMode::Full && !table.is_empty()).then(|| table.into()),
            org_table: (mode == MetadataMode::Full && !org_table.is_empty())
                .then(|| org_table.into()),
            name: if mode == MetadataMode::Full {
                name.into()
            } else {
                String::new().into_boxed_str()
            },
            org_name: if mode == MetadataMode::Full {
                org_name.into()
            } else {
                String::new().into_boxed_str()
            },
            collation,
            column_length,
            column_type,
            flags,
            decimals,
        })
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED)
    }

    pub fn is_binary(&self) -> bool {
        self.flags.contains(ColumnFlags::BINARY)
    }

    pub fn not_null(&self) -> bool {
        self.flags.contains(ColumnFlags::NOT_NULL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::put_str_lenenc;

    fn sample_column_def() -> Vec<u8> {
        let mut buf = Vec::new();
        put_str_lenenc(&mut buf, "def");
        put_str_lenenc(&mut buf, "mydb");
        put_str_lenenc(&mut buf, "t");
        put_str_lenenc(&mut buf, "t");
        put_str_lenenc(&mut buf, "id");
        put_str_lenenc(&mut buf, "id");
        crate::codec::put_uint_lenenc(&mut buf, 0x0C);
        buf.extend_from_slice(&33u16.to_le_bytes());
        buf.extend_from_slice(&11u32.to_le_bytes());
        buf.push(ColumnType::LONG.0);
        buf.extend_from_slice(
            &(ColumnFlags::NOT_NULL | ColumnFlags::PRIMARY_KEY)
                .bits()
                .to_le_bytes(),
        );
        buf.push(0);
        buf.extend_from_slice(&[0, 0]);
        buf
    }

    #[test]
    fn decodes_minimal_metadata() {
        let buf = sample_column_def();
        let col = ColumnDefinition::decode(&buf, MetadataMode::Minimal).unwrap();
        assert_eq!(&*col.name, "", "minimal mode must not retain the column name");
        assert!(col.schema.is_none());
        assert_eq!(&*col.org_name, "");
        assert_eq!(col.column_type, ColumnType::LONG);
        assert!(col.not_null());
    }

    #[test]
    fn decodes_full_metadata() {
        let buf = sample_column_def();
        let col = ColumnDefinition::decode(&buf, MetadataMode::Full).unwrap();
        assert_eq!(col.schema.as_deref(), Some("mydb"));
        assert_eq!(&*col.name, "id");
        assert_eq!(&*col.org_name, "id");
    }
}
