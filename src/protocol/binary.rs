//! The prepared-statement command set: `COM_STMT_PREPARE`, `COM_STMT_EXECUTE`,
//! `COM_STMT_FETCH`, `COM_STMT_RESET`, `COM_STMT_CLOSE`, and binary row decoding
//! (spec §4.3, §4.6).

use bytes::Bytes;

use crate::codec::{get_int_lenenc, BufExt, BufMutExt};
use crate::error::Error;
use crate::protocol::column::ColumnDefinition;
use crate::value::MySqlValue;

pub const COM_STMT_PREPARE: u8 = 0x16;
pub const COM_STMT_EXECUTE: u8 = 0x17;
pub const COM_STMT_FETCH: u8 = 0x1C;
pub const COM_STMT_CLOSE: u8 = 0x19;
pub const COM_STMT_RESET: u8 = 0x1A;

/// Cursor type for `COM_STMT_EXECUTE`; this crate only ever requests `NO_CURSOR` (spec §4.3
/// doesn't surface server-side cursors as a feature).
const CURSOR_TYPE_NO_CURSOR: u8 = 0x00;

pub struct ComStmtPrepare<'a>(pub &'a str);

impl ComStmtPrepare<'_> {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_STMT_PREPARE);
        out.extend_from_slice(self.0.as_bytes());
    }
}

/// Response to `COM_STMT_PREPARE` (spec §4.3 Prepared statement handle).
#[derive(Debug, Clone)]
pub struct ComStmtPrepareOk {
    pub statement_id: u32,
    pub num_columns: u16,
    pub num_params: u16,
    pub warning_count: u16,
}

impl ComStmtPrepareOk {
    pub fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let status = buf.get_u8_checked("COM_STMT_PREPARE_OK status")?;
        if status != 0 {
            return Err(Error::ProtocolValueError(format!(
                "expected COM_STMT_PREPARE_OK status byte 0x00, got {status:#04x}"
            )));
        }
        let statement_id = buf.get_u32_le_checked("COM_STMT_PREPARE_OK statement id")?;
        let num_columns = buf.get_u16_le_checked("COM_STMT_PREPARE_OK column count")?;
        let num_params = buf.get_u16_le_checked("COM_STMT_PREPARE_OK param count")?;
        let _ = buf.checked_take(1, "COM_STMT_PREPARE_OK filler")?;
        let warning_count = buf.get_u16_le_checked("COM_STMT_PREPARE_OK warning count")?;
        Ok(ComStmtPrepareOk {
            statement_id,
            num_columns,
            num_params,
            warning_count,
        })
    }
}

/// `COM_STMT_EXECUTE` (spec §4.3 binary parameters).
pub struct ComStmtExecute<'a> {
    pub statement_id: u32,
    pub params: &'a [MySqlValue],
    /// Whether to resend the parameter type list; required on first execution of a statement
    /// and whenever a bound value's type changed since the last execution (spec §4.3).
    pub new_params_bound: bool,
}

impl ComStmtExecute<'_> {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_STMT_EXECUTE);
        out.put_u32_le(self.statement_id);
        out.put_u8(CURSOR_TYPE_NO_CURSOR);
        out.put_u32_le(1); // iteration-count, always 1

        if self.params.is_empty() {
            return;
        }

        let bitmap = null_bitmap(self.params);
        out.extend_from_slice(&bitmap);
        out.put_u8(self.new_params_bound as u8);

        if self.new_params_bound {
            for value in self.params {
                let (ty, unsigned) = value.binary_param_type();
                out.put_u8(ty.0);
                out.put_u8(unsigned as u8);
            }
        }

        for value in self.params {
            if !value.is_null() {
                value.encode_binary_param(out);
            }
        }
    }
}

/// `NULL_BITMAP` for `COM_STMT_EXECUTE`: `(n + 7) / 8` bytes, bit `i` set when parameter `i`
/// is NULL (spec §4.3).
fn null_bitmap(params: &[MySqlValue]) -> Vec<u8> {
    let mut bitmap = vec![0u8; params.len().div_ceil(8)];
    for (i, value) in params.iter().enumerate() {
        if value.is_null() {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    bitmap
}

pub struct ComStmtFetch {
    pub statement_id: u32,
    pub num_rows: u32,
}

impl ComStmtFetch {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_STMT_FETCH);
        out.put_u32_le(self.statement_id);
        out.put_u32_le(self.num_rows);
    }
}

pub struct ComStmtReset {
    pub statement_id: u32,
}

impl ComStmtReset {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_STMT_RESET);
        out.put_u32_le(self.statement_id);
    }
}

/// `COM_STMT_CLOSE`: fire-and-forget, no response packet (spec §4.3 Statement lifetime).
pub struct ComStmtClose {
    pub statement_id: u32,
}

impl ComStmtClose {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_STMT_CLOSE);
        out.put_u32_le(self.statement_id);
    }
}

/// Decodes one binary-protocol row (spec §4.3 Binary rows): a leading `0x00` packet header, a
/// NULL bitmap offset by 2, then each non-NULL column's value in declaration order.
pub fn decode_binary_row(payload: &Bytes, columns: &[ColumnDefinition]) -> Result<Vec<MySqlValue>, Error> {
    let mut buf: &[u8] = payload;
    let header = buf.get_u8_checked("binary row header")?;
    if header != 0x00 {
        return Err(Error::ProtocolValueError(format!(
            "expected binary row header 0x00, got {header:#04x}"
        )));
    }

    let bitmap_len = (columns.len() + 7 + 2) / 8;
    let bitmap = buf.checked_take(bitmap_len, "binary row NULL bitmap")?;

    let mut values = Vec::with_capacity(columns.len());
    for (i, col) in columns.iter().enumerate() {
        let bit_pos = i + 2;
        let is_null = (bitmap[bit_pos / 8] >> (bit_pos % 8)) & 1 == 1;
        if is_null {
            values.push(MySqlValue::Null);
        } else {
            values.push(MySqlValue::decode_binary(col, &mut buf)?);
        }
    }

    if !buf.is_empty() {
        return Err(Error::ExtraBytes {
            what: "binary row",
            remaining: buf.len(),
        });
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::column::{ColumnFlags, ColumnType};

    fn int_col() -> ColumnDefinition {
        ColumnDefinition {
            schema: None,
            table: None,
            org_table: None,
            name: "n".into(),
            org_name: "".into(),
            collation: 63,
            column_length: 11,
            column_type: ColumnType::LONG,
            flags: ColumnFlags::empty(),
            decimals: 0,
        }
    }

    #[test]
    fn decodes_prepare_ok() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&7u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.push(0);
        buf.extend_from_slice(&0u16.to_le_bytes());
        let ok = ComStmtPrepareOk::decode(&buf).unwrap();
        assert_eq!(ok.statement_id, 7);
        assert_eq!(ok.num_columns, 1);
        assert_eq!(ok.num_params, 2);
    }

    #[test]
    fn execute_encodes_null_bitmap_and_types() {
        let params = vec![MySqlValue::Null, MySqlValue::Int(5)];
        let mut out = Vec::new();
        ComStmtExecute {
            statement_id: 1,
            params: &params,
            new_params_bound: true,
        }
        .encode(&mut out);

        // header(1) + id(4) + cursor(1) + iters(4) + bitmap(1) + new_params_bound(1) + 2 types(4)
        assert_eq!(out[10], 0b0000_0001); // bit 0 (first param) set
        assert_eq!(out[11], 1); // new_params_bound
    }

    #[test]
    fn binary_row_round_trips_single_int_column() {
        let columns = vec![int_col()];
        let mut payload = vec![0x00, 0b0000_0000]; // header + empty-ish bitmap (1 col -> 1 byte)
        payload.extend_from_slice(&42i32.to_le_bytes());
        let bytes = Bytes::from(payload);
        let row = decode_binary_row(&bytes, &columns).unwrap();
        assert_eq!(row[0], MySqlValue::Int(42));
    }

    #[test]
    fn binary_row_honors_null_bitmap() {
        let columns = vec![int_col()];
        // bit for column 0 is offset by 2 -> bit index 2 -> byte 0, bit 2
        let payload = vec![0x00, 0b0000_0100];
        let bytes = Bytes::from(payload);
        let row = decode_binary_row(&bytes, &columns).unwrap();
        assert_eq!(row[0], MySqlValue::Null);
    }
}
