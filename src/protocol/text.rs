//! The text command set: `COM_QUERY` and text-protocol row decoding (spec §4.3, §4.6).

use bytes::Bytes;

use crate::codec::{get_int_lenenc, BufMutExt};
use crate::error::Error;
use crate::protocol::column::ColumnDefinition;
use crate::value::MySqlValue;

pub const COM_QUERY: u8 = 0x03;

pub struct ComQuery<'a>(pub &'a str);

impl ComQuery<'_> {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.put_u8(COM_QUERY);
        out.extend_from_slice(self.0.as_bytes());
    }
}

/// Decodes one text-protocol row (spec §4.3 Text rows): each field is `0xFB` (NULL) or a
/// length-encoded string parsed per the column's declared type.
pub fn decode_text_row(payload: &Bytes, columns: &[ColumnDefinition]) -> Result<Vec<MySqlValue>, Error> {
    let mut buf: &[u8] = payload;
    let mut values = Vec::with_capacity(columns.len());

    for col in columns {
        if buf.first() == Some(&crate::codec::NULL_LENENC) {
            buf = &buf[1..];
            values.push(MySqlValue::Null);
            continue;
        }

        let len = get_int_lenenc(&mut buf)? as usize;
        if buf.len() < len {
            return Err(Error::IncompleteMessage(format!(
                "text row field for column {:?} declared {len} bytes, {} remaining",
                col.name,
                buf.len()
            )));
        }
        let field_start = payload.len() - buf.len();
        let field = payload.slice(field_start..field_start + len);
        buf = &buf[len..];

        values.push(MySqlValue::decode_text(col, field)?);
    }

    if !buf.is_empty() {
        return Err(Error::ExtraBytes {
            what: "text row",
            remaining: buf.len(),
        });
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::column::{ColumnFlags, ColumnType};

    fn string_col(name: &str) -> ColumnDefinition {
        ColumnDefinition {
            schema: None,
            table: None,
            org_table: None,
            name: name.into(),
            org_name: "".into(),
            collation: 33,
            column_length: 255,
            column_type: ColumnType::VAR_STRING,
            flags: ColumnFlags::empty(),
            decimals: 0,
        }
    }

    fn int_col(name: &str) -> ColumnDefinition {
        ColumnDefinition {
            schema: None,
            table: None,
            org_table: None,
            name: name.into(),
            org_name: "".into(),
            collation: 63,
            column_length: 11,
            column_type: ColumnType::LONG,
            flags: ColumnFlags::empty(),
            decimals: 0,
        }
    }

    #[test]
    fn decodes_two_rows_like_s3() {
        // SELECT 'a', 1
        let mut buf = Vec::new();
        crate::codec::put_str_lenenc(&mut buf, "a");
        crate::codec::put_str_lenenc(&mut buf, "1");
        let payload = Bytes::from(buf);

        let columns = vec![string_col("'a'"), int_col("1")];
        let row = decode_text_row(&payload, &columns).unwrap();
        assert_eq!(row[0], MySqlValue::Bytes(Bytes::from_static(b"a")));
        assert_eq!(row[1], MySqlValue::Int(1));
    }

    #[test]
    fn decodes_null_field() {
        let mut buf = vec![crate::codec::NULL_LENENC];
        crate::codec::put_str_lenenc(&mut buf, "x");
        let payload = Bytes::from(buf);
        let columns = vec![string_col("a"), string_col("b")];
        let row = decode_text_row(&payload, &columns).unwrap();
        assert_eq!(row[0], MySqlValue::Null);
        assert_eq!(row[1], MySqlValue::Bytes(Bytes::from_static(b"x")));
    }
}
