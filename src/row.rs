//! Rows and the static row-target interface (spec §3 Execution processor, §4.6 Typed parsing,
//! §9 "Template-heavy static interface").
//!
//! The original reflects struct/tuple fields onto columns at compile time. Rust has no
//! built-in reflection, so this module exposes the same capability as an explicit trait —
//! [`RowTarget`] — with adapters for tuples (positional, via a `impl_row_target_for_tuple!`
//! macro below) and a manually-implementable by-name path for named records, mirroring the
//! teacher's `Row`/`FromRow` split (`mysql/row.rs`, `row.rs`) rather than attempting macro-free
//! derive.

use std::sync::Arc;

use crate::error::Error;
use crate::protocol::column::ColumnDefinition;
use crate::value::{FromValue, MySqlValue};

/// One decoded row plus a shared view of its resultset's column metadata.
///
/// Metadata is `Arc`-shared across every row of one resultset rather than cloned per row,
/// grounded on the teacher's `scratch_row_columns` cache (`mysql/connection/executor.rs`):
/// rows are cheap to produce even for wide resultsets.
#[derive(Debug, Clone)]
pub struct MySqlRow {
    columns: Arc<[ColumnDefinition]>,
    values: Vec<MySqlValue>,
}

impl MySqlRow {
    pub fn new(columns: Arc<[ColumnDefinition]>, values: Vec<MySqlValue>) -> Self {
        MySqlRow { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| &*c.name == name)
    }

    pub fn value(&self, index: usize) -> Option<&MySqlValue> {
        self.values.get(index)
    }

    /// Decodes column `index` as `T`, failing `is-null` if the value is NULL and `T` isn't
    /// `Option<_>` (spec §7 `is-null` / `static-row-parsing-error`).
    pub fn try_get<T: FromValue>(&self, index: usize) -> Result<T, Error> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| Error::ProtocolValueError(format!("column index {index} out of range")))?;
        if value.is_null() {
            return T::from_null(index);
        }
        T::from_value(value).map_err(|cause| Error::StaticRowParsingError {
            index,
            mysql_type: self.columns[index].column_type.name().to_string(),
            cause,
        })
    }

    pub fn try_get_by_name<T: FromValue>(&self, name: &str) -> Result<T, Error> {
        let index = self
            .column_index(name)
            .ok_or_else(|| Error::ProtocolValueError(format!("no column named {name:?}")))?;
        self.try_get(index)
    }
}

/// A field the static interface expects, used for the metadata check (spec §4.6).
pub struct FieldDescriptor {
    /// `None` for tuple-style (positional) targets.
    pub name: Option<&'static str>,
    pub type_name: &'static str,
    pub nullable: bool,
}

/// A compile-time row shape that can be validated against and parsed from resultset metadata
/// (spec §9's `RowTarget` capability: `describe`, `meta-check`, `parse`).
pub trait RowTarget: Sized {
    fn describe() -> Vec<FieldDescriptor>;

    /// Builds the forward map *column → target slot* and validates compatibility, failing
    /// `metadata-check-failed` with a joined human-readable message on any mismatch
    /// (spec §4.6, S6).
    fn meta_check(columns: &[ColumnDefinition]) -> Result<Vec<usize>, Error>;

    fn parse(row: &MySqlRow, mapping: &[usize]) -> Result<Self, Error>;
}

macro_rules! impl_row_target_for_tuple {
    ($($idx:tt : $T:ident),+) => {
        impl<$($T: FromValue + 'static),+> RowTarget for ($($T,)+) {
            fn describe() -> Vec<FieldDescriptor> {
                vec![$(FieldDescriptor {
                    name: None,
                    type_name: $T::TYPE_NAME,
                    nullable: $T::NULLABLE,
                }),+]
            }

            fn meta_check(columns: &[ColumnDefinition]) -> Result<Vec<usize>, Error> {
                let descriptors = Self::describe();
                if columns.len() < descriptors.len() {
                    return Err(Error::MetadataCheckFailed(format!(
                        "expected at least {} column(s), resultset has {}",
                        descriptors.len(),
                        columns.len()
                    )));
                }
                let mut problems = Vec::new();
                $(
                    if !$T::compatible_with(&columns[$idx]) {
                        problems.push(format!(
                            "column {} ({:?}): {} not compatible with {}",
                            $idx,
                            columns[$idx].name,
                            $T::TYPE_NAME,
                            columns[$idx].column_type.name()
                        ));
                    }
                )+
                if !problems.is_empty() {
                    return Err(Error::MetadataCheckFailed(problems.join("; ")));
                }
                Ok(vec![$($idx),+])
            }

            fn parse(row: &MySqlRow, mapping: &[usize]) -> Result<Self, Error> {
                Ok(($(row.try_get::<$T>(mapping[$idx])?,)+))
            }
        }
    };
}

impl_row_target_for_tuple!(0: A);
impl_row_target_for_tuple!(0: A, 1: B);
impl_row_target_for_tuple!(0: A, 1: B, 2: C);
impl_row_target_for_tuple!(0: A, 1: B, 2: C, 3: D);
impl_row_target_for_tuple!(0: A, 1: B, 2: C, 3: D, 4: E);
impl_row_target_for_tuple!(0: A, 1: B, 2: C, 3: D, 4: E, 5: F);
impl_row_target_for_tuple!(0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G);
impl_row_target_for_tuple!(0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H);

/// Manual by-name adapter for named records (spec §9: "Provide adapters for ... named records
/// (by-name)"). Rust has no derive in this crate, so implementers list their own fields; see
/// `tests/` for an example.
pub trait FromRow: Sized {
    /// `[(field name, type name, nullable)]`, in declaration order.
    fn field_names() -> &'static [(&'static str, &'static str, bool)];

    fn from_named_row(row: &MySqlRow) -> Result<Self, Error>;

    /// Validates that every named field is present with a compatible type, failing
    /// `metadata-check-failed` otherwise (spec §4.6: "absent names fail; extras are ignored").
    fn meta_check(columns: &[ColumnDefinition]) -> Result<(), Error> {
        let mut problems = Vec::new();
        for (name, type_name, _nullable) in Self::field_names() {
            match columns.iter().find(|c| &*c.name == *name) {
                None => problems.push(format!("missing expected column {name:?}")),
                Some(col) => {
                    if !crate::value::compatible_by_type_name(type_name, col) {
                        problems.push(format!(
                            "column {name:?}: {type_name} not compatible with {}",
                            col.column_type.name()
                        ));
                    }
                }
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::MetadataCheckFailed(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::column::{ColumnFlags, ColumnType};
    use std::sync::Arc;

    fn col(name: &str, ty: ColumnType, unsigned: bool) -> ColumnDefinition {
        ColumnDefinition {
            schema: None,
            table: None,
            org_table: None,
            name: name.into(),
            org_name: "".into(),
            collation: 33,
            column_length: 20,
            column_type: ty,
            flags: if unsigned {
                ColumnFlags::UNSIGNED
            } else {
                ColumnFlags::empty()
            },
            decimals: 0,
        }
    }

    #[test]
    fn tuple_target_parses_matching_row() {
        let columns: Arc<[ColumnDefinition]> =
            vec![col("a", ColumnType::VAR_STRING, false), col("b", ColumnType::LONG, false)].into();
        let mapping = <(String, i64)>::meta_check(&columns).unwrap();
        let row = MySqlRow::new(
            columns,
            vec![
                MySqlValue::Bytes(bytes::Bytes::from_static(b"a")),
                MySqlValue::Int(1),
            ],
        );
        let parsed: (String, i64) = RowTarget::parse(&row, &mapping).unwrap();
        assert_eq!(parsed, ("a".to_string(), 1));
    }

    #[test]
    fn tuple_target_rejects_incompatible_type() {
        let columns: Arc<[ColumnDefinition]> = vec![col("n", ColumnType::VAR_STRING, false)].into();
        let err = <(i64,)>::meta_check(&columns).unwrap_err();
        assert!(matches!(err, Error::MetadataCheckFailed(_)));
    }

    #[test]
    fn try_get_reports_is_null() {
        let columns: Arc<[ColumnDefinition]> = vec![col("n", ColumnType::LONG, false)].into();
        let row = MySqlRow::new(columns, vec![MySqlValue::Null]);
        let err = row.try_get::<i64>(0).unwrap_err();
        assert!(matches!(err, Error::IsNull(0)));
        assert!(row.try_get::<Option<i64>>(0).unwrap().is_none());
    }
}
