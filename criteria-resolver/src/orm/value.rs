//! Values carried by search-object fields
//!
//! A field's Rust value becomes one of three things when a query is built:
//! - absent (`None`), which means "no filter" and yields no predicate
//! - a single [`SqlValue`]
//! - a list of [`SqlValue`]s, for `in` / `not_in` membership tests

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use sqlx::Sqlite;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use uuid::Uuid;
use uuid::fmt::Hyphenated;

/// Represents a SQL value that can be bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Bind this value to a sqlx query
    pub fn bind_to_query<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqlValue::String(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
            SqlValue::Blob(bytes) => query.bind(bytes.as_slice()),
        }
    }

    /// Strings and numbers order meaningfully; booleans are rejected for
    /// ordering comparisons.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, SqlValue::Bool(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::String(_) => "string",
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Bool(_) => "boolean",
            SqlValue::Blob(_) => "blob",
        }
    }

    /// Text form used for substring matching
    pub fn to_pattern_text(&self) -> String {
        match self {
            SqlValue::String(s) => s.clone(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Bool(b) => b.to_string(),
            SqlValue::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::String(value.clone())
    }
}

macro_rules! int_sql_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::Int(i64::from(value))
                }
            }
        )*
    };
}

int_sql_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float(f64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

// Temporal and UUID values use the exact encodings sqlx writes for these
// types, so a filter compares equal to a value stored through `.bind()`.

/// 16-byte BLOB, as sqlx encodes `Uuid`
impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Blob(value.as_bytes().to_vec())
    }
}

/// Hyphenated TEXT, for tables that store UUIDs as strings
impl From<Hyphenated> for SqlValue {
    fn from(value: Hyphenated) -> Self {
        SqlValue::String(value.to_string())
    }
}

/// `%F`
impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::String(value.format("%F").to_string())
    }
}

/// `%F %T%.f`
impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::String(value.format("%F %T%.f").to_string())
    }
}

/// RFC 3339 with a numeric `+00:00` offset
impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::String(value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }
}

/// The value of a populated search field.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaValue {
    Single(SqlValue),
    List(Vec<SqlValue>),
}

/// Conversion from a search-object field to its criteria value.
///
/// Returning `None` means the field is absent and contributes no predicate.
pub trait FieldValue {
    fn criteria_value(&self) -> Option<CriteriaValue>;
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn criteria_value(&self) -> Option<CriteriaValue> {
        self.as_ref().and_then(FieldValue::criteria_value)
    }
}

impl<T: FieldValue + ?Sized> FieldValue for &T {
    fn criteria_value(&self) -> Option<CriteriaValue> {
        (**self).criteria_value()
    }
}

impl FieldValue for str {
    fn criteria_value(&self) -> Option<CriteriaValue> {
        Some(CriteriaValue::Single(SqlValue::from(self)))
    }
}

macro_rules! scalar_field_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn criteria_value(&self) -> Option<CriteriaValue> {
                    Some(CriteriaValue::Single(SqlValue::from(self.clone())))
                }
            }
        )*
    };
}

scalar_field_value!(
    String,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    bool,
    Uuid,
    Hyphenated,
    NaiveDate,
    NaiveDateTime,
    DateTime<Utc>
);

fn list_value<'a, T, I>(items: I) -> Option<CriteriaValue>
where
    T: Clone + Into<SqlValue> + 'a,
    I: IntoIterator<Item = &'a T>,
{
    Some(CriteriaValue::List(
        items.into_iter().cloned().map(Into::into).collect(),
    ))
}

impl<T: Clone + Into<SqlValue>> FieldValue for [T] {
    fn criteria_value(&self) -> Option<CriteriaValue> {
        list_value(self)
    }
}

impl<T: Clone + Into<SqlValue>> FieldValue for Vec<T> {
    fn criteria_value(&self) -> Option<CriteriaValue> {
        list_value(self)
    }
}

impl<T: Clone + Into<SqlValue>> FieldValue for BTreeSet<T> {
    fn criteria_value(&self) -> Option<CriteriaValue> {
        list_value(self)
    }
}

impl<T: Clone + Into<SqlValue>, S> FieldValue for HashSet<T, S> {
    fn criteria_value(&self) -> Option<CriteriaValue> {
        list_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_none_is_absent() {
        let name: Option<String> = None;
        assert_eq!(name.criteria_value(), None);

        let nested: Option<Option<i32>> = Some(None);
        assert_eq!(nested.criteria_value(), None);
    }

    #[test]
    fn test_scalars_are_single() {
        assert_eq!(
            Some("abc".to_string()).criteria_value(),
            Some(CriteriaValue::Single(SqlValue::String("abc".to_string())))
        );
        assert_eq!(
            42u32.criteria_value(),
            Some(CriteriaValue::Single(SqlValue::Int(42)))
        );
        assert_eq!(
            true.criteria_value(),
            Some(CriteriaValue::Single(SqlValue::Bool(true)))
        );
    }

    #[test]
    fn test_collections_are_lists() {
        let ids: BTreeSet<i64> = [3, 1, 2].into_iter().collect();
        assert_eq!(
            ids.criteria_value(),
            Some(CriteriaValue::List(vec![
                SqlValue::Int(1),
                SqlValue::Int(2),
                SqlValue::Int(3)
            ]))
        );

        let statuses = Some(vec!["open", "done"]);
        assert_eq!(
            statuses.criteria_value(),
            Some(CriteriaValue::List(vec![
                SqlValue::String("open".to_string()),
                SqlValue::String("done".to_string())
            ]))
        );

        let empty: Vec<i32> = Vec::new();
        assert_eq!(empty.criteria_value(), Some(CriteriaValue::List(vec![])));
    }

    #[test]
    fn test_temporal_text_forms() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            SqlValue::from(date),
            SqlValue::String("2024-03-09".to_string())
        );

        let stamp = date.and_hms_opt(7, 5, 0).unwrap();
        assert_eq!(
            SqlValue::from(stamp),
            SqlValue::String("2024-03-09 07:05:00".to_string())
        );
        assert_eq!(
            SqlValue::from(stamp.and_utc()),
            SqlValue::String("2024-03-09T07:05:00+00:00".to_string())
        );

        // Sub-second precision is kept
        let precise = date.and_hms_milli_opt(7, 5, 0, 300).unwrap();
        assert_eq!(
            SqlValue::from(precise),
            SqlValue::String("2024-03-09 07:05:00.300".to_string())
        );
        assert_eq!(
            SqlValue::from(precise.and_utc()),
            SqlValue::String("2024-03-09T07:05:00.300+00:00".to_string())
        );
    }

    #[test]
    fn test_uuid_forms() {
        let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        assert_eq!(SqlValue::from(id), SqlValue::Blob(id.as_bytes().to_vec()));
        assert_eq!(
            SqlValue::from(id.hyphenated()),
            SqlValue::String("01234567-89ab-cdef-0123-456789abcdef".to_string())
        );
    }

    #[test]
    fn test_orderable() {
        assert!(SqlValue::Int(1).is_orderable());
        assert!(SqlValue::String("a".into()).is_orderable());
        assert!(!SqlValue::Bool(true).is_orderable());
    }
}
