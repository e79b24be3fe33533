//! Arrow schema for projected full-text records
//!
//! Column names follow the CORE JSON keys so downstream readers see the
//! same names as the source dump.

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema};

/// Projected columns, in output order
pub const COLUMNS: [&str; 7] = [
    "coreId",
    "title",
    "authors",
    "datePublished",
    "fullText",
    "relations",
    "year",
];

/// Full-text records schema shared by every checkpoint and the final output
pub static FULLTEXT: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("coreId", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("authors", list_utf8(), true),
        Field::new("datePublished", DataType::Utf8, true),
        // Rows without full text never reach the accumulator
        Field::new("fullText", DataType::Utf8, false),
        Field::new("relations", list_utf8(), true),
        Field::new("year", DataType::Int64, true),
    ]))
});

/// Helper: create List<Utf8> type
fn list_utf8() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

pub fn fulltext() -> &'static Arc<Schema> {
    &FULLTEXT
}

/// Same column names, order and types as [`FULLTEXT`].
///
/// Metadata is ignored; Parquet round trips may add some.
pub fn matches(other: &Schema) -> bool {
    let expected = fulltext().fields();
    let actual = other.fields();
    expected.len() == actual.len()
        && expected.iter().zip(actual.iter()).all(|(e, a)| {
            e.name() == a.name() && e.data_type() == a.data_type()
        })
}
