//! JSON-to-Arrow projection of CORE paper records

use std::sync::Arc;

use arrow::array::*;
use arrow::datatypes::Schema;
use papertext_core::accumulator::list_utf8_array;
use papertext_core::{Accumulator, DEFAULT_BATCH_SIZE};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::schema;

// === Lenient field values ===
//
// A projected field whose JSON kind does not fit becomes null. Only a line
// that is not a JSON object at all is a parse error.

fn skip_seq<'de, A: SeqAccess<'de>>(mut seq: A) -> Result<(), A::Error> {
    while seq.next_element::<IgnoredAny>()?.is_some() {}
    Ok(())
}

fn skip_map<'de, A: MapAccess<'de>>(mut map: A) -> Result<(), A::Error> {
    while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
    Ok(())
}

/// String value; integers are kept as decimal text only when `ints` is set
struct TextVisitor {
    ints: bool,
}

impl<'de> Visitor<'de> for TextVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "a string")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(self.ints.then(|| v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(self.ints.then(|| v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
        Ok(Some(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Self::Value, E> {
        Ok(Some(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
        skip_seq(seq)?;
        Ok(None)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        skip_map(map)?;
        Ok(None)
    }
}

/// `title`, `datePublished`, `fullText` and list items: strings only
struct Text(Option<String>);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(TextVisitor { ints: false })
            .map(Text)
    }
}

/// `coreId` appears as a string in most dumps and as an integer in some
struct Id(Option<String>);

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(TextVisitor { ints: true })
            .map(Id)
    }
}

/// `authors` / `relations`: an array of strings; a bare string is a one-item list
struct TextList(Option<Vec<Option<String>>>);

impl<'de> Deserialize<'de> for TextList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListVisitor;

        impl<'de> Visitor<'de> for ListVisitor {
            type Value = Option<Vec<Option<String>>>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of strings")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(self)
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
                Ok(Some(vec![Some(s.to_owned())]))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(Text(item)) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Some(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                skip_map(map)?;
                Ok(None)
            }
        }

        deserializer.deserialize_any(ListVisitor).map(TextList)
    }
}

/// `year` is an integer, an integral float, or a numeric string; anything else is null
struct Year(Option<i64>);

impl<'de> Deserialize<'de> for Year {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct YearVisitor;

        impl<'de> Visitor<'de> for YearVisitor {
            type Value = Option<i64>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an integer year, a numeric string, or null")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_any(self)
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Some(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(i64::try_from(v).ok())
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                    Ok(Some(v as i64))
                } else {
                    Ok(None)
                }
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(None);
                }
                match s.parse::<i64>() {
                    Ok(v) => Ok(Some(v)),
                    Err(_) => {
                        log::debug!("non-numeric year '{s}', using null");
                        Ok(None)
                    }
                }
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
                skip_seq(seq)?;
                Ok(None)
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                skip_map(map)?;
                Ok(None)
            }
        }

        deserializer.deserialize_any(YearVisitor).map(Year)
    }
}

// === Typed row structs ===

/// One archive line, reduced to the projected keys at deserialization time.
///
/// Unknown keys are skipped without allocation; absent keys, JSON `null`
/// and values of the wrong kind all become `None`. A repeated key keeps
/// its last value.
#[derive(Debug, Default)]
pub struct PaperRecord {
    pub core_id: Option<String>,
    pub title: Option<String>,
    pub authors: Option<Vec<Option<String>>>,
    pub date_published: Option<String>,
    pub full_text: Option<String>,
    pub relations: Option<Vec<Option<String>>>,
    pub year: Option<i64>,
}

/// Keys of the projected fields
enum Field {
    CoreId,
    Title,
    Authors,
    DatePublished,
    FullText,
    Relations,
    Year,
    Other,
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;

        impl<'de> Visitor<'de> for FieldVisitor {
            type Value = Field;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an object key")
            }

            fn visit_str<E: de::Error>(self, key: &str) -> Result<Field, E> {
                Ok(match key {
                    "coreId" => Field::CoreId,
                    "title" => Field::Title,
                    "authors" => Field::Authors,
                    "datePublished" => Field::DatePublished,
                    "fullText" => Field::FullText,
                    "relations" => Field::Relations,
                    "year" => Field::Year,
                    _ => Field::Other,
                })
            }
        }

        deserializer.deserialize_identifier(FieldVisitor)
    }
}

impl<'de> Deserialize<'de> for PaperRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = PaperRecord;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<PaperRecord, A::Error> {
                let mut rec = PaperRecord::default();
                while let Some(key) = map.next_key::<Field>()? {
                    match key {
                        Field::CoreId => rec.core_id = map.next_value::<Id>()?.0,
                        Field::Title => rec.title = map.next_value::<Text>()?.0,
                        Field::Authors => rec.authors = map.next_value::<TextList>()?.0,
                        Field::DatePublished => {
                            rec.date_published = map.next_value::<Text>()?.0;
                        }
                        Field::FullText => rec.full_text = map.next_value::<Text>()?.0,
                        Field::Relations => rec.relations = map.next_value::<TextList>()?.0,
                        Field::Year => rec.year = map.next_value::<Year>()?.0,
                        Field::Other => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(rec)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// A record that carries full text, ready for the accumulator
#[derive(Debug, Clone, PartialEq)]
pub struct FullTextRow {
    pub core_id: Option<String>,
    pub title: Option<String>,
    pub authors: Option<Vec<Option<String>>>,
    pub date_published: Option<String>,
    pub full_text: String,
    pub relations: Option<Vec<Option<String>>>,
    pub year: Option<i64>,
}

impl PaperRecord {
    /// Keep the record only when `fullText` is present and non-empty.
    ///
    /// Whitespace-only text counts as present.
    pub fn into_full_text_row(self) -> Option<FullTextRow> {
        let full_text = self.full_text.filter(|t| !t.is_empty())?;
        Some(FullTextRow {
            core_id: self.core_id,
            title: self.title,
            authors: self.authors,
            date_published: self.date_published,
            full_text,
            relations: self.relations,
            year: self.year,
        })
    }
}

// === Accumulator ===

/// Column buffers for [`FullTextRow`]s, producing [`schema::FULLTEXT`] batches
pub struct FullTextAccumulator {
    schema: Arc<Schema>,
    core_id: Vec<Option<String>>,
    title: Vec<Option<String>>,
    authors: Vec<Option<Vec<Option<String>>>>,
    date_published: Vec<Option<String>>,
    full_text: Vec<String>,
    relations: Vec<Option<Vec<Option<String>>>>,
    year: Vec<Option<i64>>,
}

impl Default for FullTextAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FullTextAccumulator {
    pub fn new() -> Self {
        Self {
            schema: schema::fulltext().clone(),
            core_id: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            title: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            authors: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            date_published: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            full_text: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            relations: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            year: Vec::with_capacity(DEFAULT_BATCH_SIZE),
        }
    }
}

impl Accumulator for FullTextAccumulator {
    type Row = FullTextRow;

    fn push(&mut self, row: FullTextRow) {
        self.core_id.push(row.core_id);
        self.title.push(row.title);
        self.authors.push(row.authors);
        self.date_published.push(row.date_published);
        self.full_text.push(row.full_text);
        self.relations.push(row.relations);
        self.year.push(row.year);
    }

    fn len(&self) -> usize {
        self.full_text.len()
    }

    fn take_batch(&mut self) -> Result<RecordBatch, arrow::error::ArrowError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(std::mem::take(&mut self.core_id))),
            Arc::new(StringArray::from(std::mem::take(&mut self.title))),
            list_utf8_array(std::mem::take(&mut self.authors)),
            Arc::new(StringArray::from(std::mem::take(&mut self.date_published))),
            Arc::new(StringArray::from(std::mem::take(&mut self.full_text))),
            list_utf8_array(std::mem::take(&mut self.relations)),
            Arc::new(Int64Array::from(std::mem::take(&mut self.year))),
        ];
        RecordBatch::try_new(self.schema.clone(), arrays)
    }
}
