//! Record types and request payload validation.

use serde::{de, Deserialize, Deserializer, Serialize};

/// One anime entry as stored and served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier, immutable after creation.
    pub id: String,
    pub name: String,
    pub genre: String,
    pub year: i32,
    pub author: String,
}

impl Record {
    pub(crate) fn from_fields(id: String, fields: RecordFields) -> Self {
        Self {
            id,
            name: fields.name,
            genre: fields.genre,
            year: fields.year,
            author: fields.author,
        }
    }

    /// Shallow merge: every field present in `patch` overwrites, the rest is kept.
    /// The id is never touched.
    pub(crate) fn apply(&mut self, patch: RecordPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
    }

    /// Case-insensitive name comparison.
    pub fn name_matches(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase() == needle_lower
    }
}

/// A complete, validated set of client-supplied fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub name: String,
    pub genre: String,
    pub year: i32,
    pub author: String,
}

/// Field-level update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub author: Option<String>,
}

impl From<RecordFields> for RecordPatch {
    fn from(fields: RecordFields) -> Self {
        Self {
            name: Some(fields.name),
            genre: Some(fields.genre),
            year: Some(fields.year),
            author: Some(fields.author),
        }
    }
}

/// Raw request body shape. Unknown keys, including a client `id`, are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPayload {
    pub name: Option<String>,
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "integral_year")]
    pub year: Option<i32>,
    pub author: Option<String>,
}

/// Accept any JSON number with no fractional part that fits an `i32` (`1988` or `1988.0`).
fn integral_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let year = match number.as_i64() {
        Some(i) => i32::try_from(i).ok(),
        None => number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64)
            .map(|f| f as i32),
    };

    year.map(Some)
        .ok_or_else(|| de::Error::custom(format!("year {number} is not an integer")))
}

/// Required fields that were absent or falsy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing or empty fields: {}", .missing.join(", "))]
pub struct FieldError {
    pub missing: Vec<&'static str>,
}

impl RecordPayload {
    /// Require all four fields to be present and truthy (non-empty strings, non-zero year).
    pub fn validate(self) -> Result<RecordFields, FieldError> {
        let mut missing = Vec::new();

        let name = non_empty(self.name, "name", &mut missing);
        let genre = non_empty(self.genre, "genre", &mut missing);
        let year = match self.year {
            Some(year) if year != 0 => Some(year),
            _ => {
                missing.push("year");
                None
            }
        };
        let author = non_empty(self.author, "author", &mut missing);

        match (name, genre, year, author) {
            (Some(name), Some(genre), Some(year), Some(author)) => Ok(RecordFields {
                name,
                genre,
                year,
                author,
            }),
            _ => Err(FieldError { missing }),
        }
    }
}

fn non_empty(
    value: Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            missing.push(field);
            None
        }
    }
}
