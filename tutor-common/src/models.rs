//! Wire models exchanged with the progress-tracking API
//!
//! Field names follow the API's JSON (`book_name`, `duration`, `is_master`);
//! the Rust side uses descriptive names and renames at the serde boundary.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Master catalog identifier
pub type CatalogId = i64;

/// Preset identifier
pub type PresetId = i64;

/// Student identifier
pub type StudentId = i64;

/// `null` and missing durations both read as zero hours
fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Parse a JSON data file such as an admissions or assignments export
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T> {
    serde_json::from_str(content).map_err(|e| Error::Parse(e.to_string()))
}

/// One entry of the master reference-book catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBook {
    pub id: CatalogId,
    pub subject: String,
    pub level: String,
    #[serde(rename = "book_name")]
    pub name: String,
    /// Planning estimate in hours
    #[serde(rename = "duration", default, deserialize_with = "null_as_zero")]
    pub duration_hours: f64,
}

/// A book reference inside a preset
///
/// `catalog_id` is set when the preset entry resolves to a catalog book;
/// entries that exist only inside the preset carry `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetBookRef {
    #[serde(rename = "id", default)]
    pub catalog_id: Option<CatalogId>,
    pub subject: String,
    pub level: String,
    #[serde(rename = "book_name")]
    pub name: String,
    #[serde(rename = "duration", default, deserialize_with = "null_as_zero")]
    pub duration_hours: f64,
    #[serde(rename = "is_master", default)]
    pub is_from_catalog: bool,
}

/// A named, curated bundle of book references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub books: Vec<PresetBookRef>,
}

/// A non-catalog book in a batch create request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomBook {
    pub subject: String,
    pub level: String,
    #[serde(rename = "book_name")]
    pub name: String,
    #[serde(rename = "duration")]
    pub duration_hours: f64,
}

/// Body of `POST /dashboard/progress/batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCreateRequest {
    pub student_id: StudentId,
    #[serde(rename = "book_ids")]
    pub catalog_ids: Vec<CatalogId>,
    pub custom_books: Vec<CustomBook>,
}

impl BatchCreateRequest {
    /// Number of rows the request asks the API to create
    pub fn item_count(&self) -> usize {
        self.catalog_ids.len() + self.custom_books.len()
    }
}

/// Response of `POST /dashboard/progress/batch`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchCreateResponse {
    #[serde(default)]
    pub message: String,
}

impl BatchCreateResponse {
    /// Rows reported as created, parsed from messages like `"3 items added"`
    ///
    /// The API skips rows the student already has, so this can be lower
    /// than the number requested.
    pub fn added_count(&self) -> Option<usize> {
        self.message.split_whitespace().next()?.parse().ok()
    }
}

/// One progress-tracking row for a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressItem {
    pub id: i64,
    #[serde(default)]
    pub student_id: Option<StudentId>,
    pub subject: String,
    #[serde(default)]
    pub level: Option<String>,
    pub book_name: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub completed_units: i64,
    #[serde(default = "default_total_units")]
    pub total_units: i64,
    #[serde(default)]
    pub is_planned: Option<bool>,
    #[serde(default)]
    pub is_done: Option<bool>,
}

fn default_total_units() -> i64 {
    1
}

/// Instructor assignment of a student, used for access checks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentAssignment {
    pub student_id: StudentId,
    #[serde(default)]
    pub main_instructors: Vec<String>,
    #[serde(default)]
    pub sub_instructors: Vec<String>,
}

/// One university application tracked on the admission calendar
///
/// Dates are `YYYY-MM-DD` strings as stored by the API; any of them may be
/// absent or malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub university_name: String,
    #[serde(default)]
    pub faculty_name: String,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default)]
    pub exam_system: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<String>,
    #[serde(default)]
    pub exam_date: Option<String>,
    #[serde(default)]
    pub announcement_date: Option<String>,
    #[serde(default)]
    pub procedure_deadline: Option<String>,
}
