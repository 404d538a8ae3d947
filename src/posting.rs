//! Job postings as served by the upstream job-post API.
//!
//! The upstream shape is loosely typed, so everything here is coerced at the
//! boundary: unknown enum labels are kept as `Other`, nulls and wrongly typed
//! fields become defaults, and timestamps that cannot be parsed become `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::coerce::{
    lenient_items, lenient_label, lenient_string, lenient_strings, lenient_text, required_id,
};

/// Employment type of a posting. Unknown labels are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Other(String),
}

impl JobType {
    pub fn as_str(&self) -> &str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
            JobType::Other(label) => label,
        }
    }
}

impl Default for JobType {
    fn default() -> Self {
        JobType::Other(String::new())
    }
}

impl From<String> for JobType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Full-time" => JobType::FullTime,
            "Part-time" => JobType::PartTime,
            "Contract" => JobType::Contract,
            "Internship" => JobType::Internship,
            _ => JobType::Other(label),
        }
    }
}

impl From<JobType> for String {
    fn from(job_type: JobType) -> Self {
        job_type.as_str().to_string()
    }
}

/// Working arrangement of a single location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationKind {
    Onsite,
    Hybrid,
    Remote,
    Other(String),
}

impl LocationKind {
    pub fn as_str(&self) -> &str {
        match self {
            LocationKind::Onsite => "Onsite",
            LocationKind::Hybrid => "Hybrid",
            LocationKind::Remote => "Remote",
            LocationKind::Other(label) => label,
        }
    }
}

impl Default for LocationKind {
    fn default() -> Self {
        LocationKind::Other(String::new())
    }
}

impl From<String> for LocationKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Onsite" => LocationKind::Onsite,
            "Hybrid" => LocationKind::Hybrid,
            "Remote" => LocationKind::Remote,
            _ => LocationKind::Other(label),
        }
    }
}

impl From<LocationKind> for String {
    fn from(kind: LocationKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct JobLocation {
    /// City name, e.g. "Chennai"
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: String,
    /// Country name
    #[serde(default, deserialize_with = "lenient_text")]
    pub country: String,
    /// Onsite, Hybrid or Remote
    #[serde(rename = "type", default, deserialize_with = "lenient_label")]
    #[schema(value_type = String)]
    pub kind: LocationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

/// A single job listing. Read-only: this service never creates or mutates postings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    /// Opaque upstream identifier
    #[serde(rename(deserialize = "_id"), alias = "id", deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub department: String,
    /// Full-time, Part-time, Contract or Internship
    #[serde(rename = "type", default, deserialize_with = "lenient_label")]
    #[schema(value_type = String)]
    pub job_type: JobType,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(
        rename(deserialize = "Experience"),
        alias = "experienceLevel",
        default,
        deserialize_with = "lenient_string"
    )]
    pub experience_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub locations: Vec<JobLocation>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub requirements: Vec<String>,
    #[serde(default, deserialize_with = "lenient_salary")]
    pub salary_range: Option<SalaryRange>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[schema(value_type = Option<String>)]
    pub closing_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[schema(value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
    /// External page where candidates apply
    #[serde(
        rename(deserialize = "posterLink"),
        alias = "applicationLink",
        default,
        deserialize_with = "lenient_string"
    )]
    pub application_link: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub sites: Vec<String>,
}

impl JobPosting {
    pub fn is_remote(&self) -> bool {
        self.locations.iter().any(|loc| loc.kind == LocationKind::Remote)
    }

    /// True if any location's city, country or kind equals `value`.
    pub fn has_location(&self, value: &str) -> bool {
        self.locations
            .iter()
            .any(|loc| loc.city == value || loc.country == value || loc.kind.as_str() == value)
    }
}

fn lenient_salary<'de, D>(deserializer: D) -> Result<Option<SalaryRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(map)) = raw else {
        return Ok(None);
    };
    let bound = |key: &str| match map.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match (bound("min"), bound("max")) {
        (Some(min), Some(max)) if min <= max => Ok(Some(SalaryRange { min, max })),
        (Some(min), Some(max)) => {
            debug!("salary range reversed ({} > {}); swapping", min, max);
            Ok(Some(SalaryRange { min: max, max: min }))
        }
        _ => Ok(None),
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => {
            let parsed = parse_timestamp(&s);
            if parsed.is_none() && !s.trim().is_empty() {
                warn!("Could not parse timestamp: {}", s);
            }
            parsed
        }
        Some(Value::Number(n)) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    })
}

/// Parses the timestamp forms the job-post API has been seen to emit.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%S%.f", // ISO without timezone
        "%Y-%m-%d %H:%M:%S",    // MySQL style
    ];
    for format in datetime_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    let date_formats = ["%Y-%m-%d", "%d/%m/%Y"];
    for format in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// Coerces a listings body (`{ data: [...] }`) into postings.
///
/// A body whose `data` is not an array yields an empty list. Array entries
/// that do not look like a posting are skipped.
pub fn coerce_posting_list(body: &Value) -> Vec<JobPosting> {
    let Some(items) = body.get("data").and_then(Value::as_array) else {
        warn!("listings response has no `data` array; treating as empty");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match JobPosting::deserialize(item) {
            Ok(posting) => Some(posting),
            Err(e) => {
                warn!("Skipping malformed job posting: {}", e);
                None
            }
        })
        .collect()
}

/// Coerces a detail body, which is either `{ data: posting }` or a bare posting.
pub fn coerce_single_posting(body: &Value) -> Option<JobPosting> {
    let candidate = match body.get("data") {
        Some(data) if data.is_object() => data,
        _ => body,
    };
    match JobPosting::deserialize(candidate) {
        Ok(posting) => Some(posting),
        Err(e) => {
            debug!("detail response is not a posting: {}", e);
            None
        }
    }
}
