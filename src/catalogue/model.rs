//! Program and course data structures.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single curriculum unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course name (unique within a program).
    pub name: String,

    /// Semester the course is scheduled in, if the source knew it.
    #[serde(default, deserialize_with = "deserialize_semester")]
    pub semester: Option<u32>,

    /// Credit weight.
    pub credits: u32,

    /// Contact hours.
    pub hours: u32,

    /// Category label (e.g. "Основные дисциплины").
    #[serde(default)]
    pub category: String,
}

/// Accepts `1`, `"1"` or `null` for the semester field.
fn deserialize_semester<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid semester number: {n}"))),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                trimmed
                    .parse()
                    .map(Some)
                    .map_err(|_| serde::de::Error::custom(format!("invalid semester: {s}")))
            }
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid semester value: {other}"
        ))),
    }
}

impl Course {
    /// Creates a new course.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        semester: Option<u32>,
        credits: u32,
        hours: u32,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            semester,
            credits,
            hours,
            category: category.into(),
        }
    }
}

/// Semester identifier, ordered naturally.
///
/// Numeric identifiers compare as numbers and sort before free-form labels,
/// which compare lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemesterKey {
    Number(u32),
    Label(String),
}

impl SemesterKey {
    /// Normalizes a raw identifier.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        trimmed
            .parse::<u32>()
            .map_or_else(|_| Self::Label(trimmed.to_owned()), Self::Number)
    }
}

impl fmt::Display for SemesterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

/// Nested course data of a program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoursesData {
    /// All courses in catalogue order, names unique.
    pub courses: Vec<Course>,

    /// Courses grouped by semester, in natural semester order.
    pub semesters: BTreeMap<SemesterKey, Vec<Course>>,

    /// Courses grouped by category, in document order.
    pub categories: Vec<(String, Vec<Course>)>,

    /// Sum of credits across all courses.
    pub total_credits: u64,

    /// Sum of hours across all courses.
    pub total_hours: u64,
}

impl CoursesData {
    /// Returns the number of courses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Checks if the program has no courses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

/// A master's-degree program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Program name, unique across the catalogue.
    pub name: String,
    pub name_en: String,
    pub description: String,
    pub duration_years: u32,
    /// Teaching language code (e.g. "ru").
    pub language: String,
    pub website_url: String,
    pub degree_level: Option<String>,
    pub last_updated: Option<String>,
    pub courses_data: CoursesData,
}

/// Advisory catalogue metadata. Not consumed by the engines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub version: Option<String>,
    pub generated_on: Option<String>,
    pub source: Option<String>,
    pub total_programs: Option<usize>,
}

impl Metadata {
    /// Extracts metadata from a raw JSON block, ignoring fields of the wrong shape.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| match value.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Self {
            version: text("version"),
            generated_on: text("generated_on"),
            source: text("source"),
            total_programs: value
                .get("total_programs")
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok()),
        }
    }

    /// Parses `generated_on` (`%Y-%m-%d %H:%M:%S` or `%Y-%m-%d`).
    #[must_use]
    pub fn generated_at(&self) -> Option<chrono::NaiveDateTime> {
        let raw = self.generated_on.as_deref()?.trim();
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}
