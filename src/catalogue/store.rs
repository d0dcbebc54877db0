//! Catalogue loading and program lookup.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::model::{Course, CoursesData, Metadata, Program, SemesterKey};

/// Errors that prevent the catalogue from loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read catalogue file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalogue: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Program at index {index} has an empty name")]
    EmptyProgramName { index: usize },

    #[error("Duplicate program name in catalogue: '{name}'")]
    DuplicateProgram { name: String },
}

/// A program name that is not in the catalogue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Program not found: '{name}'")]
pub struct NotFound {
    pub name: String,
}

#[derive(Deserialize)]
struct RawDocument {
    programs: Vec<RawProgram>,
    #[serde(default)]
    metadata: Value,
}

#[derive(Deserialize)]
struct RawProgram {
    #[serde(alias = "program_name")]
    name: String,
    #[serde(alias = "program_name_en")]
    name_en: String,
    description: String,
    duration_years: u32,
    language: String,
    website_url: String,
    #[serde(default)]
    degree_level: Option<String>,
    #[serde(default)]
    last_updated: Option<String>,
    courses_data: RawCoursesData,
}

#[derive(Deserialize)]
struct RawCoursesData {
    #[serde(default)]
    courses: Map<String, Value>,
    #[serde(default)]
    semesters: Map<String, Value>,
    #[serde(default)]
    categories: Map<String, Value>,
    #[serde(default)]
    total_credits: Option<u64>,
    #[serde(default)]
    total_hours: Option<u64>,
}

/// The in-memory program catalogue. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    programs: Vec<Program>,
    metadata: Metadata,
}

impl Catalogue {
    /// Loads the catalogue from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, misses
    /// a required program field, or names the same program twice.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let catalogue = Self::from_json(&content)?;
        info!(
            "Loaded {} programs from {}",
            catalogue.len(),
            path.display()
        );
        Ok(catalogue)
    }

    /// Parses the catalogue from a JSON document.
    ///
    /// Course rows that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// See [`Catalogue::load`].
    pub fn from_json(content: &str) -> Result<Self, LoadError> {
        let raw: RawDocument = serde_json::from_str(content)?;

        let mut seen = HashSet::new();
        let mut programs = Vec::with_capacity(raw.programs.len());

        for (index, raw_program) in raw.programs.into_iter().enumerate() {
            if raw_program.name.trim().is_empty() {
                return Err(LoadError::EmptyProgramName { index });
            }
            if !seen.insert(raw_program.name.clone()) {
                return Err(LoadError::DuplicateProgram {
                    name: raw_program.name,
                });
            }
            programs.push(build_program(raw_program));
        }

        Ok(Self {
            programs,
            metadata: Metadata::from_value(&raw.metadata),
        })
    }

    /// Builds a catalogue from already-constructed programs.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::DuplicateProgram`] if two programs share a name.
    pub fn from_programs(programs: Vec<Program>) -> Result<Self, LoadError> {
        let mut seen = HashSet::new();
        for program in &programs {
            if !seen.insert(program.name.as_str()) {
                return Err(LoadError::DuplicateProgram {
                    name: program.name.clone(),
                });
            }
        }
        Ok(Self {
            programs,
            metadata: Metadata::default(),
        })
    }

    /// Finds a program by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if no program has this name.
    pub fn find_program(&self, name: &str) -> Result<&Program, NotFound> {
        self.programs
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| NotFound {
                name: name.to_owned(),
            })
    }

    /// Returns all programs in catalogue order.
    #[must_use]
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Returns the advisory metadata block.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns the number of programs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Checks if the catalogue has no programs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

fn build_program(raw: RawProgram) -> Program {
    let courses_data = build_courses_data(&raw.name, raw.courses_data);
    debug!(
        "Program '{}': {} courses, {} semesters",
        raw.name,
        courses_data.courses.len(),
        courses_data.semesters.len()
    );

    Program {
        name: raw.name,
        name_en: raw.name_en,
        description: raw.description,
        duration_years: raw.duration_years,
        language: raw.language,
        website_url: raw.website_url,
        degree_level: raw.degree_level,
        last_updated: raw.last_updated,
        courses_data,
    }
}

fn build_courses_data(program: &str, raw: RawCoursesData) -> CoursesData {
    let courses: Vec<Course> = raw
        .courses
        .iter()
        .filter_map(|(key, row)| parse_keyed_course(program, key, row))
        .collect();

    let mut semesters: BTreeMap<SemesterKey, Vec<Course>> = BTreeMap::new();
    for (key, rows) in &raw.semesters {
        let parsed = parse_course_list(program, &format!("semester {key}"), rows);
        semesters
            .entry(SemesterKey::parse(key))
            .or_default()
            .extend(parsed);
    }

    let categories = raw
        .categories
        .iter()
        .map(|(label, rows)| {
            (
                label.clone(),
                parse_course_list(program, &format!("category {label}"), rows),
            )
        })
        .collect();

    let total_credits = raw
        .total_credits
        .unwrap_or_else(|| courses.iter().map(|c| u64::from(c.credits)).sum());
    let total_hours = raw
        .total_hours
        .unwrap_or_else(|| courses.iter().map(|c| u64::from(c.hours)).sum());

    CoursesData {
        courses,
        semesters,
        categories,
        total_credits,
        total_hours,
    }
}

fn parse_course_list(program: &str, context: &str, rows: &Value) -> Vec<Course> {
    let Some(rows) = rows.as_array() else {
        warn!("Program '{program}': {context} is not a list, skipping");
        return Vec::new();
    };

    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| parse_course(program, &format!("{context}[{i}]"), row))
        .collect()
}

/// Parses a row of the `courses` object. The object key is the course name,
/// which keeps names unique within a program.
fn parse_keyed_course(program: &str, key: &str, row: &Value) -> Option<Course> {
    if key.trim().is_empty() {
        warn!("Program '{program}': skipping course row with empty key");
        return None;
    }

    let mut course = parse_course(program, key, row)?;
    if course.name != key {
        debug!(
            "Program '{program}': course row '{key}' is named '{}', using the key",
            course.name
        );
        course.name = key.to_owned();
    }
    Some(course)
}

/// Parses one course row; malformed rows are logged and dropped.
fn parse_course(program: &str, context: &str, row: &Value) -> Option<Course> {
    match Course::deserialize(row) {
        Ok(course) if course.name.trim().is_empty() => {
            warn!("Program '{program}': skipping course row {context} with empty name");
            None
        }
        Ok(course) => Some(course),
        Err(e) => {
            warn!("Program '{program}': skipping malformed course row {context}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "programs": [
            {
                "program_name": "Искусственный интеллект",
                "program_name_en": "Artificial Intelligence",
                "description": "ИИ",
                "website_url": "https://abit.itmo.ru/program/master/ai",
                "degree_level": "master",
                "duration_years": 2,
                "language": "ru",
                "courses_data": {
                    "courses": {
                        "Программирование на Python": {"name": "Программирование на Python", "semester": 1, "credits": 3, "hours": 108, "category": "Основные дисциплины"},
                        "Битая строка": {"name": "Битая строка", "semester": 1, "hours": 36, "category": "Основные дисциплины"},
                        "Базы данных": {"name": "Базы данных", "semester": 2, "credits": 4, "hours": 144, "category": "Основные дисциплины"}
                    },
                    "semesters": {
                        "2": [{"name": "Базы данных", "semester": 2, "credits": 4, "hours": 144, "category": "Основные дисциплины"}],
                        "1": [{"name": "Программирование на Python", "semester": 1, "credits": 3, "hours": 108, "category": "Основные дисциплины"}]
                    },
                    "categories": {}
                }
            }
        ],
        "metadata": {"version": "1.1", "total_programs": 1}
    }"#;

    #[test]
    fn test_load_skips_malformed_course_rows() {
        let catalogue = Catalogue::from_json(SAMPLE).unwrap();
        assert_eq!(catalogue.len(), 1);
        let program = catalogue.find_program("Искусственный интеллект").unwrap();
        let names: Vec<&str> = program
            .courses_data
            .courses
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Программирование на Python", "Базы данных"]);
    }

    #[test]
    fn test_totals_computed_when_absent() {
        let catalogue = Catalogue::from_json(SAMPLE).unwrap();
        let program = &catalogue.programs()[0];
        assert_eq!(program.courses_data.total_credits, 7);
        assert_eq!(program.courses_data.total_hours, 252);
    }

    #[test]
    fn test_semesters_sorted_naturally() {
        let catalogue = Catalogue::from_json(SAMPLE).unwrap();
        let keys: Vec<&SemesterKey> = catalogue.programs()[0]
            .courses_data
            .semesters
            .keys()
            .collect();
        assert_eq!(keys, vec![&SemesterKey::Number(1), &SemesterKey::Number(2)]);
    }

    #[test]
    fn test_find_program_not_found() {
        let catalogue = Catalogue::from_json(SAMPLE).unwrap();
        assert_eq!(
            catalogue.find_program("Нет такой"),
            Err(NotFound {
                name: "Нет такой".to_owned()
            })
        );
    }

    #[test]
    fn test_duplicate_program_rejected() {
        let doc = r#"{"programs": [
            {"name": "A", "name_en": "A", "description": "", "duration_years": 2, "language": "ru", "website_url": "", "courses_data": {}},
            {"name": "A", "name_en": "A", "description": "", "duration_years": 2, "language": "ru", "website_url": "", "courses_data": {}}
        ]}"#;
        assert!(matches!(
            Catalogue::from_json(doc),
            Err(LoadError::DuplicateProgram { name }) if name == "A"
        ));
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let doc = r#"{"programs": [{"name": "A", "courses_data": {}}]}"#;
        assert!(matches!(Catalogue::from_json(doc), Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalogue::load("/definitely/not/here.json");
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("program_data.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalogue = Catalogue::load(&path).unwrap();
        assert_eq!(catalogue.metadata().version.as_deref(), Some("1.1"));
        for program in catalogue.programs() {
            assert_eq!(catalogue.find_program(&program.name).unwrap(), program);
        }
    }

    const SEMESTER_SAMPLE: &str = r#"{"programs": [{
        "name": "A", "name_en": "A", "description": "", "duration_years": 2,
        "language": "ru", "website_url": "",
        "courses_data": {
            "courses": {
                "X": {"name": "X", "semester": 1, "credits": 1, "hours": 10},
                "Y": {"name": "Y", "semester": 1, "credits": 2, "hours": 20},
                "Z": {"name": "Z", "semester": null, "credits": 3, "hours": 30}
            },
            "semesters": {
                "01": [{"name": "X", "semester": 1, "credits": 1, "hours": 10}],
                "null": [{"name": "Z", "semester": null, "credits": 3, "hours": 30}],
                "1": [{"name": "Y", "semester": 1, "credits": 2, "hours": 20}],
                "10": []
            },
            "total_credits": 120,
            "total_hours": 4320
        }
    }]}"#;

    #[test]
    fn test_equivalent_semester_keys_merged_in_order() {
        let catalogue = Catalogue::from_json(SEMESTER_SAMPLE).unwrap();
        let semesters = &catalogue.programs()[0].courses_data.semesters;

        let keys: Vec<String> = semesters.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["1", "10", "null"]);

        let first: Vec<&str> = semesters[&SemesterKey::Number(1)]
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(first, vec!["X", "Y"]);

        let unscheduled: Vec<&str> = semesters[&SemesterKey::parse("null")]
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(unscheduled, vec!["Z"]);
    }

    #[test]
    fn test_document_totals_win_over_computed() {
        let catalogue = Catalogue::from_json(SEMESTER_SAMPLE).unwrap();
        let data = &catalogue.programs()[0].courses_data;
        assert_eq!(data.total_credits, 120);
        assert_eq!(data.total_hours, 4320);
    }

    #[test]
    fn test_course_names_follow_object_keys() {
        let doc = r#"{"programs": [{
            "name": "A", "name_en": "A", "description": "", "duration_years": 2,
            "language": "ru", "website_url": "",
            "courses_data": {"courses": {
                "A": {"name": "Same", "semester": 1, "credits": 1, "hours": 36},
                "B": {"name": "Same", "semester": 1, "credits": 2, "hours": 72}
            }}
        }]}"#;
        let catalogue = Catalogue::from_json(doc).unwrap();
        let data = &catalogue.programs()[0].courses_data;

        let names: Vec<&str> = data.courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(data.total_credits, 3);
    }
}
