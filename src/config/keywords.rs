//! Keyword-to-course recommendation table.
//!
//! The table is seed data curated by hand, not derived from the catalogue:
//! a course named here may not exist in every program.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading or validating the keyword table.
#[derive(Debug, Error)]
pub enum KeywordTableError {
    #[error("Rule at index {index} has an empty keyword")]
    EmptyKeyword { index: usize },

    #[error("Rule at index {index} (keyword: '{keyword}') lists no courses")]
    NoCourses { index: usize, keyword: String },

    #[error("Duplicate keyword found: '{keyword}'")]
    DuplicateKeyword { keyword: String },

    #[error("Failed to read keyword table: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse keyword table: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A keyword and the courses it recommends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordRule {
    /// Lowercase substring looked for in the user's self-description.
    pub keyword: String,

    /// Course names recommended when the keyword matches.
    pub courses: Vec<String>,
}

impl KeywordRule {
    /// Creates a new rule.
    #[must_use]
    pub fn new(keyword: &str, courses: &[&str]) -> Self {
        Self {
            keyword: keyword.to_owned(),
            courses: courses.iter().map(|&c| c.to_owned()).collect(),
        }
    }
}

/// Ordered list of keyword rules. Order decides the order of recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationTable {
    pub entries: Vec<KeywordRule>,
}

impl Default for RecommendationTable {
    fn default() -> Self {
        Self {
            entries: vec![
                KeywordRule::new(
                    "python",
                    &[
                        "Программирование на Python",
                        "Разработка веб-приложений (Python Backend)",
                    ],
                ),
                KeywordRule::new(
                    "анализ данн",
                    &[
                        "Математическая статистика",
                        "Прикладной анализ временных рядов",
                    ],
                ),
                KeywordRule::new(
                    "машинн",
                    &["Основы машинного обучения", "Продвинутое МО (Python)"],
                ),
                KeywordRule::new(
                    "менеджмент",
                    &[
                        "Управление проектами в Data Science",
                        "Продуктовый менеджмент",
                    ],
                ),
                KeywordRule::new("данн", &["Инженерия данных", "Базы данных"]),
                KeywordRule::new(
                    "глубок",
                    &[
                        "Основы глубокого обучения",
                        "Глубокие генеративные модели",
                    ],
                ),
                KeywordRule::new(
                    "естествен",
                    &[
                        "Обработка естественного языка",
                        "Технологии обработки естественного языка",
                    ],
                ),
            ],
        }
    }
}

impl RecommendationTable {
    /// Loads a table from a JSON file, lowercasing keywords and validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, KeywordTableError> {
        let content = std::fs::read_to_string(path)?;
        let mut table: Self = serde_json::from_str(&content)?;
        table.normalize();
        table.validate()?;
        Ok(table)
    }

    /// Saves the table to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), KeywordTableError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Trims and lowercases every keyword.
    pub fn normalize(&mut self) {
        for rule in &mut self.entries {
            rule.keyword = rule.keyword.trim().to_lowercase();
        }
    }

    /// Validates all rules.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), KeywordTableError> {
        let mut seen = HashSet::new();

        for (index, rule) in self.entries.iter().enumerate() {
            if rule.keyword.is_empty() {
                return Err(KeywordTableError::EmptyKeyword { index });
            }
            if rule.courses.is_empty() {
                return Err(KeywordTableError::NoCourses {
                    index,
                    keyword: rule.keyword.clone(),
                });
            }
            if !seen.insert(&rule.keyword) {
                return Err(KeywordTableError::DuplicateKeyword {
                    keyword: rule.keyword.clone(),
                });
            }
        }

        Ok(())
    }

    /// Every course name referenced by the table, first mention first.
    #[must_use]
    pub fn referenced_courses(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .flat_map(|r| r.courses.iter())
            .map(String::as_str)
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
