//! Keyword rule engine.

use std::collections::HashSet;

use tracing::debug;

use crate::catalogue::Program;
use crate::config::RecommendationTable;
use crate::query::{first_course_names, SUMMARY_COURSE_COUNT};

/// Courses recommended for one self-description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    /// Course names, first-seen keyword order, no duplicates.
    pub courses: Vec<String>,

    /// Keywords that matched, in table order.
    pub matched_keywords: Vec<String>,

    /// True when no keyword matched and the program's first courses were used.
    pub is_fallback: bool,
}

/// Maps a free-text background onto curated course lists.
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    table: RecommendationTable,
}

impl Recommender {
    /// Creates a recommender over the given keyword table.
    #[must_use]
    pub fn new(table: RecommendationTable) -> Self {
        Self { table }
    }

    /// Returns the keyword table.
    #[must_use]
    pub fn table(&self) -> &RecommendationTable {
        &self.table
    }

    /// Recommends courses for `program` based on `background`.
    ///
    /// Never fails: an empty or unmatched background yields the program's
    /// first courses in catalogue order.
    #[must_use]
    pub fn recommend(&self, program: &Program, background: &str) -> Recommendation {
        let text = background.to_lowercase();
        let mut seen = HashSet::new();
        let mut courses = Vec::new();
        let mut matched_keywords = Vec::new();

        for rule in &self.table.entries {
            if rule.keyword.is_empty() || !text.contains(&rule.keyword) {
                continue;
            }
            matched_keywords.push(rule.keyword.clone());
            for course in &rule.courses {
                if seen.insert(course.as_str()) {
                    courses.push(course.clone());
                }
            }
        }

        if courses.is_empty() {
            debug!("No keyword matched for program '{}', using fallback", program.name);
            return Recommendation {
                courses: first_course_names(program, SUMMARY_COURSE_COUNT),
                matched_keywords,
                is_fallback: true,
            };
        }

        debug!(
            "Matched keywords {:?} for program '{}'",
            matched_keywords, program.name
        );
        Recommendation {
            courses,
            matched_keywords,
            is_fallback: false,
        }
    }
}
