//! Catalogue queries: program details, semester navigation and course search.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fuzzy::fuzzy_suggest;
use crate::catalogue::{Catalogue, Course, NotFound, Program, SemesterKey};

/// Number of course names shown in a program summary.
pub const SUMMARY_COURSE_COUNT: usize = 5;

/// Tunables for course search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Maximum number of substring hits returned.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Maximum number of fuzzy suggestions.
    #[serde(default = "default_suggestion_count")]
    pub suggestion_count: usize,

    /// Minimum similarity for a fuzzy suggestion.
    #[serde(default = "default_suggestion_cutoff")]
    pub suggestion_cutoff: f64,
}

const fn default_limit() -> usize {
    5
}

const fn default_suggestion_count() -> usize {
    3
}

const fn default_suggestion_cutoff() -> f64 {
    0.6
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            suggestion_count: default_suggestion_count(),
            suggestion_cutoff: default_suggestion_cutoff(),
        }
    }
}

/// Display-oriented view of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSummary {
    pub name: String,
    pub name_en: String,
    pub description: String,
    pub duration_years: u32,
    pub language: String,
    pub website_url: String,
    /// First course names in catalogue order (not a ranking).
    pub first_courses: Vec<String>,
}

/// A course matched by search, with the program it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub program_name: &'a str,
    pub course: &'a Course,
}

/// Result of a free-text course search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<'a> {
    /// Substring matches.
    Hits(Vec<SearchHit<'a>>),
    /// No substring match; these names are close.
    Suggestions(Vec<&'a str>),
    /// Nothing matched at all.
    Nothing,
}

/// Read-only query engine over the catalogue.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    catalogue: Arc<Catalogue>,
    settings: SearchSettings,
}

impl QueryEngine {
    /// Creates a new query engine.
    #[must_use]
    pub fn new(catalogue: Arc<Catalogue>, settings: SearchSettings) -> Self {
        Self {
            catalogue,
            settings,
        }
    }

    /// Returns the underlying catalogue.
    #[must_use]
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Returns the search settings.
    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Lists all programs in catalogue order.
    #[must_use]
    pub fn list_programs(&self) -> &[Program] {
        self.catalogue.programs()
    }

    /// Finds a program by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the name is not in the catalogue.
    pub fn find_program(&self, name: &str) -> Result<&Program, NotFound> {
        self.catalogue.find_program(name)
    }

    /// Searches course names across every program.
    ///
    /// Matching is a case-insensitive substring test. Hits are returned in
    /// catalogue order and truncated to `limit`. A blank query matches nothing.
    #[must_use]
    pub fn search_courses(&self, query: &str, limit: usize) -> Vec<SearchHit<'_>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let hits: Vec<SearchHit<'_>> = self
            .catalogue
            .programs()
            .iter()
            .flat_map(|program| {
                program
                    .courses_data
                    .courses
                    .iter()
                    .map(move |course| SearchHit {
                        program_name: &program.name,
                        course,
                    })
            })
            .filter(|hit| hit.course.name.to_lowercase().contains(&needle))
            .collect();

        debug!("Search '{}' matched {} courses", needle, hits.len());
        hits.into_iter().take(limit).collect()
    }

    /// Every distinct course name across the catalogue, first occurrence first.
    #[must_use]
    pub fn all_course_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.catalogue
            .programs()
            .iter()
            .flat_map(|p| p.courses_data.courses.iter())
            .map(|c| c.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Substring search with fuzzy fallback, using the configured settings.
    #[must_use]
    pub fn search(&self, query: &str) -> SearchOutcome<'_> {
        let hits = self.search_courses(query, self.settings.limit);
        if !hits.is_empty() {
            return SearchOutcome::Hits(hits);
        }
        if query.trim().is_empty() {
            return SearchOutcome::Nothing;
        }

        let suggestions = fuzzy_suggest(
            query,
            self.all_course_names(),
            self.settings.suggestion_count,
            self.settings.suggestion_cutoff,
        );

        if suggestions.is_empty() {
            SearchOutcome::Nothing
        } else {
            SearchOutcome::Suggestions(suggestions)
        }
    }
}

/// Builds the summary shown on a program's detail page.
#[must_use]
pub fn program_summary(program: &Program) -> ProgramSummary {
    ProgramSummary {
        name: program.name.clone(),
        name_en: program.name_en.clone(),
        description: program.description.clone(),
        duration_years: program.duration_years,
        language: program.language.clone(),
        website_url: program.website_url.clone(),
        first_courses: first_course_names(program, SUMMARY_COURSE_COUNT),
    }
}

/// The first `count` course names of a program in catalogue order.
#[must_use]
pub fn first_course_names(program: &Program, count: usize) -> Vec<String> {
    program
        .courses_data
        .courses
        .iter()
        .take(count)
        .map(|c| c.name.clone())
        .collect()
}

/// Semester identifiers of a program in ascending natural order.
#[must_use]
pub fn list_semesters(program: &Program) -> Vec<SemesterKey> {
    program.courses_data.semesters.keys().cloned().collect()
}

/// Courses scheduled in a semester; an unknown semester has none.
#[must_use]
pub fn courses_in_semester<'a>(program: &'a Program, semester: &str) -> &'a [Course] {
    program
        .courses_data
        .semesters
        .get(&SemesterKey::parse(semester))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::catalogue::CoursesData;

    fn course(name: &str, semester: u32) -> Course {
        Course::new(name, Some(semester), 3, 108, "Основные дисциплины")
    }

    fn program(name: &str, courses: Vec<Course>) -> Program {
        let mut semesters: BTreeMap<SemesterKey, Vec<Course>> = BTreeMap::new();
        for c in &courses {
            if let Some(s) = c.semester {
                semesters
                    .entry(SemesterKey::Number(s))
                    .or_default()
                    .push(c.clone());
            }
        }
        Program {
            name: name.to_owned(),
            name_en: "Program".to_owned(),
            description: "Описание".to_owned(),
            duration_years: 2,
            language: "ru".to_owned(),
            website_url: "https://example.org".to_owned(),
            degree_level: None,
            last_updated: None,
            courses_data: CoursesData {
                courses,
                semesters,
                ..CoursesData::default()
            },
        }
    }

    fn engine() -> QueryEngine {
        let catalogue = Catalogue::from_programs(vec![
            program(
                "Искусственный интеллект",
                vec![
                    course("Математическая статистика", 1),
                    course("Программирование на Python", 1),
                    course("Прикладной анализ временных рядов", 2),
                    course("Базы данных", 3),
                    course("Основы машинного обучения", 2),
                    course("Основы глубокого обучения", 3),
                ],
            ),
            program(
                "Управление ИИ-продуктами",
                vec![
                    course("Продуктовый менеджмент", 1),
                    course("Анализ рынка", 1),
                    course("Базы данных", 2),
                ],
            ),
        ])
        .unwrap();
        QueryEngine::new(Arc::new(catalogue), SearchSettings::default())
    }

    #[test]
    fn test_search_substring_case_insensitive() {
        let engine = engine();
        let hits = engine.search_courses("анализ", 5);
        let names: Vec<&str> = hits.iter().map(|h| h.course.name.as_str()).collect();
        assert_eq!(names, vec!["Прикладной анализ временных рядов", "Анализ рынка"]);
        assert!(!names.contains(&"Математическая статистика"));
        assert_eq!(hits[1].program_name, "Управление ИИ-продуктами");
    }

    #[test]
    fn test_search_truncates_in_catalogue_order() {
        let engine = engine();
        let hits = engine.search_courses("а", 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].course.name, "Математическая статистика");
    }

    #[test]
    fn test_search_blank_query() {
        assert!(engine().search_courses("   ", 5).is_empty());
        assert_eq!(engine().search(""), SearchOutcome::Nothing);
    }

    #[test]
    fn test_search_falls_back_to_suggestions() {
        let engine = engine();
        match engine.search("базы даных") {
            SearchOutcome::Suggestions(names) => assert_eq!(names[0], "Базы данных"),
            other => panic!("expected suggestions, got {other:?}"),
        }
        assert_eq!(engine.search("шахматы"), SearchOutcome::Nothing);
    }

    #[test]
    fn test_all_course_names_distinct() {
        let engine = engine();
        let names = engine.all_course_names();
        assert_eq!(names.iter().filter(|n| **n == "Базы данных").count(), 1);
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_program_summary_first_five() {
        let engine = engine();
        let program = engine.find_program("Искусственный интеллект").unwrap();
        let summary = program_summary(program);
        assert_eq!(summary.first_courses.len(), 5);
        assert_eq!(summary.first_courses[0], "Математическая статистика");
        assert_eq!(summary.first_courses[4], "Основы машинного обучения");
    }

    #[test]
    fn test_list_semesters_strictly_ascending() {
        let engine = engine();
        for program in engine.list_programs() {
            let semesters = list_semesters(program);
            assert!(!semesters.is_empty());
            assert!(semesters.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_courses_in_absent_semester_is_empty() {
        let engine = engine();
        let program = engine.find_program("Управление ИИ-продуктами").unwrap();
        assert!(courses_in_semester(program, "7").is_empty());
        assert!(courses_in_semester(program, "осень").is_empty());
        assert_eq!(courses_in_semester(program, "1").len(), 2);
    }

    #[test]
    fn test_label_semester_sorts_last_and_resolves() {
        let mut p = program("Семестры", vec![course("Введение", 1), course("Проект", 10)]);
        p.courses_data.semesters.insert(
            SemesterKey::parse("null"),
            vec![Course::new("Факультатив", None, 1, 36, "")],
        );

        let keys: Vec<String> = list_semesters(&p).iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["1", "10", "null"]);
        assert_eq!(courses_in_semester(&p, "null")[0].name, "Факультатив");
        assert_eq!(courses_in_semester(&p, " 01 ")[0].name, "Введение");
    }

    #[test]
    fn test_find_program_unknown() {
        assert!(engine().find_program("program_that_was_renamed").is_err());
    }
}
