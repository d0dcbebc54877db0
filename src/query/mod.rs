//! Query engine.
//!
//! Program details, semester navigation, substring course search and the
//! fuzzy-suggestion fallback used when search finds nothing.

mod engine;
mod fuzzy;

pub use engine::{
    courses_in_semester, first_course_names, list_semesters, program_summary, ProgramSummary,
    QueryEngine, SearchHit, SearchOutcome, SearchSettings, SUMMARY_COURSE_COUNT,
};
pub use fuzzy::{fuzzy_suggest, similarity};
