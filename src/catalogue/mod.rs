//! Catalogue store.
//!
//! Loads the static program catalogue once at startup. The catalogue is
//! read-only for the lifetime of the process and safe to share between
//! tasks without locking.

mod model;
mod store;

pub use model::{Course, CoursesData, Metadata, Program, SemesterKey};
pub use store::{Catalogue, LoadError, NotFound};
