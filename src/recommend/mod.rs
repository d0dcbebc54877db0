//! Recommendation engine.
//!
//! A simple rule engine: keyword hits in the user's self-description are
//! mapped onto curated course lists. No weighting and no ranking.

mod engine;

pub use engine::{Recommendation, Recommender};
