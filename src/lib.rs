//! Program Catalogue Bot Library
//!
//! A Telegram bot that answers questions about master's programs
//! described in a JSON catalogue.
//!
//! This crate provides the core functionality for:
//! - Loading and validating the program catalogue
//! - Searching courses with fuzzy suggestions
//! - Recommending courses from a free-text background
//! - Tracking multi-step conversations per user
//! - Serving users over Telegram via `MTProto`

pub mod catalogue;
pub mod commands;
pub mod config;
pub mod query;
pub mod recommend;
pub mod session;
pub mod telegram;
