//! etude-core — Core quiz grading engine, streak tracking, and scoring.
//!
//! This crate defines the fundamental data model, traits, and grading logic
//! that the entire etude system builds on.

pub mod bank;
pub mod engine;
pub mod error;
pub mod model;
pub mod scoring;
pub mod stats;
pub mod streak;
pub mod traits;
