//! Storyline Engine: content pipeline for Tibouchi's watch adventures.
//!
//! Parses and validates storyline documents, stores them as slug-named JSON
//! files with atomic writes, and loads a playable catalog where one broken
//! file never hides the others. Generated content from an external text
//! source goes through the same validation before it is saved.

pub mod core;
pub mod schema;
