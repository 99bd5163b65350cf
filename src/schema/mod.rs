//! Storyline data model: storylines, steps, choices and character state.

pub mod character;
pub mod choice;
pub mod storyline;
