pub mod catalog;
pub mod extract;
pub mod generator;
pub mod lint;
pub mod parser;
pub mod pipeline;
pub mod repository;
pub mod session;
