//! Source repository implementations.
//!
//! Each module provides a struct implementing [`crate::engine::SourceRepository`]
//! against one search provider's API.

pub mod brave;

pub use brave::BraveSourceRepository;
