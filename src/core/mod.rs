//! Core synthesis logic: construct tree, tokens, reference graph, documents.

pub mod construct;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod state;
pub mod synth;
pub mod token;
pub mod types;
