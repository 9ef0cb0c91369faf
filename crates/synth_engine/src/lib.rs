//! Expression synthesis engine.
//!
//! Given a base digit string, builds a knowledge base of arithmetic
//! expressions over the base's digits and, for any requested target
//! value, finds or derives an expression that evaluates exactly to it.
//! See [`Dictionary`] for the entry points.

pub mod dictionary;
pub mod error;
pub mod factor;
pub mod generate;
pub mod json;
pub mod mapping;
pub mod merge;
pub mod search;


pub use dictionary::Dictionary;
pub use error::EngineError;
pub use factor::factorize;
pub use generate::Generator;
pub use json::{ProveJsonResponse, SCHEMA_VERSION};
pub use mapping::{Entry, Mapping};
pub use merge::merge;

/// Build the knowledge base for a base digit string. Non-digit
/// characters in the input are stripped.
pub fn build_dictionary(base: &str) -> Result<Dictionary, EngineError> {
    Dictionary::build(base)
}
