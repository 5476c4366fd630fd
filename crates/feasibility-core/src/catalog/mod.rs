//! Question catalog loading and validation.
//!
//! A catalog is the externally supplied configuration data: categories of
//! questions with their answer options, declarative rules, and the role and
//! technology lookup tables. Catalogs are validated against an embedded JSON
//! Schema before they are deserialized.

mod parser;
mod schema;

pub use parser::{AnswerOption, Catalog, CatalogError, Category, Question, QuestionKind, Rule};
pub use schema::{validate_catalog_schema, SchemaError};
