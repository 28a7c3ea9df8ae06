//! # Attributes
//!
//! Declared task inputs and the pipeline that resolves them: source lookup,
//! required checks, defaults, type coercion and validation. Failures are
//! collected per attribute in [`Errors`] and never abort the pipeline for
//! sibling attributes.

pub mod attribute;
pub mod coercions;
pub mod errors;
pub mod validators;
pub mod value;

pub use attribute::{Attribute, DefaultValue, Source, Validation};
pub use errors::Errors;
