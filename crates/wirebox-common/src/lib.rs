//! Shared building blocks for wirebox crates
//!
//! - [`store`]: the ordered key/value store the container keeps its bindings in
//! - [`validation`]: identifier and string validators

pub mod store;
pub mod validation;

pub use store::{shared_store, OrderedStore, SharedStore, Store};
pub use validation::{
    validate_identifier, IdentifierValidator, NonEmptyStringValidator, Validatable,
    ValidationError, Validator,
};
