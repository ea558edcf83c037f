//! Query error types
//!
//! Defines all error conditions that can occur while building, compiling and
//! executing a cube query.

use crate::fetcher::FetchError;
use thiserror::Error;

/// Errors that can occur during query operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// `select` was given an empty slot for a binding
    #[error("{}", missing_component_message(.binding))]
    MissingComponent { binding: String },

    /// `select` was given a binding name that cannot be used as a variable
    #[error("{}", invalid_binding_message(.binding))]
    InvalidBindingName { binding: String },

    /// `select` was given something other than a component
    #[error("{}", not_a_component_message(.binding))]
    NotAComponent { binding: String },

    /// A filter method was called with the wrong number of arguments
    #[error("{0}")]
    Arity(String),

    /// A filter method name that does not exist
    #[error("Unknown filter operator: .{0}")]
    UnknownOperator(String),

    /// A component used in a filter, ordering or group-by has no binding
    #[error("Component {0} is not part of the query")]
    UnresolvedComponent(String),

    /// A group-by key did not match any selected component
    #[error("Cannot group on '{0}': no component with this name.")]
    UnknownGroupBy(String),

    /// Min/max lookup on a query without projected variables
    #[error("Nothing selected")]
    NothingSelected,

    /// The endpoint or cube introspection failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

fn missing_component_message(binding: &str) -> String {
    format!(
        "Invalid Component in\n`.select({{ {binding}: someFalsyValue }})`\n{}{}",
        " ".repeat(13 + binding.len()),
        "^".repeat(14)
    )
}

fn invalid_binding_message(binding: &str) -> String {
    format!(
        "Binding name should be a valid variable name in:\n`.select([[\"{binding}\", component]])`\n{}{}",
        " ".repeat(11),
        "^".repeat(binding.len() + 2)
    )
}

fn not_a_component_message(binding: &str) -> String {
    format!(
        "'component' should be a Component in:\n`.select([[\"{binding}\", component]])`\n{}{}",
        " ".repeat(15 + binding.len()),
        "^".repeat(9)
    )
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
