//! SPARQL query model
//!
//! - **AST**: the SELECT query tree produced by the compiler
//! - **Serializer**: renders the tree as query text

pub mod ast;
mod serialize;

pub use ast::{
    Expression, Op, Ordering, Pattern, Predicate, Projection, SelectQuery, Triple,
};
pub use serialize::{Serializer, SparqlGenerator};
