//! Cube Query Builder
//!
//! Declarative queries over an RDF data cube, compiled to SPARQL SELECT:
//!
//! - **Builder**: immutable [`Query`] values, extended with `select`, `filter`, `group_by`...
//! - **Compiler**: turns the accumulated state into a query AST
//! - **Results**: folds label columns and reads component values and ranges
//!
//! # Examples
//!
//! ```rust,ignore
//! use cubequery::expr::Filterable;
//!
//! let query = cube
//!     .query()
//!     .select([("raum", &raum), ("zeit", &zeit), ("bep", &bep.sum())])?
//!     .filter(zeit.gte("2017-01-01"))
//!     .order_by([zeit.desc()])
//!     .limit(Some(100));
//!
//! println!("{}", query.to_sparql().await?);
//! let rows = query.execute().await?;
//! ```

mod builder;
mod compiler;
mod error;
mod naming;
mod results;
pub mod state;

pub use builder::{FilterSpec, Query};
pub use compiler::{compile, conjunction, CompileContext, OBSERVATION};
pub use error::{QueryError, QueryResult};
pub use naming::{auto_name, camel_case};
pub use results::{
    component_values, min_max, min_max_query, shape_rows, ComponentValue, MinMax, ShapedRow,
    ShapedValue,
};
pub use state::{GroupBy, QueryState, Selection, Selections, DEFAULT_LIMIT};
