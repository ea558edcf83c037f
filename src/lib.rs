//! # cubequery
//!
//! Declarative queries over RDF Data Cubes (`qb:`), compiled to SPARQL SELECT.
//!
//! ## Features
//!
//! - **Components**: dimensions, measures and attributes with aggregations and hierarchies
//! - **Filters**: a chainable expression algebra with `not()` folding
//! - **Immutable builder**: every call returns a new [`Query`]
//! - **Compiler**: label lookup with language fallback, implicit dimensions, `skos:broader` chains
//! - **Execution**: a SPARQL protocol client that shapes results into `{ value, label }` cells
//!
//! ## Modules
//!
//! - [`term`]: RDF terms and literal inference
//! - [`component`]: cube components
//! - [`expr`]: filter expressions
//! - [`query`]: builder, compiler and result shaping
//! - [`sparql`]: query AST and text generation
//! - [`fetcher`]: endpoint client
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cubequery::expr::Filterable;
//! use cubequery::{Component, DataCube, FetcherConfig, SparqlFetcher, StaticCube};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let raum = Component::dimension("https://ld.stadt-zuerich.ch/statistics/property/RAUM")
//!         .with_label("Raum", "de");
//!     let zeit = Component::dimension("https://ld.stadt-zuerich.ch/statistics/property/ZEIT")
//!         .with_label("Zeit", "de");
//!     let bep = Component::measure("https://ld.stadt-zuerich.ch/statistics/measure/BEP");
//!
//!     let cube = DataCube::new(
//!         "https://ld.stadt-zuerich.ch/statistics/BEW",
//!         Arc::new(StaticCube::new(vec![raum.clone(), zeit.clone(), bep.clone()])),
//!         Arc::new(SparqlFetcher::new(FetcherConfig::default())?),
//!     )
//!     .with_languages(["de", "en"]);
//!
//!     let query = cube
//!         .query()
//!         .select([("raum", &raum), ("zeit", &zeit), ("bep", &bep.sum())])?
//!         .filter(zeit.gte("2017-01-01"))
//!         .limit(None);
//!
//!     println!("{}", query.to_sparql().await?);
//!     for row in query.execute().await? {
//!         println!("{:?}", row);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod component;
pub mod config;
pub mod cube;
pub mod expr;
pub mod fetcher;
pub mod logging;
pub mod query;
pub mod sparql;
pub mod term;

// Re-export top-level types for convenience
pub use component::{Aggregation, Component, ComponentKind, Label};

pub use cube::{CubeSource, DataCube, StaticCube};

pub use expr::{Binding, Expr, Filterable, Operator};

pub use fetcher::{FetchError, Fetcher, FetcherConfig, RequestMethod, Row, SparqlFetcher};

pub use query::{
    ComponentValue, FilterSpec, MinMax, Query, QueryError, QueryResult, ShapedRow, ShapedValue,
};

pub use sparql::{SelectQuery, Serializer, SparqlGenerator};

pub use term::{Literal, Term, Value};

pub use config::{Config, ConfigError, EndpointConfig, LoggingConfig, QueryConfig};
