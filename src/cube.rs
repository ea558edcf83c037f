//! Data Cubes
//!
//! A [`DataCube`] is the entry point for building queries: it knows its IRI, the
//! graph it lives in, where to look up its dimensions and how to run queries.
//!
//! ```rust,ignore
//! let cube = DataCube::new(
//!     "https://ld.stadt-zuerich.ch/statistics/BEW",
//!     Arc::new(StaticCube::new(vec![raum.clone(), zeit.clone()])),
//!     Arc::new(SparqlFetcher::new(FetcherConfig::default())?),
//! )
//! .with_graph("https://linked.opendata.swiss/graph/zh/statistics")
//! .with_languages(["de", "en"]);
//!
//! let rows = cube.query().select([("raum", &raum), ("bep", &bep.avg())])?.execute().await?;
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::component::{Component, Label};
use crate::fetcher::{FetchError, Fetcher};
use crate::query::Query;
use crate::sparql::{Serializer, SparqlGenerator};

/// Source of a cube's component metadata
#[async_trait]
pub trait CubeSource: Send + Sync {
    /// All dimensions of the cube
    async fn dimensions(&self) -> Result<Vec<Component>, FetchError>;

    async fn measures(&self) -> Result<Vec<Component>, FetchError> {
        Ok(Vec::new())
    }

    async fn attributes(&self) -> Result<Vec<Component>, FetchError> {
        Ok(Vec::new())
    }
}

/// A cube whose components are known up front
#[derive(Debug, Clone, Default)]
pub struct StaticCube {
    components: Vec<Component>,
}

impl StaticCube {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    fn of_kind(&self, keep: fn(&Component) -> bool) -> Vec<Component> {
        self.components.iter().filter(|c| keep(c)).cloned().collect()
    }
}

#[async_trait]
impl CubeSource for StaticCube {
    async fn dimensions(&self) -> Result<Vec<Component>, FetchError> {
        Ok(self.of_kind(Component::is_dimension))
    }

    async fn measures(&self) -> Result<Vec<Component>, FetchError> {
        Ok(self.of_kind(Component::is_measure))
    }

    async fn attributes(&self) -> Result<Vec<Component>, FetchError> {
        Ok(self.of_kind(Component::is_attribute))
    }
}

/// A queryable data cube
#[derive(Clone)]
pub struct DataCube {
    iri: String,
    graph_iri: Option<String>,
    labels: Vec<Label>,
    languages: Vec<String>,
    source: Arc<dyn CubeSource>,
    fetcher: Arc<dyn Fetcher>,
    serializer: Arc<dyn Serializer>,
}

impl std::fmt::Debug for DataCube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCube")
            .field("iri", &self.iri)
            .field("graph_iri", &self.graph_iri)
            .field("languages", &self.languages)
            .finish_non_exhaustive()
    }
}

impl DataCube {
    pub fn new(
        iri: impl Into<String>,
        source: Arc<dyn CubeSource>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            iri: iri.into(),
            graph_iri: None,
            labels: Vec::new(),
            languages: Vec::new(),
            source,
            fetcher,
            serializer: Arc::new(SparqlGenerator::default()),
        }
    }

    /// Restrict queries to a named graph (`FROM <graph>`)
    pub fn with_graph(mut self, graph_iri: impl Into<String>) -> Self {
        self.graph_iri = Some(graph_iri.into());
        self
    }

    /// Preferred label languages, most preferred first
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_label(mut self, value: impl Into<String>, language: impl Into<String>) -> Self {
        self.labels.push(Label::new(value, language));
        self
    }

    /// Use a custom query text generator
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn graph_iri(&self) -> Option<&str> {
        self.graph_iri.as_deref()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn serializer(&self) -> &Arc<dyn Serializer> {
        &self.serializer
    }

    /// All dimensions of the cube
    pub async fn dimensions(&self) -> Result<Vec<Component>, FetchError> {
        self.source.dimensions().await
    }

    pub async fn measures(&self) -> Result<Vec<Component>, FetchError> {
        self.source.measures().await
    }

    pub async fn attributes(&self) -> Result<Vec<Component>, FetchError> {
        self.source.attributes().await
    }

    /// Start a new, empty query on this cube
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::Row;

    struct NoFetch;

    #[async_trait]
    impl Fetcher for NoFetch {
        async fn select(&self, _query: &str) -> Result<Vec<Row>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_static_cube_splits_components() {
        let source = StaticCube::new(vec![
            Component::dimension("http://example.com/raum"),
            Component::measure("http://example.com/bep"),
            Component::attribute("http://example.com/status"),
            Component::dimension("http://example.com/zeit"),
        ]);
        assert_eq!(source.dimensions().await.unwrap().len(), 2);
        assert_eq!(source.measures().await.unwrap().len(), 1);
        assert_eq!(source.attributes().await.unwrap().len(), 1);
    }

    #[test]
    fn test_builder() {
        let cube = DataCube::new(
            "http://example.com/cube",
            Arc::new(StaticCube::default()),
            Arc::new(NoFetch),
        )
        .with_graph("http://example.com/graph")
        .with_languages(["de", "en"])
        .with_label("Bevölkerung", "de");

        assert_eq!(cube.iri(), "http://example.com/cube");
        assert_eq!(cube.graph_iri(), Some("http://example.com/graph"));
        assert_eq!(cube.languages(), &["de".to_string(), "en".to_string()]);
        assert_eq!(cube.labels()[0].value, "Bevölkerung");
    }
}
