//! SPARQL Endpoint Client
//!
//! Sends compiled queries to a SPARQL 1.1 endpoint and decodes the
//! `application/sparql-results+json` response into rows of terms.
//!
//! The [`Fetcher`] trait is the seam used by [`Query::execute`](crate::query::Query::execute);
//! tests and embedders can swap in their own implementation.

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::term::{Literal, Term};

/// One result row: variable name to bound term, in the endpoint's column order
pub type Row = IndexMap<String, Term>;

/// Runs SELECT queries against a store
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn select(&self, query: &str) -> Result<Vec<Row>, FetchError>;
}

/// HTTP method used to send the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    /// `query=` URL parameter
    Get,
    /// `application/sparql-query` body
    Post,
}

impl RequestMethod {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "get" => Some(RequestMethod::Get),
            "post" => Some(RequestMethod::Post),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
        }
    }
}

/// Configuration for the endpoint client
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Query endpoint URL (e.g., "https://ld.stadt-zuerich.ch/query")
    pub endpoint: String,
    pub method: RequestMethod,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum attempts per query
    pub max_retries: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3030/query".to_string(),
            method: RequestMethod::Post,
            request_timeout_ms: 30_000,
            max_retries: 3,
        }
    }
}

/// Fetcher backed by a SPARQL protocol endpoint
pub struct SparqlFetcher {
    client: Client,
    config: FetcherConfig,
}

impl SparqlFetcher {
    /// Create a new endpoint client with the given configuration
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn request(&self, query: &str) -> reqwest::RequestBuilder {
        let request = match self.config.method {
            RequestMethod::Get => {
                let url = format!(
                    "{}{}query={}",
                    self.config.endpoint,
                    if self.config.endpoint.contains('?') { "&" } else { "?" },
                    urlencoding::encode(query)
                );
                self.client.get(url)
            }
            RequestMethod::Post => self
                .client
                .post(&self.config.endpoint)
                .header(CONTENT_TYPE, "application/sparql-query")
                .body(query.to_string()),
        };
        request.header(ACCEPT, "application/sparql-results+json")
    }

    /// Send a query with retry logic
    ///
    /// Connection failures, timeouts, 429 and 5xx responses are retried; other
    /// error statuses are returned immediately.
    async fn send(&self, query: &str) -> Result<String, FetchError> {
        let mut last_error = FetchError::Unavailable;

        for attempt in 0..self.config.max_retries.max(1) {
            if attempt > 0 {
                // Backoff: 1s, 4s, 9s...
                let delay = std::time::Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(delay).await;
            }

            match self.request(query).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.text().await?);
                    } else if status.as_u16() == 429 {
                        // Rate limited - check Retry-After header
                        if let Some(retry_after) = response.headers().get("Retry-After") {
                            if let Ok(secs) = retry_after.to_str().unwrap_or("5").parse::<u64>() {
                                tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
                            }
                        }
                        tracing::warn!(attempt, "SPARQL endpoint rate limited the request");
                        last_error = FetchError::RateLimited;
                        continue;
                    } else if status.is_server_error() {
                        let text = response.text().await.unwrap_or_default();
                        tracing::warn!(attempt, status = status.as_u16(), "SPARQL endpoint error, retrying");
                        last_error = FetchError::Endpoint {
                            status: status.as_u16(),
                            message: text,
                        };
                        continue;
                    } else {
                        let text = response.text().await.unwrap_or_default();
                        return Err(FetchError::Endpoint {
                            status: status.as_u16(),
                            message: text,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "SPARQL request failed");
                    last_error = if e.is_timeout() {
                        FetchError::Timeout
                    } else if e.is_connect() {
                        FetchError::Unavailable
                    } else {
                        FetchError::Request(e)
                    };
                    continue;
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl Fetcher for SparqlFetcher {
    async fn select(&self, query: &str) -> Result<Vec<Row>, FetchError> {
        tracing::debug!(
            endpoint = %self.config.endpoint,
            method = self.config.method.as_str(),
            "Sending SPARQL query"
        );
        let body = self.send(query).await?;
        let rows = parse_results(&body)?;
        tracing::debug!(rows = rows.len(), "SPARQL query returned");
        Ok(rows)
    }
}

// ============================================
// SPARQL JSON results
// ============================================

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    head: ResultsHead,
    results: ResultsBody,
}

#[derive(Debug, Default, Deserialize)]
struct ResultsHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResultsBody {
    #[serde(default)]
    bindings: Vec<HashMap<String, RdfTerm>>,
}

#[derive(Debug, Deserialize)]
struct RdfTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(rename = "xml:lang")]
    lang: Option<String>,
    datatype: Option<String>,
}

impl RdfTerm {
    fn into_term(self) -> Result<Term, FetchError> {
        let term = match self.kind.as_str() {
            "uri" => Term::Iri(self.value),
            "bnode" => Term::BlankNode(self.value),
            "literal" | "typed-literal" => match (self.lang, self.datatype) {
                (Some(lang), _) => Term::Literal(Literal::lang_tagged(self.value, lang)),
                (None, Some(dt)) => Term::Literal(Literal::typed(self.value, dt)),
                (None, None) => Term::Literal(Literal::plain(self.value)),
            },
            other => return Err(FetchError::Decode(format!("unknown term type '{}'", other))),
        };
        Ok(term)
    }
}

/// Decode a SPARQL JSON results document
///
/// Columns follow `head.vars`; unbound variables are left out of the row.
pub fn parse_results(body: &str) -> Result<Vec<Row>, FetchError> {
    let results: SparqlResults =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let vars = results.head.vars;

    results
        .results
        .bindings
        .into_iter()
        .map(|mut binding| {
            let mut row = Row::new();
            for var in &vars {
                if let Some(term) = binding.remove(var) {
                    row.insert(var.clone(), term.into_term()?);
                }
            }
            // variables missing from head
            let mut rest: Vec<(String, RdfTerm)> = binding.into_iter().collect();
            rest.sort_by(|a, b| a.0.cmp(&b.0));
            for (var, term) in rest {
                row.insert(var, term.into_term()?);
            }
            Ok(row)
        })
        .collect()
}

// ============================================
// Errors
// ============================================

/// Errors from the endpoint or from cube introspection
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("SPARQL endpoint unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Endpoint error {status}: {message}")]
    Endpoint { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid SPARQL results: {0}")]
    Decode(String),

    /// Failure inside a custom fetcher or cube source
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.endpoint, "http://localhost:3030/query");
        assert_eq!(config.method, RequestMethod::Post);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_request_method_names() {
        assert_eq!(RequestMethod::from_str("GET"), Some(RequestMethod::Get));
        assert_eq!(RequestMethod::from_str("post"), Some(RequestMethod::Post));
        assert_eq!(RequestMethod::from_str("put"), None);
        assert_eq!(RequestMethod::Get.as_str(), "GET");
    }

    #[test]
    fn test_get_request_encodes_query() {
        let fetcher = SparqlFetcher::new(FetcherConfig {
            method: RequestMethod::Get,
            ..Default::default()
        })
        .unwrap();
        let request = fetcher.request("SELECT * WHERE { ?s ?p ?o }").build().unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().query(),
            Some("query=SELECT%20%2A%20WHERE%20%7B%20%3Fs%20%3Fp%20%3Fo%20%7D")
        );
    }

    #[test]
    fn test_post_request_sends_body() {
        let fetcher = SparqlFetcher::new(FetcherConfig::default()).unwrap();
        let request = fetcher.request("SELECT * WHERE { ?s ?p ?o }").build().unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/sparql-query"
        );
        assert_eq!(
            request.headers().get(ACCEPT).unwrap(),
            "application/sparql-results+json"
        );
    }

    #[test]
    fn test_parse_results() {
        let body = r#"{
            "head": { "vars": ["raum", "raumLabel", "bep"] },
            "results": { "bindings": [
                {
                    "bep": { "type": "literal", "value": "12", "datatype": "http://www.w3.org/2001/XMLSchema#integer" },
                    "raumLabel": { "type": "literal", "value": "Kreis 1", "xml:lang": "de" },
                    "raum": { "type": "uri", "value": "https://ld.stadt-zuerich.ch/statistics/code/R30001" }
                },
                {
                    "raum": { "type": "bnode", "value": "b0" }
                }
            ] }
        }"#;

        let rows = parse_results(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].keys().collect::<Vec<_>>(),
            vec!["raum", "raumLabel", "bep"]
        );
        assert_eq!(
            rows[0]["raumLabel"],
            Term::Literal(Literal::lang_tagged("Kreis 1", "de"))
        );
        assert_eq!(
            rows[0]["bep"],
            Term::Literal(Literal::typed("12", "http://www.w3.org/2001/XMLSchema#integer"))
        );
        assert_eq!(rows[1].len(), 1);
        assert_eq!(rows[1]["raum"], Term::blank("b0"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_results("not json"), Err(FetchError::Decode(_))));

        let body = r#"{ "head": { "vars": ["x"] }, "results": { "bindings": [
            { "x": { "type": "triple", "value": "?" } }
        ] } }"#;
        assert!(matches!(parse_results(body), Err(FetchError::Decode(_))));
    }
}
