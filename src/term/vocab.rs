//! Namespaces used by the generated queries

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const QB: &str = "http://purl.org/linked-data/cube#";
pub const DC11: &str = "http://purl.org/dc/elements/1.1/";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";

/// Prefix declarations emitted at the top of every query, in output order
pub const PREFIXES: [(&str, &str); 7] = [
    ("rdfs", RDFS),
    ("rdf", RDF),
    ("xsd", XSD),
    ("qb", QB),
    ("dc11", DC11),
    ("dcterms", DCTERMS),
    ("skos", SKOS),
];

pub fn rdf(local: &str) -> String {
    format!("{}{}", RDF, local)
}

pub fn rdfs(local: &str) -> String {
    format!("{}{}", RDFS, local)
}

pub fn xsd(local: &str) -> String {
    format!("{}{}", XSD, local)
}

pub fn qb(local: &str) -> String {
    format!("{}{}", QB, local)
}

pub fn skos(local: &str) -> String {
    format!("{}{}", SKOS, local)
}
