//! RDF Terms
//!
//! The value vocabulary shared by filters and the generated SPARQL:
//!
//! - **Term**: IRIs, literals, blank nodes and variables
//! - **Value**: native inputs (numbers, booleans, strings, timestamps) before coercion
//! - **to_literal / coerce**: datatype inference from native values

mod literal;
pub mod vocab;

pub use literal::{coerce, is_literal, is_term, to_literal};

use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;

/// An RDF term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Named node
    Iri(String),
    /// Literal with optional datatype or language tag
    Literal(Literal),
    /// Blank node identifier (without the `_:` prefix)
    BlankNode(String),
    /// Query variable (without the leading `?`)
    Variable(String),
}

impl Term {
    /// Create a named node
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    /// Create a query variable
    pub fn variable(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    /// Create a blank node
    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode(id.into())
    }

    /// Create a plain literal
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal::plain(value))
    }

    /// The lexical value of this term
    pub fn value(&self) -> &str {
        match self {
            Term::Iri(v) | Term::BlankNode(v) | Term::Variable(v) => v,
            Term::Literal(l) => l.value(),
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Literal(l) => write!(f, "{}", l),
            Term::BlankNode(id) => write!(f, "_:{}", id),
            Term::Variable(name) => write!(f, "?{}", name),
        }
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

/// An RDF literal
///
/// A literal carries either a language tag or a datatype, never both.
/// A literal with neither is a plain `xsd:string`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    value: String,
    datatype: Option<String>,
    language: Option<String>,
}

impl Literal {
    /// Plain string literal
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Literal with an explicit datatype IRI
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// Language-tagged string
    pub fn lang_tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.value)?;
        if let Some(lang) = &self.language {
            write!(f, "@{}", lang)
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^<{}>", dt)
        } else {
            Ok(())
        }
    }
}

/// A native value as handed to the filter API, before coercion to a term
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<Utc>),
    Term(Term),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::DateTime(v.with_timezone(&Utc))
    }
}

impl From<Term> for Value {
    fn from(v: Term) -> Self {
        Value::Term(v)
    }
}

impl From<&Term> for Value {
    fn from(v: &Term) -> Self {
        Value::Term(v.clone())
    }
}

impl From<Literal> for Value {
    fn from(v: Literal) -> Self {
        Value::Term(Term::Literal(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_display() {
        assert_eq!(Term::iri("http://example.com").to_string(), "<http://example.com>");
        assert_eq!(Term::variable("raum").to_string(), "?raum");
        assert_eq!(Term::blank("b0").to_string(), "_:b0");
        assert_eq!(
            Term::Literal(Literal::lang_tagged("foo", "en")).to_string(),
            "\"foo\"@en"
        );
    }

    #[test]
    fn test_term_value() {
        assert_eq!(Term::literal("x").value(), "x");
        assert_eq!(Term::iri("http://a/b").value(), "http://a/b");
        assert!(Term::iri("http://a/b").is_iri());
        assert!(Term::variable("v").is_variable());
        assert!(Term::variable("v").as_literal().is_none());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(3), Value::Int(3));
        assert_eq!(Value::from("a"), Value::Str("a".to_string()));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(
            Value::from(Literal::plain("a")),
            Value::Term(Term::literal("a"))
        );
    }
}
