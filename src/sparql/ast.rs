//! SPARQL SELECT Abstract Syntax Tree
//!
//! A structured representation of the queries produced by the compiler. It covers the
//! subset of SPARQL 1.1 the compiler emits: basic graph patterns, OPTIONAL, FILTER,
//! BIND, projections with aggregates, GROUP BY, HAVING, ORDER BY, OFFSET and LIMIT.

use crate::component::Aggregation;
use crate::term::Term;
use std::fmt;

/// Operators and built-in functions usable in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Not,
    And,
    Or,
    Equals,
    NotEquals,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Bound,
    Regex,
    IsIri,
    IsBlank,
    IsLiteral,
    Lang,
    Datatype,
    Str,
    SameTerm,
    LangMatches,
    Coalesce,
}

impl Op {
    /// Operator tag as used in the expression vocabulary
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Not => "!",
            Op::And => "&&",
            Op::Or => "||",
            Op::Equals => "=",
            Op::NotEquals => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::In => "in",
            Op::NotIn => "notin",
            Op::Bound => "bound",
            Op::Regex => "regex",
            Op::IsIri => "isiri",
            Op::IsBlank => "isblank",
            Op::IsLiteral => "isliteral",
            Op::Lang => "lang",
            Op::Datatype => "datatype",
            Op::Str => "str",
            Op::SameTerm => "sameterm",
            Op::LangMatches => "langmatches",
            Op::Coalesce => "coalesce",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let op = match s.to_lowercase().as_str() {
            "!" => Op::Not,
            "&&" => Op::And,
            "||" => Op::Or,
            "=" => Op::Equals,
            "!=" => Op::NotEquals,
            ">" => Op::Gt,
            ">=" => Op::Gte,
            "<" => Op::Lt,
            "<=" => Op::Lte,
            "in" => Op::In,
            "notin" => Op::NotIn,
            "bound" => Op::Bound,
            "regex" => Op::Regex,
            "isiri" => Op::IsIri,
            "isblank" => Op::IsBlank,
            "isliteral" => Op::IsLiteral,
            "lang" => Op::Lang,
            "datatype" => Op::Datatype,
            "str" => Op::Str,
            "sameterm" => Op::SameTerm,
            "langmatches" => Op::LangMatches,
            "coalesce" => Op::Coalesce,
            _ => return None,
        };
        Some(op)
    }

    /// The operator that expresses the negation of this one directly, if any
    pub fn negated(&self) -> Option<Op> {
        match self {
            Op::In => Some(Op::NotIn),
            Op::Equals => Some(Op::NotEquals),
            _ => None,
        }
    }

    /// Infix operators are printed between their operands
    pub fn is_infix(&self) -> bool {
        matches!(
            self,
            Op::And | Op::Or | Op::Equals | Op::NotEquals | Op::Gt | Op::Gte | Op::Lt | Op::Lte
        )
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An expression inside FILTER, BIND, HAVING or a projection
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Term(Term),
    Operation { op: Op, args: Vec<Expression> },
    Tuple(Vec<Expression>),
    Aggregate {
        aggregation: Aggregation,
        expression: Box<Expression>,
        distinct: bool,
    },
}

impl Expression {
    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Term(Term::variable(name))
    }

    pub fn operation(op: Op, args: Vec<Expression>) -> Self {
        Expression::Operation { op, args }
    }
}

/// A single item in the SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Variable(String),
    /// `(expression AS ?variable)`
    Expression { expression: Expression, variable: String },
}

impl Projection {
    /// Name of the projected variable
    pub fn name(&self) -> &str {
        match self {
            Projection::Variable(name) => name,
            Projection::Expression { variable, .. } => variable,
        }
    }

    /// Whether this projection is a plain variable rather than a computed expression
    pub fn is_plain(&self) -> bool {
        matches!(self, Projection::Variable(_))
    }
}

/// Predicate position of a triple pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Term(Term),
    /// Alternative property path `(a|b)`
    Alternative(Vec<Term>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Predicate,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate: Predicate::Term(predicate),
            object,
        }
    }
}

/// A group graph pattern element
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Bgp(Vec<Triple>),
    Optional(Vec<Pattern>),
    Filter(Expression),
    Bind { variable: String, expression: Expression },
}

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub variable: String,
    pub descending: bool,
}

/// A SPARQL SELECT query
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub prefixes: Vec<(String, String)>,
    pub variables: Vec<Projection>,
    pub distinct: bool,
    pub from: Vec<String>,
    pub patterns: Vec<Pattern>,
    pub group: Vec<String>,
    pub having: Option<Expression>,
    pub order: Vec<Ordering>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl Default for SelectQuery {
    fn default() -> Self {
        Self {
            prefixes: Vec::new(),
            variables: Vec::new(),
            distinct: false,
            from: Vec::new(),
            patterns: Vec::new(),
            group: Vec::new(),
            having: None,
            order: Vec::new(),
            offset: 0,
            limit: None,
        }
    }
}

impl SelectQuery {
    /// All triples of the top-level basic graph patterns
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.patterns
            .iter()
            .filter_map(|p| match p {
                Pattern::Bgp(triples) => Some(triples.iter()),
                _ => None,
            })
            .flatten()
    }

    /// Names of all projected variables, in order
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(Projection::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation_pairs() {
        assert_eq!(Op::In.negated(), Some(Op::NotIn));
        assert_eq!(Op::Equals.negated(), Some(Op::NotEquals));
        assert_eq!(Op::Gte.negated(), None);
        assert_eq!(Op::Bound.negated(), None);
    }

    #[test]
    fn test_op_names() {
        for op in [Op::Not, Op::Gte, Op::NotIn, Op::SameTerm, Op::LangMatches] {
            assert_eq!(Op::from_str(op.as_str()), Some(op));
        }
        assert_eq!(Op::from_str("isIRI"), Some(Op::IsIri));
        assert_eq!(Op::from_str("nope"), None);
    }

    #[test]
    fn test_projection_names() {
        let plain = Projection::Variable("a".to_string());
        let agg = Projection::Expression {
            expression: Expression::Aggregate {
                aggregation: Aggregation::Avg,
                expression: Box::new(Expression::variable("tmp")),
                distinct: false,
            },
            variable: "b".to_string(),
        };
        assert!(plain.is_plain());
        assert!(!agg.is_plain());
        assert_eq!(agg.name(), "b");
    }
}
