//! SPARQL text generation
//!
//! Turns a [`SelectQuery`] into query text. IRIs are shortened with the declared
//! prefixes where the local part allows it; `xsd:integer` literals are written bare.

use super::ast::{Expression, Op, Ordering, Pattern, Predicate, Projection, SelectQuery, Triple};
use crate::term::{vocab, Literal, Term};
use std::fmt;

/// Converts a query AST into text
pub trait Serializer: Send + Sync {
    fn serialize(&self, query: &SelectQuery) -> String;
}

/// Default SPARQL 1.1 text generator
#[derive(Debug, Clone)]
pub struct SparqlGenerator {
    indent: String,
}

impl Default for SparqlGenerator {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
        }
    }
}

impl SparqlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom indentation unit
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }
}

impl Serializer for SparqlGenerator {
    fn serialize(&self, query: &SelectQuery) -> String {
        Writer {
            indent: &self.indent,
            prefixes: &query.prefixes,
        }
        .query(query)
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SparqlGenerator::default().serialize(self))
    }
}

struct Writer<'a> {
    indent: &'a str,
    prefixes: &'a [(String, String)],
}

impl Writer<'_> {
    fn query(&self, query: &SelectQuery) -> String {
        let mut out = String::new();

        for (prefix, ns) in self.prefixes {
            out.push_str(&format!("PREFIX {}: <{}>\n", prefix, ns));
        }

        out.push_str("SELECT ");
        if query.distinct {
            out.push_str("DISTINCT ");
        }
        if query.variables.is_empty() {
            out.push('*');
        } else {
            let projections: Vec<String> =
                query.variables.iter().map(|p| self.projection(p)).collect();
            out.push_str(&projections.join(" "));
        }
        out.push('\n');

        for graph in &query.from {
            out.push_str(&format!("FROM {}\n", self.iri(graph)));
        }

        out.push_str("WHERE {\n");
        for pattern in &query.patterns {
            self.pattern(&mut out, pattern, 1);
        }
        out.push_str("}\n");

        if !query.group.is_empty() {
            let keys: Vec<String> = query.group.iter().map(|g| format!("?{}", g)).collect();
            out.push_str(&format!("GROUP BY {}\n", keys.join(" ")));
        }

        if let Some(having) = &query.having {
            out.push_str(&format!("HAVING({})\n", self.expression(having)));
        }

        if !query.order.is_empty() {
            let keys: Vec<String> = query.order.iter().map(ordering).collect();
            out.push_str(&format!("ORDER BY {}\n", keys.join(" ")));
        }

        if query.offset > 0 {
            out.push_str(&format!("OFFSET {}\n", query.offset));
        }

        if let Some(limit) = query.limit {
            out.push_str(&format!("LIMIT {}\n", limit));
        }

        out
    }

    fn projection(&self, projection: &Projection) -> String {
        match projection {
            Projection::Variable(name) => format!("?{}", name),
            Projection::Expression {
                expression,
                variable,
            } => format!("({} AS ?{})", self.expression(expression), variable),
        }
    }

    fn pattern(&self, out: &mut String, pattern: &Pattern, depth: usize) {
        let pad = self.indent.repeat(depth);
        match pattern {
            Pattern::Bgp(triples) => {
                for triple in triples {
                    out.push_str(&format!("{}{}\n", pad, self.triple(triple)));
                }
            }
            Pattern::Optional(inner) => {
                out.push_str(&format!("{}OPTIONAL {{\n", pad));
                for p in inner {
                    self.pattern(out, p, depth + 1);
                }
                out.push_str(&format!("{}}}\n", pad));
            }
            Pattern::Filter(expression) => {
                out.push_str(&format!("{}FILTER({})\n", pad, self.expression(expression)));
            }
            Pattern::Bind {
                variable,
                expression,
            } => {
                out.push_str(&format!(
                    "{}BIND({} AS ?{})\n",
                    pad,
                    self.expression(expression),
                    variable
                ));
            }
        }
    }

    fn triple(&self, triple: &Triple) -> String {
        let predicate = match &triple.predicate {
            Predicate::Term(t) => self.term(t),
            Predicate::Alternative(alternatives) => {
                let parts: Vec<String> = alternatives.iter().map(|t| self.term(t)).collect();
                format!("({})", parts.join("|"))
            }
        };
        format!(
            "{} {} {}.",
            self.term(&triple.subject),
            predicate,
            self.term(&triple.object)
        )
    }

    fn expression(&self, expression: &Expression) -> String {
        match expression {
            Expression::Term(t) => self.term(t),
            Expression::Tuple(items) => format!("({})", self.list(items)),
            Expression::Aggregate {
                aggregation,
                expression,
                distinct,
            } => format!(
                "{}({}{})",
                aggregation,
                if *distinct { "DISTINCT " } else { "" },
                self.expression(expression)
            ),
            Expression::Operation { op, args } => self.operation(*op, args),
        }
    }

    fn operation(&self, op: Op, args: &[Expression]) -> String {
        match op {
            Op::Not => format!("!({})", self.list(args)),
            Op::In | Op::NotIn => {
                let keyword = if op == Op::In { "IN" } else { "NOT IN" };
                let (left, rest) = match args.split_first() {
                    Some(split) => split,
                    None => return format!("{}()", keyword),
                };
                let items = match rest {
                    [Expression::Tuple(items)] => self.list(items),
                    other => self.list(other),
                };
                format!("{} {}({})", self.operand(left), keyword, items)
            }
            op if op.is_infix() => {
                let operands: Vec<String> = args.iter().map(|a| self.operand(a)).collect();
                operands.join(&format!(" {} ", op))
            }
            op => format!("{}({})", op.as_str().to_uppercase(), self.list(args)),
        }
    }

    /// Operand of an infix operator; nested operations are parenthesized
    fn operand(&self, expression: &Expression) -> String {
        match expression {
            Expression::Operation { .. } => format!("({})", self.expression(expression)),
            other => self.expression(other),
        }
    }

    fn list(&self, items: &[Expression]) -> String {
        let parts: Vec<String> = items.iter().map(|e| self.expression(e)).collect();
        parts.join(", ")
    }

    fn term(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) => self.iri(iri),
            Term::Variable(name) => format!("?{}", name),
            Term::BlankNode(id) => format!("_:{}", id),
            Term::Literal(literal) => self.literal(literal),
        }
    }

    fn iri(&self, iri: &str) -> String {
        for (prefix, ns) in self.prefixes {
            if let Some(local) = iri.strip_prefix(ns.as_str()) {
                if is_local_name(local) {
                    return format!("{}:{}", prefix, local);
                }
            }
        }
        format!("<{}>", iri)
    }

    fn literal(&self, literal: &Literal) -> String {
        let quoted = format!("\"{}\"", escape(literal.value()));
        if let Some(lang) = literal.language() {
            return format!("{}@{}", quoted, lang);
        }
        match literal.datatype() {
            None => quoted,
            Some(dt) if dt == vocab::xsd("string") => quoted,
            Some(dt) if dt == vocab::xsd("integer") && is_integer(literal.value()) => {
                literal.value().to_string()
            }
            Some(dt) => format!("{}^^{}", quoted, self.iri(dt)),
        }
    }
}

fn ordering(order: &Ordering) -> String {
    if order.descending {
        format!("DESC(?{})", order.variable)
    } else {
        format!("?{}", order.variable)
    }
}

/// Local parts safe to write after a prefix; `-` and `.` may not lead
fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() || first == '_' => chars
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
        _ => false,
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}
