//! Filter Expressions
//!
//! A small expression algebra for building filters over selected components:
//!
//! - **Expr**: components, operators, bindings, terms and term lists
//! - **Filterable**: the fluent methods (`gte`, `is_in`, `regex`, `not`, ...)
//! - **BindingTable**: maps components to the variables they are bound to
//!
//! # Examples
//!
//! ```rust,ignore
//! use cubequery::expr::Filterable;
//!
//! let f = raum.is_in(["https://ld.stadt-zuerich.ch/statistics/code/R30000"]);
//! let g = bep.not().gte(10);   // !(?bep >= 10)
//! let h = raum.not().is_in(["http://example.com"]); // ?raum NOT IN(<http://example.com>)
//! ```

mod filterable;
mod resolve;

pub use filterable::Filterable;
pub use resolve::BindingTable;

use crate::component::Component;
use crate::sparql::ast::Op;
use crate::term::{coerce, Term, Value};
use std::fmt;

/// A filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A component, resolved to its variable at compile time
    Component(Component),
    Operator(Operator),
    /// A variable referenced by name
    Binding(Binding),
    Term(Term),
    /// A list of terms, the right-hand side of `in`/`notin`
    Tuple(Vec<Term>),
}

/// An operator applied to its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    op: Op,
    args: Vec<Expr>,
}

impl Operator {
    pub fn new(op: Op, args: Vec<Expr>) -> Self {
        Self { op, args }
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }
}

/// A reference to an already-bound variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    name: String,
}

impl Binding {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Expr {
    /// Build a term list, coercing each value
    pub fn tuple<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::Tuple(values.into_iter().map(coerce).collect())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Component(c) => write!(f, "{}", c),
            Expr::Operator(o) => write!(f, "{}", o),
            Expr::Binding(b) => write!(f, "?{}", b.name),
            Expr::Term(t) => write!(f, "{}", t),
            Expr::Tuple(terms) => {
                let items: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", items.join(", "))
            }
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.op, args.join(", "))
    }
}

impl From<Component> for Expr {
    fn from(c: Component) -> Self {
        Expr::Component(c)
    }
}

impl From<&Component> for Expr {
    fn from(c: &Component) -> Self {
        Expr::Component(c.clone())
    }
}

impl From<Operator> for Expr {
    fn from(o: Operator) -> Self {
        Expr::Operator(o)
    }
}

impl From<Binding> for Expr {
    fn from(b: Binding) -> Self {
        Expr::Binding(b)
    }
}

impl From<Term> for Expr {
    fn from(t: Term) -> Self {
        Expr::Term(t)
    }
}

impl From<Vec<Term>> for Expr {
    fn from(terms: Vec<Term>) -> Self {
        Expr::Tuple(terms)
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Term(coerce(v))
    }
}

macro_rules! expr_from_native {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Expr::Term(coerce(v))
                }
            }
        )*
    };
}

expr_from_native!(
    bool,
    i32,
    i64,
    u32,
    f32,
    f64,
    &str,
    String,
    &String,
    crate::term::Literal,
    chrono::DateTime<chrono::Utc>
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_values_are_coerced() {
        assert_eq!(Expr::from("http://example.com"), Expr::Term(Term::iri("http://example.com")));
        assert_eq!(Expr::from("foo"), Expr::Term(Term::literal("foo")));
        match Expr::from(10) {
            Expr::Term(Term::Literal(l)) => assert_eq!(l.value(), "10"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tuple() {
        let t = Expr::tuple(["http://example.com", "foo"]);
        assert_eq!(
            t,
            Expr::Tuple(vec![Term::iri("http://example.com"), Term::literal("foo")])
        );
    }

    #[test]
    fn test_display() {
        let op = Operator::new(
            Op::Gte,
            vec![Expr::Binding(Binding::new("a")), Expr::from(10)],
        );
        assert!(op.to_string().starts_with(">=(?a, "));
    }
}
