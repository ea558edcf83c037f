//! Fluent filter methods
//!
//! Every method returns a new [`Operator`] whose first argument is the receiver.
//! When the receiver is itself a negation (`x.not()`), the negation is folded into
//! the new operator instead of nesting: `in`/`=` turn into `notin`/`!=`, all other
//! operators are wrapped as `!(op(...))`.

use super::{Binding, Expr, Operator};
use crate::component::Component;
use crate::query::{QueryError, QueryResult};
use crate::sparql::ast::Op;
use crate::term::{to_literal, Term, Value};

/// Build `op(receiver, extra...)`, absorbing a pending negation on the receiver
fn fold(op: Op, receiver: Expr, extra: Vec<Expr>) -> Operator {
    if let Expr::Operator(prev) = &receiver {
        if prev.op == Op::Not {
            let mut args = prev.args.clone();
            args.extend(extra);
            return match op.negated() {
                Some(negated) => Operator::new(negated, args),
                None => Operator::new(Op::Not, vec![Expr::Operator(Operator::new(op, args))]),
            };
        }
    }

    let mut args = Vec::with_capacity(extra.len() + 1);
    args.push(receiver);
    args.extend(extra);
    Operator::new(op, args)
}

#[derive(Debug, Clone, Copy)]
enum Arity {
    None,
    One,
    Regex,
}

fn method(name: &str) -> Option<(Op, Arity)> {
    let method = match name {
        "not" => (Op::Not, Arity::None),
        "bound" => (Op::Bound, Arity::None),
        "isIRI" | "is_iri" => (Op::IsIri, Arity::None),
        "isBlank" | "is_blank" => (Op::IsBlank, Arity::None),
        "isLiteral" | "is_literal" => (Op::IsLiteral, Arity::None),
        "lang" => (Op::Lang, Arity::None),
        "datatype" => (Op::Datatype, Arity::None),
        "str" => (Op::Str, Arity::None),
        "gt" => (Op::Gt, Arity::One),
        "gte" => (Op::Gte, Arity::One),
        "lt" => (Op::Lt, Arity::One),
        "lte" => (Op::Lte, Arity::One),
        "equals" => (Op::Equals, Arity::One),
        "notEquals" | "not_equals" => (Op::NotEquals, Arity::One),
        "sameTerm" | "same_term" => (Op::SameTerm, Arity::One),
        "in" | "is_in" => (Op::In, Arity::One),
        "notIn" | "not_in" => (Op::NotIn, Arity::One),
        "regex" => (Op::Regex, Arity::Regex),
        _ => return None,
    };
    Some(method)
}

fn check_arity(name: &str, arity: Arity, count: usize) -> QueryResult<()> {
    match arity {
        Arity::None if count > 0 => Err(QueryError::Arity(format!(
            ".{} doesn't accept arguments",
            name
        ))),
        Arity::One if count != 1 => Err(QueryError::Arity(format!(
            ".{} expects one argument",
            name
        ))),
        Arity::Regex if !(1..=2).contains(&count) => Err(QueryError::Arity(format!(
            ".{} expects a pattern and optional flags",
            name
        ))),
        _ => Ok(()),
    }
}

/// Fluent filter construction on anything that can appear in an expression
pub trait Filterable {
    fn to_expr(&self) -> Expr;

    /// Negate; the next method call absorbs the negation
    fn not(&self) -> Operator {
        Operator::new(Op::Not, vec![self.to_expr()])
    }

    fn bound(&self) -> Operator {
        fold(Op::Bound, self.to_expr(), Vec::new())
    }

    fn gt(&self, other: impl Into<Expr>) -> Operator {
        fold(Op::Gt, self.to_expr(), vec![other.into()])
    }

    fn gte(&self, other: impl Into<Expr>) -> Operator {
        fold(Op::Gte, self.to_expr(), vec![other.into()])
    }

    fn lt(&self, other: impl Into<Expr>) -> Operator {
        fold(Op::Lt, self.to_expr(), vec![other.into()])
    }

    fn lte(&self, other: impl Into<Expr>) -> Operator {
        fold(Op::Lte, self.to_expr(), vec![other.into()])
    }

    fn equals(&self, other: impl Into<Expr>) -> Operator {
        fold(Op::Equals, self.to_expr(), vec![other.into()])
    }

    fn not_equals(&self, other: impl Into<Expr>) -> Operator {
        fold(Op::NotEquals, self.to_expr(), vec![other.into()])
    }

    fn same_term(&self, other: impl Into<Expr>) -> Operator {
        fold(Op::SameTerm, self.to_expr(), vec![other.into()])
    }

    /// Membership in a list of values; each value is coerced to a term
    fn is_in<I, V>(&self, values: I) -> Operator
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
        Self: Sized,
    {
        fold(Op::In, self.to_expr(), vec![Expr::tuple(values)])
    }

    /// Non-membership, built directly as `notin`
    fn not_in<I, V>(&self, values: I) -> Operator
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
        Self: Sized,
    {
        Operator::new(Op::NotIn, vec![self.to_expr(), Expr::tuple(values)])
    }

    /// Match against a regular expression; the pattern is always a literal
    fn regex(&self, pattern: impl Into<Value>) -> Operator {
        let pattern = Expr::Term(Term::Literal(to_literal(pattern)));
        fold(Op::Regex, self.to_expr(), vec![pattern])
    }

    fn regex_with_flags(&self, pattern: impl Into<Value>, flags: impl Into<Value>) -> Operator {
        let pattern = Expr::Term(Term::Literal(to_literal(pattern)));
        let flags = Expr::Term(Term::Literal(to_literal(flags)));
        fold(Op::Regex, self.to_expr(), vec![pattern, flags])
    }

    fn is_iri(&self) -> Operator {
        fold(Op::IsIri, self.to_expr(), Vec::new())
    }

    fn is_blank(&self) -> Operator {
        fold(Op::IsBlank, self.to_expr(), Vec::new())
    }

    fn is_literal(&self) -> Operator {
        fold(Op::IsLiteral, self.to_expr(), Vec::new())
    }

    fn lang(&self) -> Operator {
        fold(Op::Lang, self.to_expr(), Vec::new())
    }

    fn datatype(&self) -> Operator {
        fold(Op::Datatype, self.to_expr(), Vec::new())
    }

    fn str(&self) -> Operator {
        fold(Op::Str, self.to_expr(), Vec::new())
    }

    /// Call a filter method by name with already-built arguments
    ///
    /// Accepts the camelCase method names (`isIRI`, `sameTerm`, `notIn`, ...) as well as
    /// their snake_case forms, and checks the argument count.
    fn call(&self, name: &str, args: Vec<Expr>) -> QueryResult<Operator> {
        let (op, arity) =
            method(name).ok_or_else(|| QueryError::UnknownOperator(name.to_string()))?;
        check_arity(name, arity, args.len())?;

        let receiver = self.to_expr();
        let operator = match op {
            Op::Not => Operator::new(Op::Not, vec![receiver]),
            Op::NotIn => {
                let mut all = vec![receiver];
                all.extend(args);
                Operator::new(Op::NotIn, all)
            }
            _ => fold(op, receiver, args),
        };
        Ok(operator)
    }
}

impl Filterable for Component {
    fn to_expr(&self) -> Expr {
        Expr::Component(self.clone())
    }
}

impl Filterable for Operator {
    fn to_expr(&self) -> Expr {
        Expr::Operator(self.clone())
    }
}

impl Filterable for Binding {
    fn to_expr(&self) -> Expr {
        Expr::Binding(self.clone())
    }
}

impl Filterable for Expr {
    fn to_expr(&self) -> Expr {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> Binding {
        Binding::new("a")
    }

    #[test]
    fn test_plain_operators() {
        let op = a().gte(Binding::new("b"));
        assert_eq!(op.op(), Op::Gte);
        assert_eq!(
            op.args(),
            &[Expr::Binding(a()), Expr::Binding(Binding::new("b"))]
        );
    }

    #[test]
    fn test_not_folds_into_negated_operators() {
        let op = a().not().equals(10);
        assert_eq!(op.op(), Op::NotEquals);
        assert_eq!(op.args().len(), 2);

        let op = a().not().is_in(["http://example.com"]);
        assert_eq!(op.op(), Op::NotIn);
        assert_eq!(
            op.args(),
            &[
                Expr::Binding(a()),
                Expr::Tuple(vec![Term::iri("http://example.com")])
            ]
        );
    }

    #[test]
    fn test_not_wraps_other_operators() {
        let op = a().not().bound();
        assert_eq!(op.op(), Op::Not);
        assert_eq!(
            op.args(),
            &[Expr::Operator(Operator::new(Op::Bound, vec![Expr::Binding(a())]))]
        );

        let op = a().not().gte(10);
        assert_eq!(op.op(), Op::Not);
        match &op.args()[0] {
            Expr::Operator(inner) => {
                assert_eq!(inner.op(), Op::Gte);
                assert_eq!(inner.args()[0], Expr::Binding(a()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_double_not_is_preserved() {
        let op = a().not().not().bound();
        assert_eq!(op.op(), Op::Not);
        match &op.args()[0] {
            Expr::Operator(inner) => {
                assert_eq!(inner.op(), Op::Bound);
                assert_eq!(inner.args(), &[Expr::Operator(a().not())]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_in_is_direct() {
        let op = a().not_in(["http://example.com", "foo"]);
        assert_eq!(op.op(), Op::NotIn);
        assert_eq!(op.args()[0], Expr::Binding(a()));
    }

    #[test]
    fn test_regex_pattern_stays_literal() {
        let op = a().regex_with_flags("http://x", "i");
        assert_eq!(op.args()[1], Expr::Term(Term::literal("http://x")));
        assert_eq!(op.args()[2], Expr::Term(Term::literal("i")));
    }

    #[test]
    fn test_receiver_is_not_mutated() {
        let negated = a().not();
        let _ = negated.equals(1);
        assert_eq!(negated, Operator::new(Op::Not, vec![Expr::Binding(a())]));
    }

    #[test]
    fn test_call_by_name() {
        let op = a().call("sameTerm", vec![Expr::Binding(Binding::new("b"))]).unwrap();
        assert_eq!(op.op(), Op::SameTerm);

        let op = a().not().call("in", vec![Expr::tuple([1, 2])]).unwrap();
        assert_eq!(op.op(), Op::NotIn);

        let op = a().call("notIn", vec![Expr::tuple([1])]).unwrap();
        assert_eq!(op.op(), Op::NotIn);
    }

    #[test]
    fn test_call_arity_errors() {
        let err = a().call("isIRI", vec![Expr::from(1)]).unwrap_err();
        assert_eq!(err.to_string(), ".isIRI doesn't accept arguments");

        let err = a().call("str", vec![Expr::from(1)]).unwrap_err();
        assert_eq!(err.to_string(), ".str doesn't accept arguments");

        let err = a().call("sameTerm", vec![]).unwrap_err();
        assert_eq!(err.to_string(), ".sameTerm expects one argument");

        let err = a()
            .call("equals", vec![Expr::from(1), Expr::from(2)])
            .unwrap_err();
        assert_eq!(err.to_string(), ".equals expects one argument");

        let err = a().call("notEquals", vec![]).unwrap_err();
        assert_eq!(err.to_string(), ".notEquals expects one argument");
    }

    #[test]
    fn test_call_unknown() {
        assert!(matches!(
            a().call("frobnicate", vec![]),
            Err(QueryError::UnknownOperator(_))
        ));
    }

    #[test]
    fn test_component_receiver() {
        let raum = Component::dimension("http://example.com/raum");
        let op = raum.bound();
        assert_eq!(op.args(), &[Expr::Component(raum)]);
    }
}
