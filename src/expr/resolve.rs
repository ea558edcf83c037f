//! Component-to-variable resolution

use super::{Binding, Expr, Operator};
use crate::component::Component;
use crate::query::{QueryError, QueryResult};
use crate::sparql::ast::Expression;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Tracks which variable each component is bound to during compilation
///
/// Three views are kept in sync: variable name to component, component to name,
/// and component IRI to name. Helper variables that belong to no component (label
/// candidates, aggregate sources) are only reserved so auto-naming avoids them.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    by_name: IndexMap<String, Component>,
    by_component: HashMap<Component, String>,
    by_iri: HashMap<String, String>,
    reserved: HashSet<String>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a component to a variable, registering all three views
    pub fn bind(&mut self, name: impl Into<String>, component: &Component) {
        let name = name.into();
        if let Some(iri) = component.iri() {
            self.by_iri.insert(iri.to_string(), name.clone());
        }
        self.by_component.insert(component.clone(), name.clone());
        self.by_name.insert(name, component.clone());
    }

    /// Bind a hierarchy step; its IRI, if pinned, is a concept rather than a property
    pub fn bind_step(&mut self, name: impl Into<String>, component: &Component) {
        let name = name.into();
        self.by_component.insert(component.clone(), name.clone());
        self.by_name.insert(name, component.clone());
    }

    /// Claim a variable name without making it resolvable
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.reserved.insert(name.into());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.by_name.contains_key(name) || self.reserved.contains(name)
    }

    /// The component a variable was bound to
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.by_name.get(name)
    }

    /// The variable a component is bound to, by identity first and then by IRI
    pub fn lookup(&self, component: &Component) -> Option<&str> {
        if let Some(name) = self.by_component.get(component) {
            return Some(name);
        }
        component
            .iri()
            .and_then(|iri| self.by_iri.get(iri))
            .map(String::as_str)
    }

    /// The variable bound to a component IRI
    pub fn lookup_iri(&self, iri: &str) -> Option<&str> {
        self.by_iri.get(iri).map(String::as_str)
    }

    /// Whether this exact component already has a variable
    pub fn contains(&self, component: &Component) -> bool {
        self.by_component.contains_key(component)
    }

    fn require(&self, component: &Component) -> QueryResult<&str> {
        self.lookup(component)
            .ok_or_else(|| QueryError::UnresolvedComponent(component.to_string()))
    }

    /// Replace every component inside an expression by its binding
    pub fn resolve(&self, expr: &Expr) -> QueryResult<Expr> {
        match expr {
            Expr::Component(c) => Ok(Expr::Binding(Binding::new(self.require(c)?))),
            Expr::Operator(op) => {
                let args = op
                    .args()
                    .iter()
                    .map(|a| self.resolve(a))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(Expr::Operator(Operator::new(op.op(), args)))
            }
            other => Ok(other.clone()),
        }
    }

    /// Resolve an expression and lower it to the query AST
    pub fn to_expression(&self, expr: &Expr) -> QueryResult<Expression> {
        let expression = match expr {
            Expr::Component(c) => Expression::variable(self.require(c)?),
            Expr::Operator(op) => Expression::Operation {
                op: op.op(),
                args: op
                    .args()
                    .iter()
                    .map(|a| self.to_expression(a))
                    .collect::<QueryResult<Vec<_>>>()?,
            },
            Expr::Binding(b) => Expression::variable(b.name()),
            Expr::Term(t) => Expression::Term(t.clone()),
            Expr::Tuple(terms) => {
                Expression::Tuple(terms.iter().cloned().map(Expression::Term).collect())
            }
        };
        Ok(expression)
    }

    /// Variable names in binding order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Filterable;
    use crate::sparql::ast::Op;
    use crate::term::Term;

    const RAUM: &str = "https://ld.stadt-zuerich.ch/statistics/property/RAUM";

    #[test]
    fn test_lookup_by_identity_then_iri() {
        let raum = Component::dimension(RAUM);
        let mut table = BindingTable::new();
        table.bind("raum", &raum);

        assert_eq!(table.lookup(&raum), Some("raum"));
        // a modified copy still resolves through its IRI
        assert_eq!(table.lookup(&raum.desc()), Some("raum"));
        assert_eq!(table.lookup_iri(RAUM), Some("raum"));
        assert!(table.is_taken("raum"));
    }

    #[test]
    fn test_unpinned_step_needs_identity() {
        let raum = Component::dimension(RAUM);
        let step = raum.broader();
        let mut table = BindingTable::new();
        table.bind("raum", &raum);
        assert_eq!(table.lookup(&step), None);

        table.bind_step("quartier", &step);
        assert_eq!(table.lookup(&step), Some("quartier"));
    }

    #[test]
    fn test_reserved_names_do_not_resolve() {
        let bep = Component::measure("http://example.com/bep");
        let mut table = BindingTable::new();
        table.reserve("bepAvg");
        assert!(table.is_taken("bepAvg"));
        assert_eq!(table.lookup(&bep), None);
        assert_eq!(table.component("bepAvg"), None);
        assert_eq!(table.names().count(), 0);
    }

    #[test]
    fn test_resolve_nested() {
        let raum = Component::dimension(RAUM);
        let mut table = BindingTable::new();
        table.bind("raum", &raum);

        let resolved = table.resolve(&Expr::Operator(raum.not().bound())).unwrap();
        let expected = Binding::new("raum").not().bound();
        assert_eq!(resolved, Expr::Operator(expected));
    }

    #[test]
    fn test_resolve_unknown_component() {
        let table = BindingTable::new();
        let raum = Component::dimension(RAUM);
        assert!(matches!(
            table.resolve(&Expr::Component(raum)),
            Err(QueryError::UnresolvedComponent(_))
        ));
    }

    #[test]
    fn test_to_expression() {
        let raum = Component::dimension(RAUM);
        let mut table = BindingTable::new();
        table.bind("raum", &raum);

        let expr = Expr::Operator(raum.is_in(["http://example.com"]));
        assert_eq!(
            table.to_expression(&expr).unwrap(),
            Expression::Operation {
                op: Op::In,
                args: vec![
                    Expression::variable("raum"),
                    Expression::Tuple(vec![Expression::Term(Term::iri("http://example.com"))]),
                ],
            }
        );
    }
}
