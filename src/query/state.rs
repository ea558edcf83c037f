//! Query state
//!
//! The immutable snapshot carried by a [`Query`](super::Query). Every builder call
//! clones it, applies a change and wraps the result in a new query.

use crate::component::Component;
use crate::expr::Expr;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Binding name to component, in selection order
pub type Selections = IndexMap<String, Component>;

/// Picks a component out of the current selections
pub type ComponentResolver = Arc<dyn Fn(&Selections) -> Option<Component> + Send + Sync>;

/// Default page size of a fresh query
pub const DEFAULT_LIMIT: u64 = 10;

/// A group-by key
#[derive(Clone)]
pub enum GroupBy {
    /// A binding name from the selections
    Name(String),
    /// Evaluated against the selections at compile time
    Resolver(ComponentResolver),
}

impl fmt::Debug for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Name(name) => f.debug_tuple("Name").field(name).finish(),
            GroupBy::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl From<&str> for GroupBy {
    fn from(name: &str) -> Self {
        GroupBy::Name(name.to_string())
    }
}

impl From<String> for GroupBy {
    fn from(name: String) -> Self {
        GroupBy::Name(name)
    }
}

/// What a caller put in a `select` slot
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Component(Component),
    /// An empty slot
    Missing,
    /// Something that is not a component, e.g. an unresolved name
    Invalid(String),
}

impl From<Component> for Selection {
    fn from(c: Component) -> Self {
        Selection::Component(c)
    }
}

impl From<&Component> for Selection {
    fn from(c: &Component) -> Self {
        Selection::Component(c.clone())
    }
}

impl From<Option<Component>> for Selection {
    fn from(c: Option<Component>) -> Self {
        c.map(Selection::Component).unwrap_or(Selection::Missing)
    }
}

impl From<Option<&Component>> for Selection {
    fn from(c: Option<&Component>) -> Self {
        c.cloned().map(Selection::Component).unwrap_or(Selection::Missing)
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::Invalid(value.to_string())
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Selection::Invalid(value)
    }
}

/// Everything a query has accumulated so far
#[derive(Debug, Clone)]
pub struct QueryState {
    pub selections: Selections,
    pub filters: Vec<Expr>,
    pub group_by: Vec<GroupBy>,
    pub having: Vec<Expr>,
    pub offset: u64,
    /// `None` means unbounded
    pub limit: Option<u64>,
    pub distinct: bool,
    pub order: Vec<Component>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            selections: Selections::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            offset: 0,
            limit: Some(DEFAULT_LIMIT),
            distinct: false,
            order: Vec::new(),
        }
    }
}

impl QueryState {
    /// Whether any selected measure carries an aggregation
    pub fn has_aggregate(&self) -> bool {
        self.selections.values().any(|c| c.aggregation().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = QueryState::default();
        assert!(state.selections.is_empty());
        assert!(state.filters.is_empty());
        assert!(state.group_by.is_empty());
        assert!(state.having.is_empty());
        assert_eq!(state.offset, 0);
        assert_eq!(state.limit, Some(10));
        assert!(!state.distinct);
        assert!(state.order.is_empty());
    }

    #[test]
    fn test_selection_conversions() {
        let c = Component::dimension("http://example.com/raum");
        assert_eq!(Selection::from(&c), Selection::Component(c.clone()));
        assert_eq!(Selection::from(None::<Component>), Selection::Missing);
        assert_eq!(
            Selection::from("raumDimension"),
            Selection::Invalid("raumDimension".to_string())
        );
    }

    #[test]
    fn test_has_aggregate() {
        let mut state = QueryState::default();
        let bep = Component::measure("http://example.com/bep");
        state.selections.insert("bep".to_string(), bep.clone());
        assert!(!state.has_aggregate());
        state.selections.insert("bep".to_string(), bep.avg());
        assert!(state.has_aggregate());
    }
}
