//! Query builder
//!
//! [`Query`] is an immutable value: every builder method returns a new query and
//! leaves the receiver as it was, so partially built queries can be shared and
//! extended in different directions.

use std::borrow::Borrow;
use std::sync::Arc;

use super::compiler::{compile, CompileContext};
use super::results::{self, ComponentValue, MinMax, ShapedRow};
use super::state::{GroupBy, QueryState, Selection, Selections};
use super::{QueryError, QueryResult};
use crate::component::Component;
use crate::cube::DataCube;
use crate::expr::{Expr, Operator};
use crate::sparql::ast::SelectQuery;

/// A filter given either as an expression or as a function of the current selections
pub enum FilterSpec {
    Expr(Expr),
    Resolver(Box<dyn FnOnce(&Selections) -> Expr + Send>),
}

impl FilterSpec {
    pub fn resolver<F, R>(f: F) -> Self
    where
        F: FnOnce(&Selections) -> R + Send + 'static,
        R: Into<Expr>,
    {
        FilterSpec::Resolver(Box::new(move |selections| f(selections).into()))
    }

    fn evaluate(self, selections: &Selections) -> Expr {
        match self {
            FilterSpec::Expr(expr) => expr,
            FilterSpec::Resolver(resolve) => resolve(selections),
        }
    }
}

impl From<Expr> for FilterSpec {
    fn from(expr: Expr) -> Self {
        FilterSpec::Expr(expr)
    }
}

impl From<Operator> for FilterSpec {
    fn from(operator: Operator) -> Self {
        FilterSpec::Expr(Expr::Operator(operator))
    }
}

/// A query against a [`DataCube`]
#[derive(Debug, Clone)]
pub struct Query {
    cube: DataCube,
    state: QueryState,
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl Query {
    pub(crate) fn new(cube: DataCube) -> Self {
        Self {
            cube,
            state: QueryState::default(),
        }
    }

    pub fn cube(&self) -> &DataCube {
        &self.cube
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn selections(&self) -> &Selections {
        &self.state.selections
    }

    fn with_state(&self, change: impl FnOnce(&mut QueryState)) -> Query {
        let mut state = self.state.clone();
        change(&mut state);
        Query {
            cube: self.cube.clone(),
            state,
        }
    }

    /// Add components under binding names
    ///
    /// Accepts any sequence of `(name, component)` pairs. Re-using a name replaces the
    /// earlier component in place.
    pub fn select<I, K, S>(&self, entries: I) -> QueryResult<Query>
    where
        I: IntoIterator<Item = (K, S)>,
        K: AsRef<str>,
        S: Into<Selection>,
    {
        let mut selections = self.state.selections.clone();
        for (name, selection) in entries {
            let name = name.as_ref();
            if !is_variable_name(name) {
                return Err(QueryError::InvalidBindingName {
                    binding: name.to_string(),
                });
            }
            match selection.into() {
                Selection::Component(component) => {
                    selections.insert(name.to_string(), component);
                }
                Selection::Missing => {
                    return Err(QueryError::MissingComponent {
                        binding: name.to_string(),
                    })
                }
                Selection::Invalid(_) => {
                    return Err(QueryError::NotAComponent {
                        binding: name.to_string(),
                    })
                }
            }
        }

        Ok(self.with_state(|state| state.selections = selections))
    }

    /// Add a filter expression
    pub fn filter(&self, filter: impl Into<Expr>) -> Query {
        let filter = filter.into();
        self.with_state(|state| state.filters.push(filter))
    }

    /// Add a filter computed from the current selections
    pub fn filter_with<F, R>(&self, f: F) -> Query
    where
        F: FnOnce(&Selections) -> R,
        R: Into<Expr>,
    {
        let filter = f(&self.state.selections).into();
        self.with_state(|state| state.filters.push(filter))
    }

    /// Add several filters at once, mixing expressions and resolvers
    pub fn filter_all<I>(&self, filters: I) -> Query
    where
        I: IntoIterator,
        I::Item: Into<FilterSpec>,
    {
        let selections = &self.state.selections;
        let filters: Vec<Expr> = filters
            .into_iter()
            .map(|f| f.into().evaluate(selections))
            .collect();
        self.with_state(|state| state.filters.extend(filters))
    }

    /// Group by a binding name
    pub fn group_by(&self, key: impl Into<GroupBy>) -> Query {
        let key = key.into();
        self.with_state(|state| state.group_by.push(key))
    }

    /// Group by a component picked from the selections at compile time
    pub fn group_by_with<F>(&self, resolve: F) -> Query
    where
        F: Fn(&Selections) -> Option<Component> + Send + Sync + 'static,
    {
        self.with_state(|state| state.group_by.push(GroupBy::Resolver(Arc::new(resolve))))
    }

    /// Add a HAVING condition
    pub fn having(&self, condition: impl Into<Expr>) -> Query {
        let condition = condition.into();
        self.with_state(|state| state.having.push(condition))
    }

    pub fn having_with<F, R>(&self, f: F) -> Query
    where
        F: FnOnce(&Selections) -> R,
        R: Into<Expr>,
    {
        let condition = f(&self.state.selections).into();
        self.with_state(|state| state.having.push(condition))
    }

    /// Append ordering keys; use [`Component::desc`] for descending order
    pub fn order_by<I>(&self, components: I) -> Query
    where
        I: IntoIterator,
        I::Item: Borrow<Component>,
    {
        let order: Vec<Component> = components
            .into_iter()
            .map(|c| c.borrow().clone())
            .collect();
        self.with_state(|state| state.order.extend(order))
    }

    pub fn order_by_with<F>(&self, f: F) -> Query
    where
        F: FnOnce(&Selections) -> Vec<Component>,
    {
        let order = f(&self.state.selections);
        self.with_state(|state| state.order.extend(order))
    }

    /// Page size; `None` removes the limit
    pub fn limit(&self, limit: Option<u64>) -> Query {
        self.with_state(|state| state.limit = limit)
    }

    pub fn offset(&self, offset: u64) -> Query {
        self.with_state(|state| state.offset = offset)
    }

    pub fn distinct(&self, distinct: bool) -> Query {
        self.with_state(|state| state.distinct = distinct)
    }

    /// Compile against a known list of cube dimensions
    pub fn compile(&self, dimensions: &[Component]) -> QueryResult<SelectQuery> {
        let ctx = CompileContext {
            cube_iri: self.cube.iri(),
            graph_iri: self.cube.graph_iri(),
            dimensions,
            languages: self.cube.languages(),
        };
        compile(&self.state, &ctx)
    }

    /// Compile to a query AST, looking up the cube's dimensions
    pub async fn to_sparql_ast(&self) -> QueryResult<SelectQuery> {
        let dimensions = self.cube.dimensions().await?;
        self.compile(&dimensions)
    }

    /// Compile to query text
    pub async fn to_sparql(&self) -> QueryResult<String> {
        let ast = self.to_sparql_ast().await?;
        Ok(self.cube.serializer().serialize(&ast))
    }

    async fn run(&self, ast: &SelectQuery) -> QueryResult<Vec<crate::fetcher::Row>> {
        let text = self.cube.serializer().serialize(ast);
        tracing::debug!(cube = %self.cube.iri(), "Executing cube query");
        let rows = self.cube.fetcher().select(&text).await?;
        Ok(rows)
    }

    /// Run the query and fold label columns into their values
    pub async fn execute(&self) -> QueryResult<Vec<ShapedRow>> {
        let ast = self.to_sparql_ast().await?;
        let rows = self.run(&ast).await?;
        Ok(results::shape_rows(rows))
    }

    fn values_query(&self) -> Query {
        self.with_state(|state| {
            state.limit = None;
            state.offset = 0;
            state.distinct = true;
        })
    }

    fn range_query(&self) -> Query {
        self.with_state(|state| {
            state.limit = None;
            state.offset = 0;
            state.distinct = false;
        })
    }

    /// Distinct-values query against known cube dimensions, without paging
    pub fn component_values_ast(&self, dimensions: &[Component]) -> QueryResult<SelectQuery> {
        self.values_query().compile(dimensions)
    }

    /// `?min`/`?max` query over the first selected value
    pub fn component_min_max_ast(&self, dimensions: &[Component]) -> QueryResult<SelectQuery> {
        results::min_max_query(self.range_query().compile(dimensions)?)
    }

    /// All distinct values of the selection, without paging
    pub async fn component_values(&self) -> QueryResult<Vec<ComponentValue>> {
        let dimensions = self.cube.dimensions().await?;
        let ast = self.component_values_ast(&dimensions)?;
        let rows = self.run(&ast).await?;
        Ok(results::component_values(rows))
    }

    /// Smallest and largest literal value of the first selected component
    pub async fn component_min_max(&self) -> QueryResult<MinMax> {
        let dimensions = self.cube.dimensions().await?;
        let ast = self.component_min_max_ast(&dimensions)?;
        let rows = self.run(&ast).await?;
        Ok(results::min_max(rows))
    }
}
