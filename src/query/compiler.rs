//! Query compilation
//!
//! Turns a [`QueryState`] into a SPARQL [`SelectQuery`]. Compilation runs in fixed
//! stages over a shared [`Compilation`] context:
//!
//! 1. selected dimensions: observation triple, label lookup, projection
//! 2. hierarchies: `skos:broader` chains for components derived with `broader()`
//! 3. implicit dimensions: every other cube dimension gets a variable
//! 4. measures, plain or aggregated
//! 5. attributes, as OPTIONAL
//! 6. filters
//! 7. grouping, explicit and aggregate-driven
//! 8. HAVING
//! 9. ordering
//!
//! Implicit dimensions keep one row per observation. They are only projected when the
//! query neither aggregates nor asks for distinct rows.

use super::naming::auto_name;
use super::state::{GroupBy, QueryState};
use super::{QueryError, QueryResult};
use crate::component::Component;
use crate::expr::{BindingTable, Expr};
use crate::sparql::ast::{
    Expression, Op, Ordering, Pattern, Predicate, Projection, SelectQuery, Triple,
};
use crate::term::{vocab, Term};
use std::collections::{HashMap, HashSet};

/// Variable every observation is bound to
pub const OBSERVATION: &str = "observation";

/// Cube facts the compiler needs besides the query state
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'a> {
    pub cube_iri: &'a str,
    pub graph_iri: Option<&'a str>,
    /// All dimensions of the cube
    pub dimensions: &'a [Component],
    /// Preferred label languages, most preferred first
    pub languages: &'a [String],
}

/// Compile a query state into a SELECT query
pub fn compile(state: &QueryState, ctx: &CompileContext<'_>) -> QueryResult<SelectQuery> {
    tracing::debug!(
        cube = %ctx.cube_iri,
        selections = state.selections.len(),
        filters = state.filters.len(),
        "Compiling cube query"
    );

    let mut compilation = Compilation::new(state, ctx);
    compilation.selected_dimensions();
    compilation.hierarchies()?;
    compilation.implicit_dimensions();
    compilation.measures();
    compilation.attributes();
    compilation.filters()?;
    compilation.grouping()?;
    compilation.having()?;
    compilation.ordering()?;

    Ok(compilation.finish())
}

/// Join expressions with `&&`, left-nested; a single expression is used as-is
pub fn conjunction(expressions: Vec<Expression>) -> Option<Expression> {
    expressions
        .into_iter()
        .reduce(|acc, next| Expression::operation(Op::And, vec![acc, next]))
}

/// Shared state of one compilation run
struct Compilation<'a> {
    state: &'a QueryState,
    ctx: &'a CompileContext<'a>,
    table: BindingTable,
    /// Main basic graph pattern
    triples: Vec<Triple>,
    /// OPTIONAL/BIND/FILTER blocks following the main pattern
    patterns: Vec<Pattern>,
    variables: Vec<Projection>,
    /// Dimension IRIs that already have an observation triple
    bound_dimensions: HashSet<String>,
    /// Hierarchy steps whose `skos:broader` triple was emitted, with the first name used
    expanded: HashMap<Component, String>,
    /// Caller-named steps already labelled and projected
    emitted_steps: HashSet<String>,
    group: Vec<String>,
    having: Option<Expression>,
    order: Vec<Ordering>,
    has_aggregate: bool,
}

impl<'a> Compilation<'a> {
    fn new(state: &'a QueryState, ctx: &'a CompileContext<'a>) -> Self {
        let mut table = BindingTable::new();
        for (name, component) in &state.selections {
            if component.narrower().is_some() {
                table.bind_step(name.clone(), component);
            } else {
                table.bind(name.clone(), component);
            }
        }

        let observation = Term::variable(OBSERVATION);
        let triples = vec![
            Triple::new(
                observation.clone(),
                Term::iri(vocab::rdf("type")),
                Term::iri(vocab::qb("Observation")),
            ),
            Triple::new(
                observation,
                Term::iri(vocab::qb("dataSet")),
                Term::iri(ctx.cube_iri),
            ),
        ];

        Self {
            state,
            ctx,
            table,
            triples,
            patterns: Vec::new(),
            variables: Vec::new(),
            bound_dimensions: HashSet::new(),
            expanded: HashMap::new(),
            emitted_steps: HashSet::new(),
            group: Vec::new(),
            having: None,
            order: Vec::new(),
            has_aggregate: state.has_aggregate(),
        }
    }

    fn observation_triple(&mut self, iri: &str, variable: &str) {
        self.triples.push(Triple::new(
            Term::variable(OBSERVATION),
            Term::iri(iri),
            Term::variable(variable),
        ));
    }

    fn project(&mut self, name: &str) {
        self.variables.push(Projection::Variable(name.to_string()));
    }

    fn project_with_label(&mut self, name: &str) {
        self.project(name);
        self.project(&format!("{}Label", name));
    }

    /// OPTIONAL label lookups per language, coalesced into `?<binding>Label`
    ///
    /// The label and per-language variables are reserved so auto-naming skips them.
    fn labels(&mut self, binding: &str) {
        let label = format!("{}Label", binding);
        self.table.reserve(label.clone());

        let mut languages: Vec<&str> = Vec::new();
        for lang in self.ctx.languages {
            if !lang.is_empty() && !languages.contains(&lang.as_str()) {
                languages.push(lang);
            }
        }
        languages.push("");

        let mut candidates = Vec::with_capacity(languages.len() + 1);
        for lang in languages {
            let suffix = if lang.is_empty() {
                "nolang".to_string()
            } else {
                lang.replace('-', "_")
            };
            let variable = format!("{}_{}", label, suffix);
            self.table.reserve(variable.clone());

            let lookup = Triple {
                subject: Term::variable(binding),
                predicate: Predicate::Alternative(vec![
                    Term::iri(vocab::rdfs("label")),
                    Term::iri(vocab::skos("prefLabel")),
                ]),
                object: Term::variable(&variable),
            };

            let language = Expression::operation(Op::Lang, vec![Expression::variable(&variable)]);
            let condition = if lang.is_empty() {
                Expression::operation(
                    Op::Equals,
                    vec![language, Expression::Term(Term::literal(""))],
                )
            } else {
                Expression::operation(
                    Op::LangMatches,
                    vec![language, Expression::Term(Term::literal(lang))],
                )
            };

            self.patterns.push(Pattern::Optional(vec![
                Pattern::Bgp(vec![lookup]),
                Pattern::Filter(condition),
            ]));
            candidates.push(Expression::variable(variable));
        }

        candidates.push(Expression::Term(Term::literal("")));
        self.patterns.push(Pattern::Bind {
            variable: label,
            expression: Expression::operation(Op::Coalesce, candidates),
        });
    }

    fn selected_dimensions(&mut self) {
        let state = self.state;
        for (name, component) in &state.selections {
            if !component.is_dimension() || component.narrower().is_some() {
                continue;
            }
            let Some(iri) = component.iri() else {
                continue;
            };
            self.observation_triple(iri, name);
            self.bound_dimensions.insert(iri.to_string());
            self.labels(name);
            self.project_with_label(name);
        }
    }

    /// Bind a dimension the caller did not select, returning its variable
    fn implicit_dimension(&mut self, dimension: &Component) -> Option<String> {
        let iri = dimension.iri()?;
        let name = auto_name(dimension, None, self.ctx.languages, &self.table);
        self.table.bind(name.clone(), dimension);
        self.observation_triple(iri, &name);
        self.bound_dimensions.insert(iri.to_string());
        if !self.has_aggregate && !self.state.distinct {
            self.project(&name);
        }
        Some(name)
    }

    fn hierarchies(&mut self) -> QueryResult<()> {
        let state = self.state;
        for (name, component) in &state.selections {
            if component.narrower().is_some() {
                self.expand_hierarchy(name, component)?;
            }
        }
        Ok(())
    }

    /// Emit the `skos:broader` chain from the root dimension up to `component`
    ///
    /// Intermediate steps reuse an earlier name for the same step. The last step is
    /// always bound to `selected`, so equal steps selected under two names each get
    /// their own variable.
    fn expand_hierarchy(&mut self, selected: &str, component: &Component) -> QueryResult<()> {
        let mut chain: Vec<&Component> = component.hierarchy().collect();
        let root = chain
            .pop()
            .ok_or_else(|| QueryError::UnresolvedComponent(component.to_string()))?;

        let mut previous_name = match self.table.lookup(root) {
            Some(name) => name.to_string(),
            None => self
                .implicit_dimension(root)
                .ok_or_else(|| QueryError::UnresolvedComponent(root.to_string()))?,
        };
        let mut previous = Term::variable(&previous_name);

        // chain[0] is the selected component itself
        while chain.len() > 1 {
            let Some(step) = chain.pop() else {
                break;
            };

            if let Some(name) = self.expanded.get(step) {
                previous_name = name.clone();
                previous = step_term(step, &previous_name);
                continue;
            }

            let named_by_caller = self.table.contains(step);
            let existing = if named_by_caller {
                self.table.lookup(step).map(str::to_string)
            } else {
                None
            };
            let name = match existing {
                Some(name) => name,
                None => {
                    let name =
                        auto_name(step, Some(&previous_name), self.ctx.languages, &self.table);
                    self.table.bind_step(name.clone(), step);
                    name
                }
            };

            previous = self.broader_step(previous, step, &name, named_by_caller);
            previous_name = name;
        }

        if !self.emitted_steps.contains(selected) {
            self.broader_step(previous, component, selected, true);
        }
        Ok(())
    }

    /// Push `previous skos:broader step` once, labelling caller-named steps
    fn broader_step(
        &mut self,
        previous: Term,
        step: &Component,
        name: &str,
        named_by_caller: bool,
    ) -> Term {
        let object = step_term(step, name);
        let triple = Triple::new(previous, Term::iri(vocab::skos("broader")), object.clone());
        if !self.triples.contains(&triple) {
            self.triples.push(triple);
        }
        self.expanded
            .entry(step.clone())
            .or_insert_with(|| name.to_string());

        if named_by_caller && self.emitted_steps.insert(name.to_string()) {
            self.labels(name);
            self.project_with_label(name);
        }
        object
    }

    fn implicit_dimensions(&mut self) {
        let ctx = self.ctx;
        for dimension in ctx.dimensions {
            let unbound = dimension
                .iri()
                .map(|iri| !self.bound_dimensions.contains(iri))
                .unwrap_or(false);
            if unbound {
                self.implicit_dimension(dimension);
            }
        }
    }

    fn measures(&mut self) {
        let state = self.state;
        for (name, component) in &state.selections {
            if !component.is_measure() || component.narrower().is_some() {
                continue;
            }
            let Some(iri) = component.iri() else {
                continue;
            };

            match component.aggregation() {
                Some(aggregation) => {
                    let source = auto_name(
                        component,
                        Some(aggregation.as_str()),
                        self.ctx.languages,
                        &self.table,
                    );
                    self.table.reserve(source.clone());
                    self.observation_triple(iri, &source);
                    self.variables.push(Projection::Expression {
                        expression: Expression::Aggregate {
                            aggregation,
                            expression: Box::new(Expression::variable(source)),
                            distinct: component.is_distinct(),
                        },
                        variable: name.clone(),
                    });
                }
                None => {
                    self.observation_triple(iri, name);
                    self.project(name);
                }
            }
        }
    }

    fn attributes(&mut self) {
        let state = self.state;
        for (name, component) in &state.selections {
            if !component.is_attribute() || component.narrower().is_some() {
                continue;
            }
            let Some(iri) = component.iri() else {
                continue;
            };
            self.patterns.push(Pattern::Optional(vec![Pattern::Bgp(vec![Triple::new(
                Term::variable(OBSERVATION),
                Term::iri(iri),
                Term::variable(name),
            )])]));
            self.project(name);
        }
    }

    fn lower_all(&self, exprs: &[Expr]) -> QueryResult<Option<Expression>> {
        let lowered = exprs
            .iter()
            .map(|e| self.table.to_expression(e))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(conjunction(lowered))
    }

    fn filters(&mut self) -> QueryResult<()> {
        if let Some(filter) = self.lower_all(&self.state.filters)? {
            self.patterns.push(Pattern::Filter(filter));
        }
        Ok(())
    }

    fn plain_variables(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|p| p.is_plain())
            .map(|p| p.name().to_string())
            .collect()
    }

    fn add_group_key(&mut self, name: String) {
        if !self.group.contains(&name) {
            self.group.push(name);
        }
    }

    fn grouping(&mut self) -> QueryResult<()> {
        if self.has_aggregate {
            for name in self.plain_variables() {
                self.add_group_key(name);
            }
        }

        let state = self.state;
        if state.group_by.is_empty() {
            return Ok(());
        }

        for key in &state.group_by {
            let name = match key {
                GroupBy::Name(name) => {
                    let component = self
                        .table
                        .component(name)
                        .ok_or_else(|| QueryError::UnknownGroupBy(name.clone()))?;
                    self.table
                        .lookup(component)
                        .unwrap_or(name.as_str())
                        .to_string()
                }
                GroupBy::Resolver(resolve) => {
                    let component = resolve(&state.selections)
                        .ok_or_else(|| QueryError::UnknownGroupBy("<resolver>".to_string()))?;
                    self.table
                        .lookup(&component)
                        .ok_or_else(|| QueryError::UnknownGroupBy(component.to_string()))?
                        .to_string()
                }
            };
            self.add_group_key(name);
        }

        for name in self.plain_variables() {
            self.add_group_key(name);
        }
        Ok(())
    }

    fn having(&mut self) -> QueryResult<()> {
        self.having = self.lower_all(&self.state.having)?;
        Ok(())
    }

    fn ordering(&mut self) -> QueryResult<()> {
        let state = self.state;
        for component in &state.order {
            let variable = self
                .table
                .lookup(component)
                .ok_or_else(|| QueryError::UnresolvedComponent(component.to_string()))?
                .to_string();
            self.order.push(Ordering {
                variable,
                descending: component.is_descending(),
            });
        }
        Ok(())
    }

    fn finish(self) -> SelectQuery {
        let mut patterns = Vec::with_capacity(self.patterns.len() + 1);
        patterns.push(Pattern::Bgp(self.triples));
        patterns.extend(self.patterns);

        tracing::debug!(
            variables = self.variables.len(),
            patterns = patterns.len(),
            grouped = !self.group.is_empty(),
            "Compiled cube query"
        );

        SelectQuery {
            prefixes: vocab::PREFIXES
                .iter()
                .map(|(prefix, ns)| (prefix.to_string(), ns.to_string()))
                .collect(),
            variables: self.variables,
            distinct: self.state.distinct,
            from: self.ctx.graph_iri.map(str::to_string).into_iter().collect(),
            patterns,
            group: self.group,
            having: self.having,
            order: self.order,
            offset: self.state.offset,
            limit: self.state.limit,
        }
    }
}

/// Pinned hierarchy steps are written as their concept IRI, others as a variable
fn step_term(step: &Component, name: &str) -> Term {
    match step.iri() {
        Some(iri) => Term::iri(iri),
        None => Term::variable(name),
    }
}
