//! Result shaping
//!
//! Endpoint rows are flat variable-to-term maps. Shaping folds each `xLabel` column
//! into the `x` entry so callers get `{ x: { value, label } }` per row.

use super::compiler::conjunction;
use super::{QueryError, QueryResult};
use crate::component::Aggregation;
use crate::fetcher::Row;
use crate::sparql::ast::{Expression, Op, Pattern, Projection, SelectQuery};
use crate::term::Term;
use indexmap::IndexMap;

const LABEL_SUFFIX: &str = "Label";

/// A shaped result cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedValue {
    pub value: Option<Term>,
    pub label: Option<Term>,
}

/// One shaped result row, keyed by binding name in column order
pub type ShapedRow = IndexMap<String, ShapedValue>;

/// A distinct value of a component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentValue {
    pub value: Option<Term>,
    pub label: Option<Term>,
}

/// Smallest and largest value of a component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinMax {
    pub min: Option<Term>,
    pub max: Option<Term>,
}

/// Fold `xLabel` columns into their `x` entries
pub fn shape_rows(rows: Vec<Row>) -> Vec<ShapedRow> {
    rows.into_iter().map(shape_row).collect()
}

fn shape_row(row: Row) -> ShapedRow {
    let mut shaped = ShapedRow::new();
    for (key, term) in row {
        if key.ends_with(LABEL_SUFFIX) {
            let base = key[..key.len() - LABEL_SUFFIX.len()].to_string();
            shaped.entry(base).or_default().label = Some(term);
        } else {
            shaped.entry(key).or_default().value = Some(term);
        }
    }
    shaped
}

/// Read `{ value, label }` pairs from rows with one value and one label column
pub fn component_values(rows: Vec<Row>) -> Vec<ComponentValue> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let label_key = first.keys().find(|k| k.ends_with(LABEL_SUFFIX)).cloned();
    let value_key = first.keys().find(|k| !k.ends_with(LABEL_SUFFIX)).cloned();

    rows.into_iter()
        .map(|mut row| ComponentValue {
            value: value_key.as_ref().and_then(|k| row.shift_remove(k)),
            label: label_key.as_ref().and_then(|k| row.shift_remove(k)),
        })
        .collect()
}

/// Rewrite a compiled query to return `?min`/`?max` of its first value column
///
/// Label BINDs are dropped and the value is restricted to literals.
pub fn min_max_query(mut query: SelectQuery) -> QueryResult<SelectQuery> {
    let binding = query
        .variables
        .iter()
        .filter(|p| p.is_plain())
        .map(|p| p.name().to_string())
        .find(|name| !name.ends_with(LABEL_SUFFIX))
        .ok_or(QueryError::NothingSelected)?;

    let value = || Box::new(Expression::variable(&binding));
    query.variables = vec![
        Projection::Expression {
            expression: Expression::Aggregate {
                aggregation: Aggregation::Min,
                expression: value(),
                distinct: false,
            },
            variable: "min".to_string(),
        },
        Projection::Expression {
            expression: Expression::Aggregate {
                aggregation: Aggregation::Max,
                expression: value(),
                distinct: false,
            },
            variable: "max".to_string(),
        },
    ];

    query.patterns.retain(|p| {
        !matches!(p, Pattern::Bind { variable, .. } if variable.ends_with(LABEL_SUFFIX))
    });

    let literal_only = Expression::operation(Op::IsLiteral, vec![Expression::variable(&binding)]);
    let existing = query.patterns.iter().position(|p| matches!(p, Pattern::Filter(_)));
    match existing {
        Some(index) => {
            if let Pattern::Filter(current) = &query.patterns[index] {
                let combined = conjunction(vec![current.clone(), literal_only]);
                if let Some(combined) = combined {
                    query.patterns[index] = Pattern::Filter(combined);
                }
            }
        }
        None => query.patterns.push(Pattern::Filter(literal_only)),
    }

    query.group.clear();
    query.order.clear();
    query.distinct = false;
    query.limit = None;
    query.offset = 0;
    Ok(query)
}

/// Read `?min`/`?max` from the first row
pub fn min_max(rows: Vec<Row>) -> MinMax {
    match rows.into_iter().next() {
        Some(mut row) => MinMax {
            min: row.shift_remove("min"),
            max: row.shift_remove("max"),
        },
        None => MinMax::default(),
    }
}
