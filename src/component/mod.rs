//! Cube Components
//!
//! A data cube exposes three kinds of components:
//!
//! - **Dimension**: identifies an observation (time, place, ...)
//! - **Measure**: the observed value, optionally aggregated
//! - **Attribute**: optional metadata attached to an observation
//!
//! Components are immutable values. Modifiers such as [`Component::avg`] or
//! [`Component::desc`] return a new component and leave the receiver untouched.
//!
//! # Hierarchies
//!
//! [`Component::broader`] derives a component one level up a SKOS hierarchy
//! (`skos:broader`). Chaining calls walks further up; each step keeps a link back to
//! the component it was derived from.
//!
//! ```rust,ignore
//! let raum = Component::dimension("https://ld.stadt-zuerich.ch/statistics/property/RAUM");
//! let quartier = raum.broader();
//! let kreis = quartier.broader_pinned("https://ld.stadt-zuerich.ch/statistics/code/R30000");
//! ```

use std::fmt;
use std::sync::Arc;

/// The role a component plays in a cube
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Dimension,
    Measure,
    Attribute,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Dimension => "dimension",
            ComponentKind::Measure => "measure",
            ComponentKind::Attribute => "attribute",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dimension" => Some(ComponentKind::Dimension),
            "measure" => Some(ComponentKind::Measure),
            "attribute" => Some(ComponentKind::Attribute),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregation applied to a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Avg,
    Sum,
    Min,
    Max,
    Count,
}

impl Aggregation {
    /// Lowercase name, used as a naming suffix for the pre-aggregation variable
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Avg => "avg",
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "avg" => Some(Aggregation::Avg),
            "sum" => Some(Aggregation::Sum),
            "min" => Some(Aggregation::Min),
            "max" => Some(Aggregation::Max),
            "count" => Some(Aggregation::Count),
            _ => None,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// A human-readable label; an empty language means "no language tag"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub value: String,
    pub language: String,
}

impl Label {
    pub fn new(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: language.into(),
        }
    }
}

/// A dimension, measure or attribute of a cube
///
/// Identity is structural: two components with the same IRI, labels, flags and
/// hierarchy link are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Component {
    kind: ComponentKind,
    /// `None` for an unpinned hierarchy step
    iri: Option<String>,
    labels: Vec<Label>,
    aggregation: Option<Aggregation>,
    distinct: bool,
    descending: bool,
    narrower: Option<Arc<Component>>,
}

impl Component {
    pub fn new(kind: ComponentKind, iri: impl Into<String>) -> Self {
        Self {
            kind,
            iri: Some(iri.into()),
            labels: Vec::new(),
            aggregation: None,
            distinct: false,
            descending: false,
            narrower: None,
        }
    }

    pub fn dimension(iri: impl Into<String>) -> Self {
        Self::new(ComponentKind::Dimension, iri)
    }

    pub fn measure(iri: impl Into<String>) -> Self {
        Self::new(ComponentKind::Measure, iri)
    }

    pub fn attribute(iri: impl Into<String>) -> Self {
        Self::new(ComponentKind::Attribute, iri)
    }

    /// Add a label in the given language (`""` for no language)
    pub fn with_label(mut self, value: impl Into<String>, language: impl Into<String>) -> Self {
        self.labels.push(Label::new(value, language));
        self
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = Label>) -> Self {
        self.labels.extend(labels);
        self
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn iri(&self) -> Option<&str> {
        self.iri.as_deref()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn aggregation(&self) -> Option<Aggregation> {
        self.aggregation
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// The component this one was derived from with [`Component::broader`]
    pub fn narrower(&self) -> Option<&Component> {
        self.narrower.as_deref()
    }

    pub fn is_dimension(&self) -> bool {
        self.kind == ComponentKind::Dimension
    }

    pub fn is_measure(&self) -> bool {
        self.kind == ComponentKind::Measure
    }

    pub fn is_attribute(&self) -> bool {
        self.kind == ComponentKind::Attribute
    }

    /// Pick the label to show for the given language preferences
    ///
    /// Tries each language in order, then the language-less label.
    pub fn label(&self, languages: &[String]) -> Option<&Label> {
        languages
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(""))
            .find_map(|lang| self.labels.iter().find(|l| l.language == lang))
    }

    /// Aggregate with the given function, replacing any earlier one
    pub fn aggregate(&self, aggregation: Aggregation) -> Self {
        let mut next = self.clone();
        next.aggregation = Some(aggregation);
        next
    }

    pub fn avg(&self) -> Self {
        self.aggregate(Aggregation::Avg)
    }

    pub fn sum(&self) -> Self {
        self.aggregate(Aggregation::Sum)
    }

    pub fn min(&self) -> Self {
        self.aggregate(Aggregation::Min)
    }

    pub fn max(&self) -> Self {
        self.aggregate(Aggregation::Max)
    }

    pub fn count(&self) -> Self {
        self.aggregate(Aggregation::Count)
    }

    /// Aggregate over distinct values only
    pub fn distinct(&self) -> Self {
        let mut next = self.clone();
        next.distinct = true;
        next
    }

    /// Order descending when used in `order_by`
    pub fn desc(&self) -> Self {
        let mut next = self.clone();
        next.descending = true;
        next
    }

    /// One step up the `skos:broader` hierarchy, left unpinned
    pub fn broader(&self) -> Self {
        Self {
            kind: self.kind,
            iri: None,
            labels: Vec::new(),
            aggregation: None,
            distinct: false,
            descending: false,
            narrower: Some(Arc::new(self.clone())),
        }
    }

    /// One step up the hierarchy, fixed to a known concept
    pub fn broader_pinned(&self, iri: impl Into<String>) -> Self {
        let mut next = self.broader();
        next.iri = Some(iri.into());
        next
    }

    /// Walk from this component down to the root of its hierarchy
    pub fn hierarchy(&self) -> impl Iterator<Item = &Component> {
        std::iter::successors(Some(self), |c| c.narrower())
    }

    /// The dimension at the bottom of the hierarchy this component belongs to
    pub fn root(&self) -> &Component {
        let mut current = self;
        while let Some(next) = current.narrower() {
            current = next;
        }
        current
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.iri {
            Some(iri) => write!(f, "{} <{}>", self.kind, iri),
            None => write!(f, "{} broader of {}", self.kind, self.root()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAUM: &str = "https://ld.stadt-zuerich.ch/statistics/property/RAUM";

    #[test]
    fn test_modifiers_do_not_mutate() {
        let bep = Component::measure("http://example.com/bep");
        let avg = bep.avg();
        assert_eq!(bep.aggregation(), None);
        assert_eq!(avg.aggregation(), Some(Aggregation::Avg));

        let distinct = avg.distinct();
        assert!(!avg.is_distinct());
        assert!(distinct.is_distinct());

        let desc = bep.desc();
        assert!(!bep.is_descending());
        assert!(desc.is_descending());
    }

    #[test]
    fn test_structural_identity() {
        let a = Component::dimension(RAUM).with_label("Raum", "de");
        let b = Component::dimension(RAUM).with_label("Raum", "de");
        assert_eq!(a, b);
        assert_ne!(a, a.desc());
    }

    #[test]
    fn test_label_preference() {
        let c = Component::dimension(RAUM)
            .with_label("Space", "en")
            .with_label("Raum", "de")
            .with_label("Raum (neutral)", "");

        let langs = vec!["de".to_string(), "en".to_string()];
        assert_eq!(c.label(&langs).map(|l| l.value.as_str()), Some("Raum"));

        let langs = vec!["fr".to_string()];
        assert_eq!(c.label(&langs).map(|l| l.value.as_str()), Some("Raum (neutral)"));

        let unlabeled = Component::dimension(RAUM).with_label("Space", "en");
        assert!(unlabeled.label(&["fr".to_string()]).is_none());
    }

    #[test]
    fn test_broader_chain() {
        let raum = Component::dimension(RAUM).with_label("Raum", "de");
        let quartier = raum.broader();
        let kreis = quartier.broader_pinned("https://ld.stadt-zuerich.ch/statistics/code/R30000");

        assert_eq!(quartier.iri(), None);
        assert!(quartier.labels().is_empty());
        assert_eq!(quartier.narrower(), Some(&raum));
        assert_eq!(
            kreis.iri(),
            Some("https://ld.stadt-zuerich.ch/statistics/code/R30000")
        );
        assert_eq!(kreis.hierarchy().count(), 3);
        assert_eq!(kreis.root(), &raum);
        assert_eq!(raum.hierarchy().count(), 1);
    }

    #[test]
    fn test_kind_round_trip_names() {
        assert_eq!(ComponentKind::from_str("Measure"), Some(ComponentKind::Measure));
        assert_eq!(ComponentKind::Attribute.to_string(), "attribute");
        assert_eq!(Aggregation::from_str("AVG"), Some(Aggregation::Avg));
        assert_eq!(Aggregation::Sum.to_string(), "SUM");
        assert_eq!(Aggregation::Sum.as_str(), "sum");
    }
}
