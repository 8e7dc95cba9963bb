//! Variable bindings supplied by the host.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use vel_value::{Attribute, AttributeQualifier, Value};

use crate::AttributeTrail;

/// One step of an [`AttributePattern`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QualifierPattern {
    Exact(AttributeQualifier),
    /// Matches any qualifier.
    Wildcard,
}

impl QualifierPattern {
    fn matches(&self, qualifier: &AttributeQualifier) -> bool {
        match self {
            QualifierPattern::Exact(expected) => expected == qualifier,
            QualifierPattern::Wildcard => true,
        }
    }
}

/// How an attribute relates to a pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchType {
    None,
    /// The attribute is a strict prefix of the pattern.
    Partial,
    /// Every pattern qualifier matched; the attribute may be longer.
    Full,
}

/// A variable name and a chain of qualifier patterns, e.g. `request.*.id`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributePattern {
    variable: Arc<str>,
    qualifiers: SmallVec<[QualifierPattern; 4]>,
}

impl AttributePattern {
    pub fn new(variable: impl Into<Arc<str>>) -> Self {
        AttributePattern {
            variable: variable.into(),
            qualifiers: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn field(self, name: &str) -> Self {
        self.qualifier(QualifierPattern::Exact(AttributeQualifier::String(
            Arc::from(name),
        )))
    }

    #[must_use]
    pub fn qualifier(mut self, qualifier: QualifierPattern) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    #[must_use]
    pub fn wildcard(self) -> Self {
        self.qualifier(QualifierPattern::Wildcard)
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn match_type(&self, attribute: &Attribute) -> MatchType {
        if attribute.variable() != &*self.variable {
            return MatchType::None;
        }
        let qualifiers = attribute.qualifiers();
        let prefix_matches = self
            .qualifiers
            .iter()
            .zip(qualifiers)
            .all(|(pattern, qualifier)| pattern.matches(qualifier));
        if !prefix_matches {
            MatchType::None
        } else if qualifiers.len() >= self.qualifiers.len() {
            MatchType::Full
        } else {
            MatchType::Partial
        }
    }
}

/// The source of variable values for one evaluation.
pub trait Activation {
    /// The value bound to `name`, if any.
    fn find_value(&self, name: &str) -> Option<Value>;

    /// The value bound to `name` together with its root trail.
    fn lookup(&self, name: &str) -> Option<(Value, AttributeTrail)> {
        self.find_value(name)
            .map(|value| (value, AttributeTrail::new(name)))
    }

    /// Attributes whose values must be treated as unknown.
    fn unknown_attribute_patterns(&self) -> &[AttributePattern] {
        &[]
    }

    /// Attributes whose access must fail with a missing-attribute error.
    fn missing_attribute_patterns(&self) -> &[AttributePattern] {
        &[]
    }
}

/// An [`Activation`] backed by a hash map.
#[derive(Clone, Debug, Default)]
pub struct MapActivation {
    values: FxHashMap<String, Value>,
    unknown_patterns: Vec<AttributePattern>,
    missing_patterns: Vec<AttributePattern>,
}

impl MapActivation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Remove a binding; returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.values.remove(name).is_some()
    }

    pub fn set_unknown_attribute_patterns(&mut self, patterns: Vec<AttributePattern>) {
        self.unknown_patterns = patterns;
    }

    pub fn set_missing_attribute_patterns(&mut self, patterns: Vec<AttributePattern>) {
        self.missing_patterns = patterns;
    }
}

impl Activation for MapActivation {
    fn find_value(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn unknown_attribute_patterns(&self) -> &[AttributePattern] {
        &self.unknown_patterns
    }

    fn missing_attribute_patterns(&self) -> &[AttributePattern] {
        &self.missing_patterns
    }
}
