//! Unknown values for partial evaluation.
//!
//! An unknown records *why* a result could not be computed: the attributes
//! (variable plus qualifier path) that were marked unknown by the host, and
//! the function calls whose results were unknown.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

/// One step of an attribute path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeQualifier {
    Bool(bool),
    Int(i64),
    Uint(u64),
    /// A field name or a string map key.
    String(Arc<str>),
}

impl fmt::Display for AttributeQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeQualifier::Bool(b) => write!(f, "[{b}]"),
            AttributeQualifier::Int(i) => write!(f, "[{i}]"),
            AttributeQualifier::Uint(u) => write!(f, "[{u}u]"),
            AttributeQualifier::String(s) => write!(f, ".{s}"),
        }
    }
}

/// A variable followed by a chain of qualifiers, e.g. `request.auth.claims`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Attribute {
    variable: Arc<str>,
    qualifiers: SmallVec<[AttributeQualifier; 4]>,
}

impl Attribute {
    pub fn new(variable: impl Into<Arc<str>>) -> Self {
        Attribute {
            variable: variable.into(),
            qualifiers: SmallVec::new(),
        }
    }

    /// A copy of this attribute extended by one qualifier.
    #[must_use]
    pub fn step(&self, qualifier: AttributeQualifier) -> Self {
        let mut qualifiers = self.qualifiers.clone();
        qualifiers.push(qualifier);
        Attribute {
            variable: Arc::clone(&self.variable),
            qualifiers,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn qualifiers(&self) -> &[AttributeQualifier] {
        &self.qualifiers
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variable)?;
        for qualifier in &self.qualifiers {
            write!(f, "{qualifier}")?;
        }
        Ok(())
    }
}

/// A call whose result was unknown.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionResult {
    pub function: Arc<str>,
    pub expr_id: i64,
}

/// Union of unknown attributes and unknown function results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UnknownSet {
    attributes: BTreeSet<Attribute>,
    function_results: BTreeSet<FunctionResult>,
}

impl UnknownSet {
    pub fn from_attribute(attribute: Attribute) -> Self {
        let mut set = UnknownSet::default();
        set.attributes.insert(attribute);
        set
    }

    pub fn from_function_result(result: FunctionResult) -> Self {
        let mut set = UnknownSet::default();
        set.function_results.insert(result);
        set
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &UnknownSet) {
        self.attributes.extend(other.attributes.iter().cloned());
        self.function_results
            .extend(other.function_results.iter().cloned());
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn function_results(&self) -> impl Iterator<Item = &FunctionResult> {
        self.function_results.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.function_results.is_empty()
    }
}

impl fmt::Display for UnknownSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*unknown*{{")?;
        let mut first = true;
        for attribute in &self.attributes {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{attribute}")?;
        }
        for result in &self.function_results {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}@{}", result.function, result.expr_id)?;
        }
        write!(f, "}}")
    }
}
