//! Provenance of values on the evaluation stack.

use vel_value::{Attribute, AttributeQualifier};

/// The attribute path a stack value was read from, if any.
///
/// Trails run parallel to values: an identifier starts one, selects and
/// index operations extend it, and every other step produces an empty trail.
/// Trails are only maintained while unknown processing is enabled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeTrail {
    attribute: Option<Attribute>,
}

impl AttributeTrail {
    /// A trail rooted at variable `name`.
    pub fn new(name: &str) -> Self {
        AttributeTrail {
            attribute: Some(Attribute::new(name)),
        }
    }

    pub fn empty() -> Self {
        AttributeTrail::default()
    }

    /// Extend by one qualifier. Extending an empty trail yields an empty trail.
    #[must_use]
    pub fn step(&self, qualifier: AttributeQualifier) -> Self {
        AttributeTrail {
            attribute: self.attribute.as_ref().map(|a| a.step(qualifier)),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attribute.is_none()
    }

    pub fn attribute(&self) -> Option<&Attribute> {
        self.attribute.as_ref()
    }
}
