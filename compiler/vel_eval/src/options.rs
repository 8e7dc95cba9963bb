//! Evaluation and planning options.
//!
//! Both option sets deserialize with defaults, so a host can embed them in
//! its own configuration file and only spell out what it changes:
//!
//! ```
//! # use vel_eval::{EvaluationOptions, UnknownProcessing};
//! let options = EvaluationOptions::builder()
//!     .unknown_processing(UnknownProcessing::AttributeOnly)
//!     .comprehension_max_iterations(10_000)
//!     .build();
//! assert!(options.short_circuiting);
//! ```

use serde::Deserialize;

/// How partially known inputs are handled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownProcessing {
    /// Unknown patterns are ignored; every attribute is looked up.
    #[default]
    Disabled,
    /// Attributes matching an unknown pattern evaluate to unknown values.
    AttributeOnly,
    /// As `AttributeOnly`, and calls that report an unknown result are
    /// recorded as function-result unknowns.
    AttributeAndFunction,
}

impl UnknownProcessing {
    #[inline]
    pub fn tracks_attributes(self) -> bool {
        !matches!(self, UnknownProcessing::Disabled)
    }

    #[inline]
    pub fn tracks_function_results(self) -> bool {
        matches!(self, UnknownProcessing::AttributeAndFunction)
    }
}

/// Runtime behavior of a planned expression.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Compile `&&`, `||`, `?:` and comprehension conditions to jumps.
    pub short_circuiting: bool,
    pub unknown_processing: UnknownProcessing,
    /// Attributes matching a missing-attribute pattern evaluate to errors.
    pub enable_missing_attribute_errors: bool,
    /// Total comprehension iterations allowed per evaluation; `0` is unlimited.
    pub comprehension_max_iterations: usize,
    /// Evaluate calls on constant arguments while planning.
    pub constant_folding: bool,
    /// Build lists and maps through host container builders when the
    /// evaluation state pools its allocations.
    pub use_legacy_container_builders: bool,
    /// `==` across kinds yields `false` instead of a no-overload error.
    pub enable_heterogeneous_equality: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        EvaluationOptions {
            short_circuiting: true,
            unknown_processing: UnknownProcessing::Disabled,
            enable_missing_attribute_errors: false,
            comprehension_max_iterations: 0,
            constant_folding: false,
            use_legacy_container_builders: false,
            enable_heterogeneous_equality: true,
        }
    }
}

impl EvaluationOptions {
    pub fn builder() -> EvaluationOptionsBuilder {
        EvaluationOptionsBuilder::default()
    }
}

/// Fluent construction of [`EvaluationOptions`].
#[derive(Clone, Debug, Default)]
pub struct EvaluationOptionsBuilder {
    options: EvaluationOptions,
}

impl EvaluationOptionsBuilder {
    #[must_use]
    pub fn short_circuiting(mut self, enabled: bool) -> Self {
        self.options.short_circuiting = enabled;
        self
    }

    #[must_use]
    pub fn unknown_processing(mut self, mode: UnknownProcessing) -> Self {
        self.options.unknown_processing = mode;
        self
    }

    #[must_use]
    pub fn enable_missing_attribute_errors(mut self, enabled: bool) -> Self {
        self.options.enable_missing_attribute_errors = enabled;
        self
    }

    #[must_use]
    pub fn comprehension_max_iterations(mut self, limit: usize) -> Self {
        self.options.comprehension_max_iterations = limit;
        self
    }

    #[must_use]
    pub fn constant_folding(mut self, enabled: bool) -> Self {
        self.options.constant_folding = enabled;
        self
    }

    #[must_use]
    pub fn use_legacy_container_builders(mut self, enabled: bool) -> Self {
        self.options.use_legacy_container_builders = enabled;
        self
    }

    #[must_use]
    pub fn enable_heterogeneous_equality(mut self, enabled: bool) -> Self {
        self.options.enable_heterogeneous_equality = enabled;
        self
    }

    pub fn build(self) -> EvaluationOptions {
        self.options
    }
}

/// Limits applied while lowering a tree into steps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    /// Maximum nesting depth of the input tree, or `None` for unlimited.
    ///
    /// Without a limit the planner relies on growing its native stack.
    pub max_recursion_depth: Option<usize>,
}

impl PlannerOptions {
    #[must_use]
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = Some(depth);
        self
    }
}
