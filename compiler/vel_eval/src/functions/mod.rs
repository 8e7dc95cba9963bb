//! Function overloads and their registry.
//!
//! Every call in a planned expression, operators included, resolves to a
//! set of overloads registered under the callee's name. The set is fixed at
//! planning time; the overload itself is picked per evaluation from the
//! kinds of the actual arguments.

mod builtins;
mod conversions;
mod operators;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use vel_value::{Kind, Result, Status, StatusCode, Value, ValueFactory};

use crate::EvaluationOptions;

/// Implementation of one overload.
///
/// An `Err` aborts evaluation. Language-level failures (overflow, bad
/// conversions) are returned as `Ok(Value::Error(..))` instead.
pub type FunctionImpl = dyn Fn(&ValueFactory, &[Value]) -> Result<Value> + Send + Sync;

/// The signature of one overload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionDescriptor {
    name: Arc<str>,
    receiver_style: bool,
    arg_kinds: SmallVec<[Kind; 3]>,
    strict: bool,
}

impl FunctionDescriptor {
    /// A strict global function of `arg_kinds`. [`Kind::Dyn`] accepts any
    /// argument.
    pub fn new(name: impl Into<Arc<str>>, arg_kinds: &[Kind]) -> Self {
        FunctionDescriptor {
            name: name.into(),
            receiver_style: false,
            arg_kinds: SmallVec::from_slice(arg_kinds),
            strict: true,
        }
    }

    /// A strict receiver-style function; the receiver is the first kind.
    pub fn receiver(name: impl Into<Arc<str>>, arg_kinds: &[Kind]) -> Self {
        FunctionDescriptor {
            receiver_style: true,
            ..Self::new(name, arg_kinds)
        }
    }

    /// Let error and unknown arguments reach the implementation.
    #[must_use]
    pub fn non_strict(mut self) -> Self {
        self.strict = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn receiver_style(&self) -> bool {
        self.receiver_style
    }

    pub fn arg_kinds(&self) -> &[Kind] {
        &self.arg_kinds
    }

    pub fn arity(&self) -> usize {
        self.arg_kinds.len()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether `args` fit the declared kinds. Enums fit `int` slots.
    pub fn matches(&self, args: &[Value]) -> bool {
        args.len() == self.arg_kinds.len()
            && self.arg_kinds.iter().zip(args).all(|(&expected, arg)| {
                let actual = arg.kind();
                expected == Kind::Dyn
                    || expected == actual
                    || (expected == Kind::Int && actual == Kind::Enum)
            })
    }

    /// Whether some argument list could match both descriptors.
    fn overlaps(&self, other: &FunctionDescriptor) -> bool {
        self.receiver_style == other.receiver_style
            && self.arity() == other.arity()
            && self
                .arg_kinds
                .iter()
                .zip(&other.arg_kinds)
                .all(|(&a, &b)| a == b || a == Kind::Dyn || b == Kind::Dyn)
    }
}

impl fmt::Display for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds = self.arg_kinds.iter();
        if self.receiver_style {
            if let Some(receiver) = kinds.next() {
                write!(f, "{receiver}.")?;
            }
        }
        write!(f, "{}(", self.name)?;
        for (i, kind) in kinds.enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}")?;
        }
        f.write_str(")")
    }
}

/// A descriptor and its implementation.
pub struct FunctionOverload {
    descriptor: FunctionDescriptor,
    implementation: Arc<FunctionImpl>,
}

impl FunctionOverload {
    pub fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    pub fn invoke(&self, factory: &ValueFactory, args: &[Value]) -> Result<Value> {
        (self.implementation)(factory, args)
    }

    /// Whether this overload may be called with `args`.
    ///
    /// Strict overloads never see error or unknown arguments.
    pub fn accepts(&self, args: &[Value]) -> bool {
        self.descriptor.matches(args)
            && (!self.descriptor.strict || !args.iter().any(|a| a.is_error() || a.is_unknown()))
    }
}

impl fmt::Debug for FunctionOverload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionOverload")
            .field("descriptor", &self.descriptor.to_string())
            .field("strict", &self.descriptor.strict)
            .finish_non_exhaustive()
    }
}

/// The first overload callable with `args`.
pub fn resolve<'o>(overloads: &'o [Arc<FunctionOverload>], args: &[Value]) -> Option<&'o FunctionOverload> {
    overloads
        .iter()
        .map(AsRef::as_ref)
        .find(|overload| overload.accepts(args))
}

/// Overloads by function name.
///
/// Mutated only while setting up; planning and evaluation read it through a
/// shared reference.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<Arc<str>, Vec<Arc<FunctionOverload>>>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the builtin operators and functions.
    pub fn with_builtins(options: &EvaluationOptions) -> Result<Self> {
        let mut registry = Self::new();
        builtins::register_builtins(&mut registry, options)?;
        Ok(registry)
    }

    /// Add an overload.
    ///
    /// Fails with `AlreadyExists` when an overload of the same name could
    /// match the same arguments.
    pub fn register<F>(&mut self, descriptor: FunctionDescriptor, implementation: F) -> Result<()>
    where
        F: Fn(&ValueFactory, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let overloads = self
            .functions
            .entry(Arc::clone(&descriptor.name))
            .or_default();
        if let Some(existing) = overloads
            .iter()
            .find(|o| o.descriptor.overlaps(&descriptor))
        {
            return Err(Status::new(
                StatusCode::AlreadyExists,
                format!(
                    "overload {descriptor} conflicts with existing overload {}",
                    existing.descriptor
                ),
            ));
        }
        tracing::trace!(overload = %descriptor, "registered function overload");
        overloads.push(Arc::new(FunctionOverload {
            descriptor,
            implementation: Arc::new(implementation),
        }));
        Ok(())
    }

    /// Overloads of `name` with the given call shape.
    pub fn find_overloads(
        &self,
        name: &str,
        receiver_style: bool,
        arity: usize,
    ) -> Vec<Arc<FunctionOverload>> {
        self.functions
            .get(name)
            .map(|overloads| {
                overloads
                    .iter()
                    .filter(|o| {
                        o.descriptor.receiver_style == receiver_style
                            && o.descriptor.arity() == arity
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of registered overloads.
    pub fn len(&self) -> usize {
        self.functions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.len())
            .field("overloads", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
