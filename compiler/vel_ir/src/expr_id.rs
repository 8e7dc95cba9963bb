//! Expression identifiers.
//!
//! Every node of a parsed expression carries an id that is unique within that
//! expression. Compiled steps remember the id of the node they were lowered
//! from so trace listeners and source positions can refer back to the tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Id of a node within one parsed expression.
///
/// Ids are signed 64-bit integers on the wire; `0` is reserved for nodes the
/// planner synthesizes and never appears in a parsed tree.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ExprId(i64);

impl ExprId {
    /// Id used for synthesized nodes that have no counterpart in the tree.
    pub const SYNTHETIC: ExprId = ExprId(0);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        ExprId(raw)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whether this id names a node of the parsed tree.
    #[inline]
    pub const fn is_synthetic(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            write!(f, "ExprId::SYNTHETIC")
        } else {
            write!(f, "ExprId({})", self.0)
        }
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ExprId {
    fn default() -> Self {
        Self::SYNTHETIC
    }
}

impl From<i64> for ExprId {
    fn from(raw: i64) -> Self {
        ExprId(raw)
    }
}
