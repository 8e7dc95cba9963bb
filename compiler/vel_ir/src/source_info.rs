//! Source metadata attached to a parsed expression.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{Expr, ExprId};

/// Positions and origin of a parsed expression.
///
/// `positions` maps a node id to the character offset of the node in the
/// source text; `line_offsets` holds the offset of the first character of
/// every line after the first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub syntax_version: String,
    pub location: String,
    pub line_offsets: Vec<i32>,
    pub positions: FxHashMap<ExprId, i32>,
}

impl SourceInfo {
    pub fn new(location: impl Into<String>) -> Self {
        SourceInfo {
            location: location.into(),
            ..SourceInfo::default()
        }
    }

    /// Character offset of `id`, if recorded.
    pub fn position(&self, id: ExprId) -> Option<i32> {
        self.positions.get(&id).copied()
    }

    /// One-based `(line, column)` of `id`, if its position is recorded.
    pub fn line_and_column(&self, id: ExprId) -> Option<(usize, i32)> {
        let offset = self.position(id)?;
        let line = self.line_offsets.partition_point(|&start| start <= offset);
        let line_start = if line == 0 {
            0
        } else {
            self.line_offsets[line - 1]
        };
        Some((line + 1, offset - line_start + 1))
    }
}

/// A parsed (and already macro-expanded) expression with its source info.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedExpr {
    pub expr: Expr,
    pub source_info: SourceInfo,
}

impl ParsedExpr {
    pub fn new(expr: Expr, source_info: SourceInfo) -> Self {
        ParsedExpr { expr, source_info }
    }
}
