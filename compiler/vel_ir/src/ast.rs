//! Expression tree consumed by the planner.
//!
//! The tree arrives fully expanded: macros such as `all` or `map` have already
//! been rewritten into [`Comprehension`] nodes, and every operator is a
//! [`ExprKind::Call`] to one of the names in [`crate::operators`].

use serde::{Deserialize, Serialize};

use crate::ExprId;

/// Literal value of a constant node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Duration literal as seconds plus nanoseconds of adjustment.
    Duration { seconds: i64, nanos: i32 },
    /// Timestamp literal as seconds plus nanoseconds since the Unix epoch.
    Timestamp { seconds: i64, nanos: i32 },
}

/// A node of the expression tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Const(Constant),
    Ident {
        name: String,
    },
    /// `operand.field`, or `has(operand.field)` when `test_only` is set.
    Select {
        operand: Box<Expr>,
        field: String,
        test_only: bool,
    },
    /// Global call `f(args)` or receiver call `target.f(args)`.
    Call {
        function: String,
        target: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
    CreateList {
        elements: Vec<Expr>,
    },
    CreateMap {
        entries: Vec<MapEntry>,
    },
    CreateStruct {
        type_name: String,
        fields: Vec<FieldEntry>,
    },
    Comprehension(Box<Comprehension>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    pub id: ExprId,
    pub key: Expr,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub id: ExprId,
    pub field: String,
    pub value: Expr,
}

/// A fold over a list or the keys of a map.
///
/// Evaluates `accu_init`, then for each element binds `iter_var` and, while
/// `loop_condition` holds, replaces the accumulator with `loop_step`.
/// Finally evaluates `result` with the accumulator in scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comprehension {
    pub iter_var: String,
    pub iter_range: Expr,
    pub accu_var: String,
    pub accu_init: Expr,
    pub loop_condition: Expr,
    pub loop_step: Expr,
    pub result: Expr,
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Expr { id, kind }
    }

    /// Visit this node and all of its descendants in pre-order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match &self.kind {
            ExprKind::Const(_) | ExprKind::Ident { .. } => {}
            ExprKind::Select { operand, .. } => operand.walk(f),
            ExprKind::Call { target, args, .. } => {
                if let Some(target) = target {
                    target.walk(f);
                }
                for arg in args {
                    arg.walk(f);
                }
            }
            ExprKind::CreateList { elements } => {
                for element in elements {
                    element.walk(f);
                }
            }
            ExprKind::CreateMap { entries } => {
                for entry in entries {
                    entry.key.walk(f);
                    entry.value.walk(f);
                }
            }
            ExprKind::CreateStruct { fields, .. } => {
                for field in fields {
                    field.value.walk(f);
                }
            }
            ExprKind::Comprehension(c) => {
                c.iter_range.walk(f);
                c.accu_init.walk(f);
                c.loop_condition.walk(f);
                c.loop_step.walk(f);
                c.result.walk(f);
            }
        }
    }

    /// Ids of this node and all descendants.
    pub fn subtree_ids(&self) -> Vec<ExprId> {
        let mut ids = Vec::new();
        self.walk(&mut |e| ids.push(e.id));
        ids
    }
}
