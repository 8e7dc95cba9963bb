//! Convenience constructor for expression trees.
//!
//! Ids are handed out in construction order, so building `2 + 1 == 3`
//! inside-out numbers the nodes from the leaves to the root.

use std::cell::{Cell, RefCell};

use crate::{
    Comprehension, Constant, Expr, ExprId, ExprKind, FieldEntry, MapEntry, SourceInfo,
};

/// Allocates node ids and builds [`Expr`] values.
///
/// Methods take `&self` so calls can nest: `b.call("f", vec![b.int(1)])`.
#[derive(Debug)]
pub struct ExprBuilder {
    next_id: Cell<i64>,
    source_info: RefCell<SourceInfo>,
}

impl Default for ExprBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprBuilder {
    pub fn new() -> Self {
        ExprBuilder {
            next_id: Cell::new(1),
            source_info: RefCell::new(SourceInfo::default()),
        }
    }

    /// Reserve the next id.
    pub fn next_id(&self) -> ExprId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        ExprId::new(id)
    }

    fn node(&self, kind: ExprKind) -> Expr {
        Expr::new(self.next_id(), kind)
    }

    /// Record the source offset of an already-built node.
    pub fn set_position(&self, id: ExprId, offset: i32) {
        self.source_info.borrow_mut().positions.insert(id, offset);
    }

    /// Take the source info collected so far.
    pub fn take_source_info(&self) -> SourceInfo {
        self.source_info.take()
    }

    pub fn constant(&self, value: Constant) -> Expr {
        self.node(ExprKind::Const(value))
    }

    pub fn null(&self) -> Expr {
        self.constant(Constant::Null)
    }

    pub fn bool(&self, value: bool) -> Expr {
        self.constant(Constant::Bool(value))
    }

    pub fn int(&self, value: i64) -> Expr {
        self.constant(Constant::Int(value))
    }

    pub fn uint(&self, value: u64) -> Expr {
        self.constant(Constant::Uint(value))
    }

    pub fn double(&self, value: f64) -> Expr {
        self.constant(Constant::Double(value))
    }

    pub fn string(&self, value: impl Into<String>) -> Expr {
        self.constant(Constant::String(value.into()))
    }

    pub fn bytes(&self, value: impl Into<Vec<u8>>) -> Expr {
        self.constant(Constant::Bytes(value.into()))
    }

    pub fn ident(&self, name: impl Into<String>) -> Expr {
        self.node(ExprKind::Ident { name: name.into() })
    }

    pub fn select(&self, operand: Expr, field: impl Into<String>) -> Expr {
        self.node(ExprKind::Select {
            operand: Box::new(operand),
            field: field.into(),
            test_only: false,
        })
    }

    /// `has(operand.field)`.
    pub fn presence_test(&self, operand: Expr, field: impl Into<String>) -> Expr {
        self.node(ExprKind::Select {
            operand: Box::new(operand),
            field: field.into(),
            test_only: true,
        })
    }

    pub fn call(&self, function: impl Into<String>, args: Vec<Expr>) -> Expr {
        self.node(ExprKind::Call {
            function: function.into(),
            target: None,
            args,
        })
    }

    pub fn member_call(&self, function: impl Into<String>, target: Expr, args: Vec<Expr>) -> Expr {
        self.node(ExprKind::Call {
            function: function.into(),
            target: Some(Box::new(target)),
            args,
        })
    }

    pub fn list(&self, elements: Vec<Expr>) -> Expr {
        self.node(ExprKind::CreateList { elements })
    }

    /// Map literal; every entry receives its own id before the map node.
    pub fn map(&self, entries: Vec<(Expr, Expr)>) -> Expr {
        let entries = entries
            .into_iter()
            .map(|(key, value)| MapEntry {
                id: self.next_id(),
                key,
                value,
            })
            .collect();
        self.node(ExprKind::CreateMap { entries })
    }

    pub fn structure(&self, type_name: impl Into<String>, fields: Vec<(&str, Expr)>) -> Expr {
        let fields = fields
            .into_iter()
            .map(|(field, value)| FieldEntry {
                id: self.next_id(),
                field: field.to_owned(),
                value,
            })
            .collect();
        self.node(ExprKind::CreateStruct {
            type_name: type_name.into(),
            fields,
        })
    }

    pub fn comprehension(&self, comprehension: Comprehension) -> Expr {
        self.node(ExprKind::Comprehension(Box::new(comprehension)))
    }
}
