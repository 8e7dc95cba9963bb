//! Vel IR - expression trees and ids
//!
//! This crate holds the data the runtime receives from its front end:
//! - [`ExprId`] node identifiers referenced by compiled steps and tracing
//! - The expanded expression tree ([`Expr`], [`ExprKind`], [`Comprehension`])
//! - [`SourceInfo`] positions keyed by node id
//! - Canonical operator function names ([`operators`])
//!
//! Parsing and macro expansion live outside the runtime; the tree here is
//! what they produce. Every type is serde-serializable so hosts can ship
//! pre-parsed expressions.

mod ast;
mod builder;
mod expr_id;
pub mod operators;
mod source_info;

pub use ast::{Comprehension, Constant, Expr, ExprKind, FieldEntry, MapEntry};
pub use builder::ExprBuilder;
pub use expr_id::ExprId;
pub use source_info::{ParsedExpr, SourceInfo};
