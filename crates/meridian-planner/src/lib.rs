//! # meridian-planner: index-condition analysis for Meridian SQL
//!
//! This crate is the index-condition model of the Meridian query planner:
//! the data structure and algebra by which the planner decides, per
//! candidate index, which WHERE-clause predicates can be pushed down as
//! index access bounds.
//!
//! ## Predicate forms
//!
//! An [`IndexCondition`] binds one table column to one of:
//! - a scalar comparison (`=`, `IS`, `>`, `>=`, `<`, `<=`)
//! - an IN list (`col IN (e1, ..., en)`)
//! - an IN subquery (`col IN (SELECT ...)`)
//! - the always-false contradiction
//!
//! Each condition contributes an access mask (equality, range start, range
//! end, always-false); [`fold_conditions`] aggregates the conditions of one
//! planning decision into per-column bounds, and [`select_best_access`]
//! ranks the folded candidates.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use meridian_planner::{
//!     Column, CompareMode, Database, DataType, IndexCondition, IndexDef,
//!     Literal, ScalarOp, Session, Table, TableKind, fold_conditions,
//! };
//!
//! let table = Table::new("USERS", TableKind::Regular);
//! let id = Column::new(&table, 0, "ID", DataType::BigInt);
//! let index = IndexDef::new("USERS_ID", vec![id.clone()]);
//!
//! let session = Session::new(Database::new("app", CompareMode::binary()));
//! let conditions = vec![
//!     IndexCondition::scalar(ScalarOp::Equal, id, Literal::shared(42i64)),
//! ];
//! let access = fold_conditions(&session, &index, &conditions)?;
//! assert_eq!(access.prefix_len, 1);
//! ```
//!
//! The expression tree and subquery executor stay opaque: they reach this
//! crate only through the [`Expression`] and [`Subquery`] traits. The crate
//! holds no wire protocol, no persisted state, and takes no locks; a
//! [`Session`] is owned by one thread for the duration of a query, while
//! conditions themselves are immutable and freely shareable.

mod compare;
mod condition;
mod error;
mod expr;
mod planner;
mod schema;
mod session;
mod value;

#[cfg(test)]
mod tests;

// Re-export public types
pub use compare::{Collation, CollationStrength, CompareMode};
pub use condition::{CompareOp, IndexCondition, ScalarOp};
pub use error::{PlannerError, Result};
pub use expr::{
    Expression, ExpressionRef, ExpressionVisitor, Literal, Parameter, QueryResult, Subquery,
    SubqueryRef,
};
pub use planner::{
    ColumnBounds, InSource, IndexAccess, fold_conditions, select_best_access,
};
pub use schema::{Column, DataType, IndexDef, Table, TableKind};
pub use session::{Database, Session};
pub use value::Value;
