//! Scalar expressions and subquery handles.
//!
//! The planner core treats the expression tree as opaque: an expression is
//! anything that can evaluate to a [`Value`], print itself as SQL, and
//! answer visitor questions. Subqueries are the same idea one level up,
//! producing a result set instead of a scalar.
//!
//! Two concrete nodes live here because the planner itself creates them as
//! comparison right-hand sides: [`Literal`] and [`Parameter`]. Everything
//! else (column references, operators, functions) belongs to the expression
//! compiler and reaches this crate only through the traits.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::{PlannerError, Result};
use crate::session::Session;
use crate::value::Value;

/// Questions an expression can be asked about all of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionVisitor {
    /// All inputs are constants, bound parameters, or already-materialized
    /// outer references; the expression can be evaluated right now.
    Evaluatable,
    /// Re-evaluation always yields the same value.
    Deterministic,
}

/// An opaque scalar expression node.
pub trait Expression: fmt::Debug + Send + Sync {
    /// Evaluates the expression under the given session.
    fn evaluate(&self, session: &Session) -> Result<Value>;

    /// Renders the expression as SQL text.
    fn sql(&self) -> String;

    /// Returns true if the visitor's property holds for this expression
    /// and everything below it.
    fn is_everything(&self, visitor: ExpressionVisitor) -> bool;
}

/// An opaque subquery handle.
pub trait Subquery: fmt::Debug + Send + Sync {
    /// Executes the subquery, returning at most `max_rows` rows
    /// (0 means unbounded).
    fn execute(&self, max_rows: usize) -> Result<QueryResult>;

    /// Renders the subquery's plan as SQL text.
    fn plan_sql(&self) -> String;

    /// Returns true if the visitor's property holds for the whole subquery.
    fn is_everything(&self, visitor: ExpressionVisitor) -> bool;
}

/// Shared reference to an expression node.
pub type ExpressionRef = Arc<dyn Expression>;

/// Shared reference to a subquery handle.
pub type SubqueryRef = Arc<dyn Subquery>;

/// Result of executing a subquery.
///
/// Rows are not guaranteed to be distinct, ordered, or of uniform column
/// type; callers needing those properties must establish them.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Column names.
    pub columns: Vec<String>,
    /// Result rows.
    pub rows: Vec<Vec<Value>>,
}

/// A constant expression.
#[derive(Debug, Clone)]
pub struct Literal {
    value: Value,
}

impl Literal {
    /// Creates a literal expression.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Returns the literal as a shared expression node.
    pub fn shared(value: impl Into<Value>) -> ExpressionRef {
        Arc::new(Self::new(value))
    }
}

impl Expression for Literal {
    fn evaluate(&self, session: &Session) -> Result<Value> {
        session.check_cancelled()?;
        Ok(self.value.clone())
    }

    fn sql(&self) -> String {
        self.value.sql()
    }

    fn is_everything(&self, _visitor: ExpressionVisitor) -> bool {
        true
    }
}

/// A positional query parameter (`$1`, `$2`, ...), bound once per execution.
///
/// Unbound parameters are not evaluatable; evaluating one fails with
/// `ParameterNotBound`.
#[derive(Debug, Default)]
pub struct Parameter {
    index: usize,
    slot: RwLock<Option<Value>>,
}

impl Parameter {
    /// Creates an unbound parameter with a 1-based index.
    pub fn new(index: usize) -> Arc<Self> {
        Arc::new(Self {
            index,
            slot: RwLock::new(None),
        })
    }

    /// Returns the 1-based parameter index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Binds the parameter for the current execution.
    pub fn bind(&self, value: Value) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = Some(value);
        }
    }

    /// Clears the binding between executions.
    pub fn unbind(&self) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = None;
        }
    }

    fn bound(&self) -> Option<Value> {
        self.slot.read().ok().and_then(|slot| slot.clone())
    }
}

impl Expression for Parameter {
    fn evaluate(&self, session: &Session) -> Result<Value> {
        session.check_cancelled()?;
        self.bound()
            .ok_or(PlannerError::ParameterNotBound(self.index))
    }

    fn sql(&self) -> String {
        format!("${}", self.index)
    }

    fn is_everything(&self, visitor: ExpressionVisitor) -> bool {
        match visitor {
            // A bound parameter is a constant for the rest of the execution.
            ExpressionVisitor::Evaluatable | ExpressionVisitor::Deterministic => {
                self.bound().is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::compare::CompareMode;
    use crate::session::Database;

    fn session() -> Session {
        Session::new(Database::new("test", CompareMode::binary()))
    }

    #[test]
    fn literal_evaluates_to_its_value() {
        let session = session();
        let lit = Literal::new(42i32);
        assert_eq!(lit.evaluate(&session).unwrap(), Value::Integer(42));
        assert!(lit.is_everything(ExpressionVisitor::Evaluatable));
        assert!(lit.is_everything(ExpressionVisitor::Deterministic));
        assert_eq!(lit.sql(), "42");
    }

    #[test]
    fn parameter_binding_controls_evaluability() {
        let session = session();
        let param = Parameter::new(1);
        assert!(!param.is_everything(ExpressionVisitor::Evaluatable));
        assert!(matches!(
            param.evaluate(&session),
            Err(PlannerError::ParameterNotBound(1))
        ));

        param.bind(Value::Text("x".into()));
        assert!(param.is_everything(ExpressionVisitor::Evaluatable));
        assert_eq!(param.evaluate(&session).unwrap(), Value::Text("x".into()));
        assert_eq!(param.sql(), "$1");

        param.unbind();
        assert!(!param.is_everything(ExpressionVisitor::Evaluatable));
    }

    #[test]
    fn evaluation_respects_cancellation() {
        let session = session();
        session.cancel();
        assert!(matches!(
            Literal::new(1i64).evaluate(&session),
            Err(PlannerError::Cancelled)
        ));
    }
}
