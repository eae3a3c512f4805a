//! Index conditions.
//!
//! An index condition binds a single table column to a comparison: against
//! a scalar expression, a list of expressions (IN list), or a subquery
//! (IN subquery). The predicate analyzer creates them during compilation;
//! the index selector reads them to derive access masks and bounds; the
//! chosen access plan snapshots their values at execution time. A condition
//! is immutable once constructed.

use std::cmp::Ordering;

use crate::error::{PlannerError, Result};
use crate::expr::{ExpressionRef, ExpressionVisitor, QueryResult, SubqueryRef};
use crate::schema::{Column, TableKind};
use crate::session::Session;
use crate::value::Value;

/// Scalar comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarOp {
    /// `col = expr`, NULL-unsafe.
    Equal,
    /// `col IS expr`, NULL-safe.
    EqualNullSafe,
    /// `col > expr`.
    Bigger,
    /// `col >= expr`.
    BiggerEqual,
    /// `col < expr`.
    Smaller,
    /// `col <= expr`.
    SmallerEqual,
}

impl ScalarOp {
    /// Returns the SQL symbol for this operator.
    pub fn sql_symbol(self) -> &'static str {
        match self {
            ScalarOp::Equal => "=",
            ScalarOp::EqualNullSafe => "IS",
            ScalarOp::Bigger => ">",
            ScalarOp::BiggerEqual => ">=",
            ScalarOp::Smaller => "<",
            ScalarOp::SmallerEqual => "<=",
        }
    }
}

/// Operator codes carried by index conditions, including the IN variants
/// and the contradiction marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `col = expr`.
    Equal,
    /// `col IS expr`.
    EqualNullSafe,
    /// `col > expr`.
    Bigger,
    /// `col >= expr`.
    BiggerEqual,
    /// `col < expr`.
    Smaller,
    /// `col <= expr`.
    SmallerEqual,
    /// `col IN (e1, ..., en)`.
    InList,
    /// `col IN (subquery)`.
    InQuery,
    /// Contradiction; matches no row.
    False,
}

/// One atomic predicate bound to one column.
///
/// The variants enforce the payload invariant structurally: a scalar
/// condition has exactly one right-hand expression, an IN-list condition
/// has the expression list, an IN-subquery condition has the query handle,
/// and `False` has neither column nor payload.
#[derive(Debug, Clone)]
pub enum IndexCondition {
    /// The always-false condition.
    False,
    /// A scalar comparison.
    Scalar {
        /// Comparison operator.
        op: ScalarOp,
        /// Constrained column.
        column: Column,
        /// Right-hand side.
        expression: ExpressionRef,
    },
    /// An IN condition over a fixed expression list.
    InList {
        /// Constrained column.
        column: Column,
        /// List elements, in source order.
        expressions: Vec<ExpressionRef>,
    },
    /// An IN condition over a subquery.
    InQuery {
        /// Constrained column.
        column: Column,
        /// Subquery producing the candidate values.
        query: SubqueryRef,
    },
}

impl IndexCondition {
    /// The condition constrains the column to one value.
    pub const EQUALITY: u8 = 1;
    /// The condition contributes a range start.
    pub const START: u8 = 2;
    /// The condition contributes a range end.
    pub const END: u8 = 4;
    /// Both range bounds.
    pub const RANGE: u8 = Self::START | Self::END;
    /// The condition can never hold.
    pub const ALWAYS_FALSE: u8 = 8;

    /// Creates a scalar comparison condition.
    pub fn scalar(op: ScalarOp, column: Column, expression: ExpressionRef) -> Self {
        IndexCondition::Scalar {
            op,
            column,
            expression,
        }
    }

    /// Creates an IN-list condition.
    pub fn in_list(column: Column, expressions: Vec<ExpressionRef>) -> Self {
        IndexCondition::InList {
            column,
            expressions,
        }
    }

    /// Creates an IN-subquery condition.
    pub fn in_query(column: Column, query: SubqueryRef) -> Self {
        IndexCondition::InQuery { column, query }
    }

    /// Creates the always-false condition.
    pub fn always_false() -> Self {
        IndexCondition::False
    }

    /// Returns the operator code.
    pub fn compare_op(&self) -> CompareOp {
        match self {
            IndexCondition::False => CompareOp::False,
            IndexCondition::Scalar { op, .. } => match op {
                ScalarOp::Equal => CompareOp::Equal,
                ScalarOp::EqualNullSafe => CompareOp::EqualNullSafe,
                ScalarOp::Bigger => CompareOp::Bigger,
                ScalarOp::BiggerEqual => CompareOp::BiggerEqual,
                ScalarOp::Smaller => CompareOp::Smaller,
                ScalarOp::SmallerEqual => CompareOp::SmallerEqual,
            },
            IndexCondition::InList { .. } => CompareOp::InList,
            IndexCondition::InQuery { .. } => CompareOp::InQuery,
        }
    }

    /// Returns the constrained column (absent for `False`).
    pub fn column(&self) -> Option<&Column> {
        match self {
            IndexCondition::False => None,
            IndexCondition::Scalar { column, .. }
            | IndexCondition::InList { column, .. }
            | IndexCondition::InQuery { column, .. } => Some(column),
        }
    }

    /// Computes the access mask for this condition.
    ///
    /// `peers` is the full set of conditions applying to the index under
    /// consideration, this condition included. IN conditions keep their
    /// equality class when they stand alone or when the column's table is a
    /// regular base table; on any other table kind the presence of peers
    /// downgrades them to 0 (not usable for index access).
    pub fn mask(&self, peers: &[IndexCondition]) -> u8 {
        match self {
            IndexCondition::False => Self::ALWAYS_FALSE,
            IndexCondition::Scalar { op, .. } => match op {
                ScalarOp::Equal | ScalarOp::EqualNullSafe => Self::EQUALITY,
                ScalarOp::Bigger | ScalarOp::BiggerEqual => Self::START,
                ScalarOp::Smaller | ScalarOp::SmallerEqual => Self::END,
            },
            IndexCondition::InList { column, .. } | IndexCondition::InQuery { column, .. } => {
                if peers.len() == 1 || column.table().kind() == TableKind::Regular {
                    Self::EQUALITY
                } else {
                    0
                }
            }
        }
    }

    /// Returns true if this condition can drive a range start.
    pub fn is_start(&self) -> bool {
        matches!(
            self,
            IndexCondition::Scalar {
                op: ScalarOp::Equal
                    | ScalarOp::EqualNullSafe
                    | ScalarOp::Bigger
                    | ScalarOp::BiggerEqual,
                ..
            }
        )
    }

    /// Returns true if this condition can drive a range end.
    pub fn is_end(&self) -> bool {
        matches!(
            self,
            IndexCondition::Scalar {
                op: ScalarOp::Equal
                    | ScalarOp::EqualNullSafe
                    | ScalarOp::Smaller
                    | ScalarOp::SmallerEqual,
                ..
            }
        )
    }

    /// Returns true for the always-false condition.
    pub fn is_always_false(&self) -> bool {
        matches!(self, IndexCondition::False)
    }

    /// Evaluates the scalar right-hand side.
    ///
    /// No coercion is applied; callers needing the column's type must pass
    /// the result through [`Column::convert`].
    pub fn current_value(&self, session: &Session) -> Result<Value> {
        match self {
            IndexCondition::Scalar { expression, .. } => expression.evaluate(session),
            other => Err(PlannerError::Internal(format!(
                "current_value on {:?} condition",
                other.compare_op()
            ))),
        }
    }

    /// Evaluates the IN list to a converted, sorted, distinct value set.
    ///
    /// Each element is evaluated, coerced to the column type, then the set
    /// is ordered under the session database's compare mode with
    /// equal-comparing duplicates collapsed to one representative.
    pub fn current_value_list(&self, session: &Session) -> Result<Vec<Value>> {
        match self {
            IndexCondition::InList {
                column,
                expressions,
            } => {
                let mode = session.database().compare_mode();
                let mut values = Vec::with_capacity(expressions.len());
                for expression in expressions {
                    let value = expression.evaluate(session)?;
                    values.push(column.convert(value)?);
                }
                values.sort_by(|a, b| a.compare_in(b, mode));
                values.dedup_by(|a, b| a.compare_in(b, mode) == Ordering::Equal);
                Ok(values)
            }
            other => Err(PlannerError::Internal(format!(
                "current_value_list on {:?} condition",
                other.compare_op()
            ))),
        }
    }

    /// Executes the IN subquery, unbounded.
    ///
    /// The result carries none of the distinctness or ordering guarantees
    /// of [`Self::current_value_list`].
    pub fn current_result(&self) -> Result<QueryResult> {
        match self {
            IndexCondition::InQuery { query, .. } => query.execute(0),
            other => Err(PlannerError::Internal(format!(
                "current_result on {:?} condition",
                other.compare_op()
            ))),
        }
    }

    /// Returns true if every input of this condition can be evaluated now.
    ///
    /// Never fails; a condition that cannot currently be evaluated stays a
    /// residual filter.
    pub fn is_evaluatable(&self) -> bool {
        match self {
            IndexCondition::False => true,
            IndexCondition::Scalar { expression, .. } => {
                expression.is_everything(ExpressionVisitor::Evaluatable)
            }
            IndexCondition::InList { expressions, .. } => expressions
                .iter()
                .all(|e| e.is_everything(ExpressionVisitor::Evaluatable)),
            IndexCondition::InQuery { query, .. } => {
                query.is_everything(ExpressionVisitor::Evaluatable)
            }
        }
    }

    /// Reconstructs the predicate as SQL text for explain output.
    ///
    /// The text is stable for a given condition; it is not required to
    /// round-trip through a parser bit-exactly.
    pub fn sql(&self) -> String {
        match self {
            IndexCondition::False => "FALSE".to_string(),
            IndexCondition::Scalar {
                op,
                column,
                expression,
            } => format!("{} {} {}", column.sql(), op.sql_symbol(), expression.sql()),
            IndexCondition::InList {
                column,
                expressions,
            } => {
                let items: Vec<String> = expressions.iter().map(|e| e.sql()).collect();
                format!("{} IN({})", column.sql(), items.join(", "))
            }
            IndexCondition::InQuery { column, query } => {
                format!("{} IN({})", column.sql(), query.plan_sql())
            }
        }
    }
}
