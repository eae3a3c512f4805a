//! Error types for the planner core.

use thiserror::Error;

use crate::schema::DataType;

/// Planner core errors.
///
/// Errors raised by expression or subquery collaborators are propagated
/// unchanged; the core never catches or rewraps them.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// A value cannot be coerced to the column's declared type.
    #[error("invalid value class: cannot convert {actual} to {expected}")]
    InvalidValueClass {
        /// Target column type.
        expected: DataType,
        /// Source value kind.
        actual: &'static str,
    },

    /// A numeric coercion would lose the value.
    #[error("value {value} out of range for {target}")]
    OutOfRange {
        /// Source value, rendered.
        value: String,
        /// Target column type.
        target: DataType,
    },

    /// A value of a convertible class failed to parse as the target type.
    #[error("cannot convert {value} to {target}")]
    DataConversion {
        /// Source value, rendered.
        value: String,
        /// Target column type.
        target: DataType,
    },

    /// A parameter was evaluated before being bound.
    #[error("parameter ${0} is not bound")]
    ParameterNotBound(usize),

    /// Planner bug; fatal to the query.
    #[error("internal error: {0}")]
    Internal(String),

    /// Expression or subquery evaluation failed.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// The session was cancelled.
    #[error("query cancelled")]
    Cancelled,
}

/// Result type for planner operations.
pub type Result<T> = std::result::Result<T, PlannerError>;
