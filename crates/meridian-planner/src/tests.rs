//! Integration tests for meridian-planner.

#![allow(clippy::unwrap_used)] // Tests use unwrap for simplicity

mod property_tests;

use std::sync::Arc;

use crate::compare::{Collation, CollationStrength, CompareMode};
use crate::condition::{IndexCondition, ScalarOp};
use crate::error::PlannerError;
use crate::expr::{Expression, ExpressionVisitor, Literal, QueryResult, Subquery};
use crate::planner::{InSource, fold_conditions, select_best_access};
use crate::schema::{Column, DataType, IndexDef, Table, TableKind};
use crate::session::{Database, Session};
use crate::value::Value;

// ============================================================================
// Mock collaborators
// ============================================================================

/// An expression whose evaluation always fails.
#[derive(Debug)]
struct FailingExpression;

impl Expression for FailingExpression {
    fn evaluate(&self, _session: &Session) -> crate::error::Result<Value> {
        Err(PlannerError::Evaluation("division by zero".to_string()))
    }

    fn sql(&self) -> String {
        "1 / 0".to_string()
    }

    fn is_everything(&self, _visitor: ExpressionVisitor) -> bool {
        true
    }
}

/// An evaluatable but non-deterministic expression.
#[derive(Debug)]
struct RandomExpression;

impl Expression for RandomExpression {
    fn evaluate(&self, session: &Session) -> crate::error::Result<Value> {
        session.check_cancelled()?;
        Ok(Value::Real(0.5))
    }

    fn sql(&self) -> String {
        "RAND()".to_string()
    }

    fn is_everything(&self, visitor: ExpressionVisitor) -> bool {
        match visitor {
            ExpressionVisitor::Evaluatable => true,
            ExpressionVisitor::Deterministic => false,
        }
    }
}

/// A subquery over fixed rows.
#[derive(Debug)]
struct StaticSubquery {
    rows: Vec<Vec<Value>>,
}

impl Subquery for StaticSubquery {
    fn execute(&self, max_rows: usize) -> crate::error::Result<QueryResult> {
        let rows = if max_rows == 0 {
            self.rows.clone()
        } else {
            self.rows.iter().take(max_rows).cloned().collect()
        };
        Ok(QueryResult {
            columns: vec!["X".to_string()],
            rows,
        })
    }

    fn plan_sql(&self) -> String {
        "SELECT X FROM S".to_string()
    }

    fn is_everything(&self, _visitor: ExpressionVisitor) -> bool {
        true
    }
}

fn session() -> Session {
    Session::new(Database::new("test", CompareMode::binary()))
}

fn int_columns(kind: TableKind) -> (Column, Column) {
    let table = Table::new("T", kind);
    (
        Column::new(&table, 0, "A", DataType::Integer),
        Column::new(&table, 1, "B", DataType::Integer),
    )
}

// ============================================================================
// Planning scenarios
// ============================================================================

#[test]
fn equality_condition_end_to_end() {
    let session = session();
    let (a, _) = int_columns(TableKind::Regular);
    let condition = IndexCondition::scalar(ScalarOp::Equal, a.clone(), Literal::shared(5i32));

    assert_eq!(
        condition.mask(std::slice::from_ref(&condition)),
        IndexCondition::EQUALITY
    );
    assert!(condition.is_start() && condition.is_end());
    assert_eq!(condition.sql(), "A = 5");

    let index = IndexDef::new("T_A", vec![a]);
    let access = fold_conditions(&session, &index, &[condition]).unwrap();
    assert_eq!(access.columns[0].equalities, vec![Value::Integer(5)]);
    assert_eq!(access.prefix_len, 1);
}

#[test]
fn range_conditions_combine_to_range_mask() {
    let session = session();
    let (a, _) = int_columns(TableKind::Regular);
    let index = IndexDef::new("T_A", vec![a.clone()]);

    let conditions = vec![
        IndexCondition::scalar(ScalarOp::BiggerEqual, a.clone(), Literal::shared(10i32)),
        IndexCondition::scalar(ScalarOp::Smaller, a, Literal::shared(20i32)),
    ];
    let access = fold_conditions(&session, &index, &conditions).unwrap();

    let bounds = &access.columns[0];
    assert_eq!(bounds.lower, Some((Value::Integer(10), true)));
    assert_eq!(bounds.upper, Some((Value::Integer(20), false)));
    assert!(bounds.equalities.is_empty());
    assert_eq!(bounds.mask, IndexCondition::RANGE);
}

#[test]
fn in_list_on_regular_table_with_peer() {
    let session = session();
    let (a, b) = int_columns(TableKind::Regular);

    let in_cond = IndexCondition::in_list(
        a.clone(),
        vec![
            Literal::shared(1i32),
            Literal::shared(3i32),
            Literal::shared(2i32),
            Literal::shared(2i32),
        ],
    );
    let peer = IndexCondition::scalar(ScalarOp::Equal, b.clone(), Literal::shared(7i32));
    let conditions = [in_cond.clone(), peer];

    assert_eq!(in_cond.mask(&conditions), IndexCondition::EQUALITY);
    assert_eq!(
        in_cond.current_value_list(&session).unwrap(),
        vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
    );

    let index = IndexDef::new("T_A_B", vec![a, b]);
    let access = fold_conditions(&session, &index, &conditions).unwrap();
    assert!(matches!(access.columns[0].in_set, Some(InSource::List(_))));
    assert_eq!(access.prefix_len, 2);
}

#[test]
fn in_list_on_view_with_peer_is_residual() {
    let session = session();
    let (a, b) = int_columns(TableKind::View);

    let in_cond = IndexCondition::in_list(
        a.clone(),
        vec![Literal::shared(1i32), Literal::shared(2i32)],
    );
    let peer = IndexCondition::scalar(ScalarOp::Equal, b.clone(), Literal::shared(7i32));
    let conditions = [in_cond.clone(), peer];

    assert_eq!(in_cond.mask(&conditions), 0);

    let index = IndexDef::new("V_A_B", vec![a, b]);
    let access = fold_conditions(&session, &index, &conditions).unwrap();
    assert_eq!(access.residual.len(), 1);
    assert_eq!(access.residual[0].sql(), "A IN(1, 2)");
}

#[test]
fn false_condition_end_to_end() {
    let session = session();
    let (a, _) = int_columns(TableKind::Regular);
    let condition = IndexCondition::always_false();

    assert_eq!(
        condition.mask(std::slice::from_ref(&condition)),
        IndexCondition::ALWAYS_FALSE
    );
    assert!(condition.is_always_false());
    assert_eq!(condition.sql(), "FALSE");

    let index = IndexDef::new("T_A", vec![a.clone()]);
    let other = IndexCondition::scalar(ScalarOp::Equal, a, Literal::shared(1i32));
    let access = fold_conditions(&session, &index, &[condition, other]).unwrap();
    assert!(access.always_false);
}

// ============================================================================
// Error and cancellation propagation
// ============================================================================

#[test]
fn evaluation_failures_propagate_unchanged() {
    let session = session();
    let (a, _) = int_columns(TableKind::Regular);
    let condition =
        IndexCondition::scalar(ScalarOp::Equal, a.clone(), Arc::new(FailingExpression));

    assert!(matches!(
        condition.current_value(&session),
        Err(PlannerError::Evaluation(_))
    ));

    let index = IndexDef::new("T_A", vec![a]);
    assert!(matches!(
        fold_conditions(&session, &index, &[condition]),
        Err(PlannerError::Evaluation(_))
    ));
}

#[test]
fn cancellation_aborts_the_fold() {
    let session = session();
    let (a, _) = int_columns(TableKind::Regular);
    let index = IndexDef::new("T_A", vec![a.clone()]);
    let conditions = vec![IndexCondition::scalar(
        ScalarOp::Equal,
        a,
        Literal::shared(1i32),
    )];

    session.cancel();
    assert!(matches!(
        fold_conditions(&session, &index, &conditions),
        Err(PlannerError::Cancelled)
    ));
}

// ============================================================================
// Visitors and subqueries
// ============================================================================

#[test]
fn non_deterministic_expression_is_still_evaluatable() {
    let (a, _) = int_columns(TableKind::Regular);
    let condition = IndexCondition::scalar(ScalarOp::Equal, a, Arc::new(RandomExpression));
    assert!(condition.is_evaluatable());
    assert_eq!(condition.sql(), "A = RAND()");
}

#[test]
fn in_query_result_keeps_raw_rows() {
    let (a, _) = int_columns(TableKind::Regular);
    let rows = vec![
        vec![Value::Integer(3)],
        vec![Value::Integer(1)],
        vec![Value::Integer(3)],
    ];
    let condition =
        IndexCondition::in_query(a, Arc::new(StaticSubquery { rows: rows.clone() }));

    // Unlike an IN list, the subquery result is neither sorted nor distinct.
    assert_eq!(condition.current_result().unwrap().rows, rows);
    assert_eq!(condition.sql(), "A IN(SELECT X FROM S)");
}

#[test]
fn in_query_folds_as_lazy_source() {
    let session = session();
    let (a, _) = int_columns(TableKind::Regular);
    let index = IndexDef::new("T_A", vec![a.clone()]);
    let conditions = vec![IndexCondition::in_query(
        a,
        Arc::new(StaticSubquery { rows: vec![] }),
    )];

    let access = fold_conditions(&session, &index, &conditions).unwrap();
    assert!(matches!(access.columns[0].in_set, Some(InSource::Query(_))));
    assert!(access.residual.is_empty());
}

// ============================================================================
// Collation-aware folding
// ============================================================================

#[test]
fn case_insensitive_collation_folds_text_equalities() {
    let mode = CompareMode::with_collation(
        Collation::new("ENGLISH", CollationStrength::Primary),
        true,
    );
    let session = Session::new(Database::new("test", mode));
    let table = Table::new("T", TableKind::Regular);
    let name = Column::new(&table, 0, "NAME", DataType::Text);
    let index = IndexDef::new("T_NAME", vec![name.clone()]);

    // Under primary strength these are the same constraint, not a
    // contradiction.
    let conditions = vec![
        IndexCondition::scalar(ScalarOp::Equal, name.clone(), Literal::shared("alice")),
        IndexCondition::scalar(ScalarOp::Equal, name, Literal::shared("ALICE")),
    ];
    let access = fold_conditions(&session, &index, &conditions).unwrap();
    assert!(!access.always_false);
    assert_eq!(access.columns[0].equalities.len(), 1);
}

// ============================================================================
// Candidate selection
// ============================================================================

#[test]
fn selection_prefers_the_always_false_candidate() {
    let session = session();
    let (a, b) = int_columns(TableKind::Regular);
    let index_a = IndexDef::new("T_A", vec![a.clone()]);
    let index_b = IndexDef::new("T_B", vec![b.clone()]);

    let conditions = vec![
        IndexCondition::scalar(ScalarOp::Equal, a.clone(), Literal::shared(1i32)),
        IndexCondition::scalar(ScalarOp::Equal, a, Literal::shared(2i32)),
        IndexCondition::scalar(ScalarOp::Bigger, b, Literal::shared(0i32)),
    ];
    let candidates = vec![
        fold_conditions(&session, &index_a, &conditions).unwrap(),
        fold_conditions(&session, &index_b, &conditions).unwrap(),
    ];
    let best = select_best_access(&candidates).unwrap();
    assert!(best.always_false);
    assert_eq!(best.index_name, "T_A");
}
