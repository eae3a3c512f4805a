//! Property-based tests using proptest.
//!
//! Tests invariants that should hold for all inputs, using fuzzing-like
//! techniques.

use std::cmp::Ordering;

use proptest::prelude::*;

use crate::compare::CompareMode;
use crate::condition::{IndexCondition, ScalarOp};
use crate::expr::Literal;
use crate::schema::{Column, DataType, Table, TableKind};
use crate::session::{Database, Session};
use crate::value::Value;

fn session() -> Session {
    Session::new(Database::new("test", CompareMode::binary()))
}

fn int_column(kind: TableKind) -> Column {
    let table = Table::new("T", kind);
    Column::new(&table, 0, "A", DataType::Integer)
}

fn scalar_op() -> impl Strategy<Value = ScalarOp> {
    prop_oneof![
        Just(ScalarOp::Equal),
        Just(ScalarOp::EqualNullSafe),
        Just(ScalarOp::Bigger),
        Just(ScalarOp::BiggerEqual),
        Just(ScalarOp::Smaller),
        Just(ScalarOp::SmallerEqual),
    ]
}

fn table_kind() -> impl Strategy<Value = TableKind> {
    prop_oneof![
        Just(TableKind::Regular),
        Just(TableKind::View),
        Just(TableKind::FunctionTable),
        Just(TableKind::SystemTable),
        Just(TableKind::External),
    ]
}

proptest! {
    // ========================================================================
    // Mask and bound classification
    // ========================================================================

    /// Every scalar condition's standalone mask is exactly one access class
    /// (never zero).
    #[test]
    fn scalar_mask_totality(op in scalar_op(), v: i32) {
        let cond = IndexCondition::scalar(
            op,
            int_column(TableKind::Regular),
            Literal::shared(v),
        );
        let mask = cond.mask(std::slice::from_ref(&cond));
        prop_assert!(
            mask == IndexCondition::EQUALITY
                || mask == IndexCondition::START
                || mask == IndexCondition::END
        );
    }

    /// Every scalar condition drives a range start or a range end;
    /// equalities drive both.
    #[test]
    fn scalar_bound_classification(op in scalar_op(), v: i32) {
        let cond = IndexCondition::scalar(
            op,
            int_column(TableKind::Regular),
            Literal::shared(v),
        );
        prop_assert!(cond.is_start() || cond.is_end());
        if matches!(op, ScalarOp::Equal | ScalarOp::EqualNullSafe) {
            prop_assert!(cond.is_start() && cond.is_end());
        }
    }

    /// The IN peer rule: alone always equality; with peers, equality only
    /// on regular tables.
    #[test]
    fn in_peer_rule(kind in table_kind(), peer_count in 0usize..3) {
        let column = int_column(kind);
        let in_cond = IndexCondition::in_list(
            column.clone(),
            vec![Literal::shared(1i32)],
        );

        let mut peers = vec![in_cond.clone()];
        for i in 0..peer_count {
            peers.push(IndexCondition::scalar(
                ScalarOp::Equal,
                column.clone(),
                Literal::shared(i as i32),
            ));
        }

        let mask = in_cond.mask(&peers);
        if peer_count == 0 || kind == TableKind::Regular {
            prop_assert_eq!(mask, IndexCondition::EQUALITY);
        } else {
            prop_assert_eq!(mask, 0);
        }
    }

    // ========================================================================
    // Value list snapshot
    // ========================================================================

    /// `current_value_list` output is strictly sorted and distinct under
    /// the session's compare mode, whatever the input order.
    #[test]
    fn value_list_sorted_and_distinct(values in prop::collection::vec(any::<i32>(), 0..20)) {
        let session = session();
        let cond = IndexCondition::in_list(
            int_column(TableKind::Regular),
            values.iter().map(|&v| Literal::shared(v)).collect(),
        );

        let list = cond.current_value_list(&session).unwrap();
        let mode = session.database().compare_mode();
        for pair in list.windows(2) {
            prop_assert_eq!(pair[0].compare_in(&pair[1], mode), Ordering::Less);
        }

        // Every distinct input survives.
        let mut expected: Vec<i32> = values;
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(list.len(), expected.len());
    }

    // ========================================================================
    // SQL stability
    // ========================================================================

    /// Identical conditions render byte-identical SQL.
    #[test]
    fn sql_is_a_function_of_the_condition(op in scalar_op(), v: i64) {
        let make = || IndexCondition::scalar(
            op,
            int_column(TableKind::Regular),
            Literal::shared(v),
        );
        prop_assert_eq!(make().sql(), make().sql());
    }

    /// The mask is pure: repeated calls with the same peers agree, and the
    /// condition still renders the same SQL afterwards.
    #[test]
    fn mask_is_pure(op in scalar_op(), v: i32) {
        let cond = IndexCondition::scalar(
            op,
            int_column(TableKind::Regular),
            Literal::shared(v),
        );
        let peers = [cond.clone()];
        let before = cond.sql();
        prop_assert_eq!(cond.mask(&peers), cond.mask(&peers));
        prop_assert_eq!(before, cond.sql());
    }

    // ========================================================================
    // Value ordering
    // ========================================================================

    /// `compare_in` is a total order over mixed integer widths: reflexive,
    /// antisymmetric, and consistent with numeric order.
    #[test]
    fn integer_family_order_is_numeric(a: i32, b: i64) {
        let mode = CompareMode::binary();
        let va = Value::Integer(a);
        let vb = Value::BigInt(b);
        prop_assert_eq!(va.compare_in(&va, &mode), Ordering::Equal);
        prop_assert_eq!(
            va.compare_in(&vb, &mode),
            i128::from(a).cmp(&i128::from(b))
        );
        prop_assert_eq!(va.compare_in(&vb, &mode), vb.compare_in(&va, &mode).reverse());
    }

    /// Real values order totally even through NaN and infinities.
    #[test]
    fn real_order_is_total(a: f64, b: f64) {
        let mode = CompareMode::binary();
        let va = Value::Real(a);
        let vb = Value::Real(b);
        prop_assert_eq!(va.compare_in(&vb, &mode), vb.compare_in(&va, &mode).reverse());
        prop_assert_eq!(va.compare_in(&va, &mode), Ordering::Equal);
    }

    /// Text ordering under a case-folding collation stays antisymmetric.
    #[test]
    fn collated_text_order_is_total(a in "[a-zA-Z]{0,8}", b in "[a-zA-Z]{0,8}") {
        let mode = CompareMode::with_collation(
            crate::compare::Collation::new(
                "ENGLISH",
                crate::compare::CollationStrength::Primary,
            ),
            true,
        );
        let va = Value::Text(a);
        let vb = Value::Text(b);
        prop_assert_eq!(va.compare_in(&vb, &mode), vb.compare_in(&va, &mode).reverse());
    }
}
