//! Index selection: folds index conditions into per-column access bounds.
//!
//! Given the conditions collected for one candidate index, the fold
//! produces a per-column summary (equality set, tightest range bounds, IN
//! source) plus the residual conditions that must stay post-scan filters.
//! Candidates are scored and the best access is chosen per index decision:
//! - equality constraints are best, range bounds are good
//! - ties go to the candidate leaving the fewest residual filters

use std::cmp::Ordering;

use tracing::debug;

use crate::compare::CompareMode;
use crate::condition::{IndexCondition, ScalarOp};
use crate::error::Result;
use crate::expr::SubqueryRef;
use crate::schema::{Column, IndexDef};
use crate::session::Session;
use crate::value::Value;

/// The IN source retained for a column, at most one per column.
#[derive(Debug, Clone)]
pub enum InSource {
    /// A materialized, sorted, distinct value set.
    List(Vec<Value>),
    /// A lazy subquery; no distinctness or ordering guarantee.
    Query(SubqueryRef),
}

/// Access summary for one index column.
#[derive(Debug, Clone)]
pub struct ColumnBounds {
    /// The summarized column.
    pub column: Column,
    /// Distinct equality constraint values (at most one after folding).
    pub equalities: Vec<Value>,
    /// Tightest lower bound and whether it is inclusive.
    pub lower: Option<(Value, bool)>,
    /// Tightest upper bound and whether it is inclusive.
    pub upper: Option<(Value, bool)>,
    /// The IN source, if any.
    pub in_set: Option<InSource>,
    /// Union of the access masks contributed to this column.
    pub mask: u8,
}

impl ColumnBounds {
    fn new(column: Column) -> Self {
        Self {
            column,
            equalities: Vec::new(),
            lower: None,
            upper: None,
            in_set: None,
            mask: 0,
        }
    }

    /// Returns true if the column is constrained to specific values.
    pub fn is_equality(&self) -> bool {
        self.mask & IndexCondition::EQUALITY != 0
    }
}

/// The folded access description for one candidate index.
#[derive(Debug, Clone)]
pub struct IndexAccess {
    /// Name of the candidate index.
    pub index_name: String,
    /// Per-column summaries, in index column order.
    pub columns: Vec<ColumnBounds>,
    /// True if the conditions can never hold; the scan is empty.
    pub always_false: bool,
    /// Usable prefix: leading equality columns, plus at most one
    /// range-bounded column.
    pub prefix_len: usize,
    /// Conditions retained as post-scan filters.
    pub residual: Vec<IndexCondition>,
}

impl IndexAccess {
    fn contradiction(index: &IndexDef) -> Self {
        Self {
            index_name: index.name.clone(),
            columns: index.columns.iter().cloned().map(ColumnBounds::new).collect(),
            always_false: true,
            prefix_len: 0,
            residual: Vec::new(),
        }
    }

    /// Scores this access for candidate ranking.
    ///
    /// An always-false access outranks everything: the scan is empty.
    /// Otherwise equality constraints score highest, IN sets nearly as
    /// high (a list above a lazy subquery), and each range bound adds a
    /// smaller amount.
    pub fn score(&self) -> usize {
        if self.always_false {
            return usize::MAX;
        }
        let mut score = 0;
        for bounds in &self.columns {
            if !bounds.equalities.is_empty() {
                score += 10;
            }
            match &bounds.in_set {
                Some(InSource::List(_)) => score += 9,
                Some(InSource::Query(_)) => score += 8,
                None => {}
            }
            if bounds.lower.is_some() {
                score += 5;
            }
            if bounds.upper.is_some() {
                score += 5;
            }
        }
        score
    }
}

/// Folds the conditions of one planning decision into an access summary
/// for the given candidate index.
///
/// Conditions on columns outside the index, conditions that cannot be
/// evaluated yet, and IN conditions downgraded by the peer rule are kept
/// as residual filters. Contradictions (two different equality values, a
/// NULL-comparing scalar, an empty IN intersection) collapse the whole
/// access to always-false.
pub fn fold_conditions(
    session: &Session,
    index: &IndexDef,
    conditions: &[IndexCondition],
) -> Result<IndexAccess> {
    let mode = session.database().compare_mode();

    if conditions.iter().any(IndexCondition::is_always_false) {
        debug!(index = %index.name, "always-false condition; access is empty");
        return Ok(IndexAccess::contradiction(index));
    }

    let mut columns: Vec<ColumnBounds> = index
        .columns
        .iter()
        .cloned()
        .map(ColumnBounds::new)
        .collect();
    let mut residual: Vec<IndexCondition> = Vec::new();
    let mut buckets: Vec<Vec<&IndexCondition>> = vec![Vec::new(); index.columns.len()];

    for condition in conditions {
        let Some(column) = condition.column() else {
            continue;
        };
        let Some(pos) = index.position_of(column) else {
            residual.push(condition.clone());
            continue;
        };
        if !condition.is_evaluatable() {
            debug!(condition = %condition.sql(), "not evaluatable; kept as residual filter");
            residual.push(condition.clone());
            continue;
        }
        if condition.mask(conditions) == 0 {
            debug!(
                condition = %condition.sql(),
                table = column.table().name(),
                "IN condition unusable for index access; kept as residual filter"
            );
            residual.push(condition.clone());
            continue;
        }
        buckets[pos].push(condition);
    }

    for (pos, bucket) in buckets.iter().enumerate() {
        let column = &index.columns[pos];
        let bounds = &mut columns[pos];
        let mut in_lists: Vec<Vec<Value>> = Vec::new();
        let mut in_queries: Vec<(SubqueryRef, IndexCondition)> = Vec::new();

        for condition in bucket {
            bounds.mask |= condition.mask(conditions);
            match condition {
                IndexCondition::Scalar { op, .. } => {
                    let value = column.convert(condition.current_value(session)?)?;
                    if value.is_null() && *op != ScalarOp::EqualNullSafe {
                        debug!(condition = %condition.sql(), "comparison with NULL never holds");
                        return Ok(IndexAccess::contradiction(index));
                    }
                    match op {
                        ScalarOp::Equal | ScalarOp::EqualNullSafe => {
                            let duplicate = bounds
                                .equalities
                                .iter()
                                .any(|e| e.compare_in(&value, mode) == Ordering::Equal);
                            if duplicate {
                                continue;
                            }
                            if bounds.equalities.is_empty() {
                                bounds.equalities.push(value);
                            } else {
                                debug!(
                                    column = column.name(),
                                    "contradictory equality constraints"
                                );
                                return Ok(IndexAccess::contradiction(index));
                            }
                        }
                        ScalarOp::Bigger | ScalarOp::BiggerEqual => {
                            let inclusive = *op == ScalarOp::BiggerEqual;
                            tighten_lower(&mut bounds.lower, value, inclusive, mode);
                        }
                        ScalarOp::Smaller | ScalarOp::SmallerEqual => {
                            let inclusive = *op == ScalarOp::SmallerEqual;
                            tighten_upper(&mut bounds.upper, value, inclusive, mode);
                        }
                    }
                }
                IndexCondition::InList { .. } => {
                    in_lists.push(condition.current_value_list(session)?);
                }
                IndexCondition::InQuery { query, .. } => {
                    in_queries.push((query.clone(), (*condition).clone()));
                }
                IndexCondition::False => {}
            }
        }

        if in_lists.is_empty() {
            let mut in_queries = in_queries.into_iter();
            if let Some((query, _)) = in_queries.next() {
                bounds.in_set = Some(InSource::Query(query));
            }
            for (_, displaced) in in_queries {
                debug!(condition = %displaced.sql(), "second IN subquery; kept as residual filter");
                residual.push(displaced);
            }
        } else {
            for (_, displaced) in in_queries {
                debug!(condition = %displaced.sql(), "IN list preferred; kept as residual filter");
                residual.push(displaced);
            }
            let mut set: Option<Vec<Value>> = None;
            for list in in_lists {
                set = Some(match set {
                    None => list,
                    Some(previous) => intersect_sorted(&previous, &list, mode),
                });
            }
            match set {
                Some(set) if set.is_empty() => {
                    debug!(column = column.name(), "empty IN intersection");
                    return Ok(IndexAccess::contradiction(index));
                }
                Some(set) => bounds.in_set = Some(InSource::List(set)),
                None => {}
            }
        }
    }

    let prefix_len = usable_prefix(&columns);

    Ok(IndexAccess {
        index_name: index.name.clone(),
        columns,
        always_false: false,
        prefix_len,
        residual,
    })
}

/// Selects the best access among the folded candidates.
///
/// Returns the candidate with the highest score, breaking ties by fewest
/// residual conditions, then fewest index columns.
pub fn select_best_access(candidates: &[IndexAccess]) -> Option<&IndexAccess> {
    let max_score = candidates.iter().map(IndexAccess::score).max()?;
    let best = candidates
        .iter()
        .filter(|c| c.score() == max_score)
        .min_by_key(|c| (c.residual.len(), c.columns.len()))?;
    debug!(index = %best.index_name, score = max_score, "selected index access");
    Some(best)
}

/// Longest run of leading equality columns, extended by at most one
/// range-bounded column.
fn usable_prefix(columns: &[ColumnBounds]) -> usize {
    let mut prefix = 0;
    for bounds in columns {
        if bounds.is_equality() {
            prefix += 1;
        } else {
            break;
        }
    }
    if prefix < columns.len() && columns[prefix].mask & IndexCondition::RANGE != 0 {
        prefix += 1;
    }
    prefix
}

fn tighten_lower(
    slot: &mut Option<(Value, bool)>,
    value: Value,
    inclusive: bool,
    mode: &CompareMode,
) {
    *slot = Some(match slot.take() {
        None => (value, inclusive),
        Some((current, current_inclusive)) => match value.compare_in(&current, mode) {
            Ordering::Greater => (value, inclusive),
            // Same bound value: exclusive is tighter.
            Ordering::Equal => (current, current_inclusive && inclusive),
            Ordering::Less => (current, current_inclusive),
        },
    });
}

fn tighten_upper(
    slot: &mut Option<(Value, bool)>,
    value: Value,
    inclusive: bool,
    mode: &CompareMode,
) {
    *slot = Some(match slot.take() {
        None => (value, inclusive),
        Some((current, current_inclusive)) => match value.compare_in(&current, mode) {
            Ordering::Less => (value, inclusive),
            // Same bound value: exclusive is tighter.
            Ordering::Equal => (current, current_inclusive && inclusive),
            Ordering::Greater => (current, current_inclusive),
        },
    });
}

/// Intersects two sorted distinct value lists with a merge walk.
fn intersect_sorted(a: &[Value], b: &[Value], mode: &CompareMode) -> Vec<Value> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].compare_in(&b[j], mode) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out
}
