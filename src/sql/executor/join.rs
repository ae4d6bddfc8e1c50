use crate::{
    error::{Error, Result},
    sql::{executor::query::Scan, schema::Set},
};

use super::{Executor, ResultSet};

/// Nested Loop Join executor
///
/// Pairs every left record with every right record whose join field is
/// exactly equal. An outer join also keeps each unmatched left record,
/// padded with one empty field per right-side column.
pub struct NestedLoopJoin {
    left: Box<dyn Executor>,
    right: Box<dyn Executor>,
    left_col: String,
    right_col: String,
    outer: bool,
}

impl NestedLoopJoin {
    pub fn new(
        left: Box<dyn Executor>,
        right: Box<dyn Executor>,
        left_col: String,
        right_col: String,
        outer: bool,
    ) -> Box<Self> {
        Box::new(Self {
            left,
            right,
            left_col,
            right_col,
            outer,
        })
    }
}

impl Executor for NestedLoopJoin {
    fn execute(self: Box<Self>) -> Result<ResultSet> {
        let (ResultSet::Scan { set: left }, ResultSet::Scan { set: right }) =
            (self.left.execute()?, self.right.execute()?)
        else {
            return Err(Error::Internal("Unexpected result set".into()));
        };

        let lindex = left.get_col_index(&self.left_col)?;
        let rindex = right.get_col_index(&self.right_col)?;
        let lwidth = left.columns.len();
        let rwidth = right.columns.len();

        let name = if self.outer { "left-join" } else { "inner-join" };
        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());
        let mut joined = Set::new(name, columns);

        for lrow in &left.records {
            let key = Set::field(lrow, lindex);
            let mut lrow = lrow.clone();
            if lrow.len() < lwidth {
                lrow.resize(lwidth, String::new());
            }

            let mut matched = false;
            for rrow in &right.records {
                if Set::field(rrow, rindex) != key {
                    continue;
                }
                let mut row = lrow.clone();
                row.extend(rrow.iter().cloned());
                if row.len() < lwidth + rwidth {
                    row.resize(lwidth + rwidth, String::new());
                }
                joined.records.push(row);
                matched = true;
            }

            if self.outer && !matched {
                let mut row = lrow;
                row.resize(lwidth + rwidth, String::new());
                joined.records.push(row);
            }
        }

        Ok(ResultSet::Scan { set: joined })
    }
}

fn join(left: Set, right: Set, left_col: &str, right_col: &str, outer: bool) -> Result<Set> {
    let executor = NestedLoopJoin::new(
        Scan::new(left, None),
        Scan::new(right, None),
        left_col.to_string(),
        right_col.to_string(),
        outer,
    );
    match executor.execute()? {
        ResultSet::Scan { set } => Ok(set),
        _ => Err(Error::Internal("Unexpected result set".into())),
    }
}

/// Inner join of two sets on `left.left_col = right.right_col`
pub fn inner_join(left: Set, right: Set, left_col: &str, right_col: &str) -> Result<Set> {
    join(left, right, left_col, right_col, false)
}

/// Left outer join of two sets on `left.left_col = right.right_col`
pub fn left_join(left: Set, right: Set, left_col: &str, right_col: &str) -> Result<Set> {
    join(left, right, left_col, right_col, true)
}
