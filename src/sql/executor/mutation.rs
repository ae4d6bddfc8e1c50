use crate::{
    error::Result,
    sql::{
        executor::ResultSet,
        schema::{ColumnDef, Set},
        types::{AlterMethod, Filter, Record},
    },
};

/// INSERT executor
pub struct Insert {
    values: Record,
}

impl Insert {
    pub fn new(values: Record) -> Self {
        Self { values }
    }

    /// Appends the record as is: arity and types are not checked
    pub fn execute(self, set: &mut Set) -> Result<ResultSet> {
        set.records.push(self.values);
        Ok(ResultSet::Insert { count: 1 })
    }
}

/// UPDATE executor: `SET column = value WHERE filter`
pub struct Update {
    filter: Filter,
    column: String,
    value: String,
}

impl Update {
    pub fn new(filter: Filter, column: String, value: String) -> Self {
        Self { filter, column, value }
    }

    /// Rewrites the target field of every record whose where-column matches
    ///
    /// Only the field at the where-column's offset is tested; the same value
    /// appearing in another column does not select the record.
    pub fn execute(self, set: &mut Set) -> Result<ResultSet> {
        let where_index = set.get_col_index(&self.filter.column)?;
        let to_index = set.get_col_index(&self.column)?;

        let mut selected = Vec::new();
        for (i, record) in set.records.iter().enumerate() {
            if self.filter.matches(Set::field(record, where_index))? {
                selected.push(i);
            }
        }

        for &i in &selected {
            let record = &mut set.records[i];
            if record.len() <= to_index {
                record.resize(to_index + 1, String::new());
            }
            record[to_index] = self.value.clone();
        }
        Ok(ResultSet::Update { count: selected.len() })
    }
}

/// DELETE executor
pub struct Delete {
    filter: Filter,
}

impl Delete {
    pub fn new(filter: Filter) -> Self {
        Self { filter }
    }

    /// Removes every record whose where-column matches the filter
    ///
    /// Every record is tested before any is removed, so a comparison error
    /// leaves the set untouched.
    pub fn execute(self, set: &mut Set) -> Result<ResultSet> {
        let index = set.get_col_index(&self.filter.column)?;
        let keep = set
            .records
            .iter()
            .map(|r| self.filter.matches(Set::field(r, index)).map(|m| !m))
            .collect::<Result<Vec<_>>>()?;

        let before = set.records.len();
        let mut keep = keep.into_iter();
        set.records.retain(|_| keep.next().unwrap_or(true));
        Ok(ResultSet::Delete { count: before - set.records.len() })
    }
}

/// ALTER TABLE executor
pub struct AlterTable {
    method: AlterMethod,
    column: ColumnDef,
}

impl AlterTable {
    pub fn new(method: AlterMethod, column: ColumnDef) -> Self {
        Self { method, column }
    }

    /// Adds the column to the schema and backfills existing records with an
    /// empty field so record arity keeps matching the schema
    pub fn execute(self, set: &mut Set) -> Result<ResultSet> {
        match self.method {
            AlterMethod::Add => {
                let width = set.columns.len();
                set.columns.push(self.column);
                for record in set.records.iter_mut() {
                    if record.len() <= width {
                        record.resize(width + 1, String::new());
                    }
                }
            }
        }
        Ok(ResultSet::AlterTable { table_name: set.name.clone() })
    }
}
