use crate::{
    error::{Error, Result},
    sql::{
        executor::ResultSet,
        schema::Set,
        types::Filter,
    },
};

use super::Executor;

/// Table scan executor: yields the records of a decoded table that pass the
/// optional filter
pub struct Scan {
    set: Set,
    filter: Option<Filter>,
}

impl Scan {
    pub fn new(set: Set, filter: Option<Filter>) -> Box<Self> {
        Box::new(Self { set, filter })
    }
}

impl Executor for Scan {
    fn execute(self: Box<Self>) -> Result<ResultSet> {
        let mut set = self.set;
        if let Some(filter) = self.filter {
            let index = set.get_col_index(&filter.column)?;
            let mut records = Vec::with_capacity(set.records.len());
            for record in set.records {
                if filter.matches(Set::field(&record, index))? {
                    records.push(record);
                }
            }
            set.records = records;
        }
        Ok(ResultSet::Scan { set })
    }
}

/// Projection executor: keeps only the named columns, in the given order
pub struct Projection {
    source: Box<dyn Executor>,
    columns: Vec<String>,
}

impl Projection {
    pub fn new(source: Box<dyn Executor>, columns: Vec<String>) -> Box<Self> {
        Box::new(Self { source, columns })
    }
}

impl Executor for Projection {
    fn execute(self: Box<Self>) -> Result<ResultSet> {
        match self.source.execute()? {
            ResultSet::Scan { set } => {
                let indexes = self
                    .columns
                    .iter()
                    .map(|c| set.get_col_index(c))
                    .collect::<Result<Vec<_>>>()?;

                let mut projected = Set::new(
                    set.name.clone(),
                    indexes.iter().map(|&i| set.columns[i].clone()).collect(),
                );
                projected.records = set
                    .records
                    .iter()
                    .map(|r| indexes.iter().map(|&i| Set::field(r, i).to_string()).collect())
                    .collect();
                Ok(ResultSet::Scan { set: projected })
            }
            _ => Err(Error::Internal("Unexpected result set".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Projection, Scan};
    use crate::{
        error::{Error, Result},
        sql::{
            executor::{Executor, ResultSet},
            schema::Set,
            types::{Comparator, Filter},
        },
    };

    fn product() -> Result<Set> {
        Set::decode(
            "Product",
            "pid int|name varchar(20)|price float\n\
             1|Gizmo|19.99\n\
             2|PowerGizmo|29.99\n\
             3|SingleTouch|149.99\n",
        )
    }

    fn rows(result: ResultSet) -> Result<Set> {
        match result {
            ResultSet::Scan { set } => Ok(set),
            _ => Err(Error::Internal("Unexpected result set".into())),
        }
    }

    #[test]
    fn test_scan_without_filter() -> Result<()> {
        let set = rows(Scan::new(product()?, None).execute()?)?;
        assert_eq!(set, product()?);
        Ok(())
    }

    #[test]
    fn test_scan_filter() -> Result<()> {
        let filter = Filter::new("pid", Comparator::NotEquals, "2");
        let set = rows(Scan::new(product()?, Some(filter)).execute()?)?;
        let pids = set.records.iter().map(|r| r[0].as_str()).collect::<Vec<_>>();
        assert_eq!(pids, vec!["1", "3"]);

        let filter = Filter::new("price", Comparator::GreaterThan, "20");
        let set = rows(Scan::new(product()?, Some(filter)).execute()?)?;
        assert_eq!(set.records.len(), 2);
        Ok(())
    }

    #[test]
    fn test_scan_unknown_column() -> Result<()> {
        let filter = Filter::new("color", Comparator::Equals, "red");
        let result = Scan::new(product()?, Some(filter)).execute();
        assert!(matches!(result, Err(Error::Precondition(_))));
        Ok(())
    }

    #[test]
    fn test_projection() -> Result<()> {
        let filter = Filter::new("pid", Comparator::NotEquals, "2");
        let scan = Scan::new(product()?, Some(filter));
        let result = Projection::new(scan, vec!["price".into(), "NAME".into()]).execute()?;
        assert_eq!(
            result.to_string(),
            "price float|name varchar(20)\n19.99|Gizmo\n149.99|SingleTouch"
        );
        Ok(())
    }
}
