use std::fmt::Display;

use crate::{error::Result, sql::schema::Set};

pub mod join;
pub mod mutation;
pub mod query;

/// Read-side executor over materialized table data
pub trait Executor {
    fn execute(self: Box<Self>) -> Result<ResultSet>;
}

/// Execution result of one operation
///
/// Its `Display` form is the fixed human-readable message shown to the user.
#[derive(Debug, PartialEq)]
pub enum ResultSet {
    CreateDatabase { name: String },
    DropDatabase { name: String },
    UseDatabase { name: String },
    CreateTable { table_name: String },
    DropTable { table_name: String },
    AlterTable { table_name: String },
    Insert { count: usize },
    Update { count: usize },
    Delete { count: usize },
    /// Raw table file contents (SELECT *)
    Raw { content: String },
    /// Projected, filtered or joined rows
    Scan { set: Set },
}

impl Display for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSet::CreateDatabase { name } => write!(f, "Database {} created.", name),
            ResultSet::DropDatabase { name } => write!(f, "Database {} deleted.", name),
            ResultSet::UseDatabase { name } => write!(f, "Using database {}.", name),
            ResultSet::CreateTable { table_name } => write!(f, "Table {} created.", table_name),
            ResultSet::DropTable { table_name } => write!(f, "Table {} deleted.", table_name),
            ResultSet::AlterTable { table_name } => write!(f, "Table {} modified.", table_name),
            ResultSet::Insert { count: 1 } => write!(f, "1 new record inserted."),
            ResultSet::Insert { count } => write!(f, "{} new records inserted.", count),
            ResultSet::Update { count } => write!(f, "{} record(s) modified.", count),
            ResultSet::Delete { count } => write!(f, "{} record(s) deleted.", count),
            ResultSet::Raw { content } => f.write_str(content.strip_suffix('\n').unwrap_or(content)),
            ResultSet::Scan { set } => write!(f, "{}", set),
        }
    }
}
