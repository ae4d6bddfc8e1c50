use std::fmt::Display;

use crate::{
    error::{Error, Result},
    sql::types::Record,
};

/// Field separator within a schema line or a record line
pub const FIELD_SEPARATOR: char = '|';

/// Column definition: a name and a free-form type string
///
/// The type is stored and echoed back, never checked against values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub datatype: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
        }
    }

    /// Parses a `"name type"` schema entry
    pub fn decode(text: &str) -> Result<Self> {
        let text = text.trim();
        match text.split_once(char::is_whitespace) {
            Some((name, datatype)) => Ok(Self::new(name, datatype.trim())),
            None if !text.is_empty() => Ok(Self::new(text, "")),
            None => Err(Error::Internal("empty column definition".into())),
        }
    }
}

impl Display for ColumnDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.datatype)
    }
}

/// In-memory projection of a table: schema plus every record
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub records: Vec<Record>,
}

impl Set {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
            records: Vec::new(),
        }
    }

    /// Decodes a table file: schema line first, then one record per line
    ///
    /// Fields are kept verbatim so that re-encoding an untouched record
    /// reproduces its bytes. Every line after the schema is a record, blank
    /// ones included; only the terminating newline is dropped.
    pub fn decode(name: impl Into<String>, content: &str) -> Result<Self> {
        let name = name.into();
        let content = content.strip_suffix('\n').unwrap_or(content);
        let mut lines = content.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
        let schema = lines
            .next()
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| Error::Internal(format!("table {} has no schema", name)))?;

        let columns = schema
            .split(FIELD_SEPARATOR)
            .map(ColumnDef::decode)
            .collect::<Result<Vec<_>>>()?;

        let records = lines
            .map(|l| l.split(FIELD_SEPARATOR).map(|f| f.to_string()).collect())
            .collect();

        Ok(Self { name, columns, records })
    }

    /// Encodes the set back into table file contents
    pub fn encode(&self) -> String {
        let mut content = Self::encode_schema(&self.columns);
        content.push('\n');
        for record in &self.records {
            content.push_str(&Self::encode_record(record));
            content.push('\n');
        }
        content
    }

    pub fn encode_schema(columns: &[ColumnDef]) -> String {
        columns
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(&FIELD_SEPARATOR.to_string())
    }

    pub fn encode_record(record: &Record) -> String {
        record.join(&FIELD_SEPARATOR.to_string())
    }

    /// Returns the column index for a given column name (case-insensitive)
    pub fn get_col_index(&self, col_name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(col_name.trim()))
            .ok_or_else(|| {
                Error::Precondition(format!(
                    "Failed to query table {} because column {} does not exist.",
                    self.name, col_name
                ))
            })
    }

    /// Reads a field, treating fields missing from a short record as empty
    pub fn field(record: &Record, index: usize) -> &str {
        record.get(index).map(|f| f.as_str()).unwrap_or("")
    }
}

impl Display for Set {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let content = self.encode();
        f.write_str(content.strip_suffix('\n').unwrap_or(&content))
    }
}
