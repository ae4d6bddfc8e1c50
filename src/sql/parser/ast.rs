use std::fmt::Display;

use crate::error::{Error, Result};

use super::lexer::Token;

/// General class of a statement, inferred from its leading words
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatementType {
    CreateDatabase,
    DropDatabase,
    UseDatabase,
    CreateTable,
    AlterTable,
    DropTable,
    Select,
    SelectInner,
    SelectLeft,
    Insert,
    Update,
    Delete,
    Begin,
    Commit,
}

/// Semantic role of a token within its statement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Role {
    DatabaseName,
    TableName,
    TableAlias,
    /// Table name or alias qualifying a join column (`E` in `E.id`)
    Qualifier,
    ColName,
    ColType,
    AddCol,
    All,
    From,
    Into,
    Values,
    Value,
    Set,
    Where,
    Join,
    On,
    Equals,
    NotEquals,
    GreaterThan,
    ColValue,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::DatabaseName => "DATABASE_NAME",
            Role::TableName => "TABLE_NAME",
            Role::TableAlias => "TABLE_ALIAS",
            Role::Qualifier => "QUALIFIER",
            Role::ColName => "COL_NAME",
            Role::ColType => "COL_TYPE",
            Role::AddCol => "ADD_COL",
            Role::All => "ALL",
            Role::From => "FROM",
            Role::Into => "INTO",
            Role::Values => "VALUES",
            Role::Value => "VALUE",
            Role::Set => "SET",
            Role::Where => "WHERE",
            Role::Join => "JOIN",
            Role::On => "ON",
            Role::Equals => "EQUALS",
            Role::NotEquals => "NOT_EQUALS",
            Role::GreaterThan => "GREATER_THAN",
            Role::ColValue => "COL_VALUE",
        })
    }
}

/// A tokenized statement; `kind` and token roles are filled in by the parser
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub tokens: Vec<Token>,
    pub kind: Option<StatementType>,
}

impl Statement {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, kind: None }
    }

    /// Returns the text of the n-th (zero-based) token carrying the role
    pub fn nth(&self, role: Role, n: usize) -> Result<&str> {
        self.tokens
            .iter()
            .filter(|t| t.role == Some(role))
            .nth(n)
            .map(|t| t.text.as_str())
            .ok_or_else(|| {
                Error::Parse(format!(
                    "expected {} {}",
                    match n {
                        0 => "a",
                        1 => "a second",
                        2 => "a third",
                        _ => "another",
                    },
                    role
                ))
            })
    }

    pub fn first(&self, role: Role) -> Result<&str> {
        self.nth(role, 0)
    }

    pub fn second(&self, role: Role) -> Result<&str> {
        self.nth(role, 1)
    }

    pub fn third(&self, role: Role) -> Result<&str> {
        self.nth(role, 2)
    }

    /// Returns the texts of every token carrying the role, in order
    pub fn all(&self, role: Role) -> Vec<&str> {
        self.tokens
            .iter()
            .filter(|t| t.role == Some(role))
            .map(|t| t.text.as_str())
            .collect()
    }

    /// Returns the role of the first token carrying any of the given roles
    pub fn find(&self, roles: &[Role]) -> Option<Role> {
        self.tokens
            .iter()
            .filter_map(|t| t.role)
            .find(|r| roles.contains(r))
    }
}
