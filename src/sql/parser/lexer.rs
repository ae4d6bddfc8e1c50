//! SQL Lexer - Splits a raw statement into classified word tokens

use std::{collections::VecDeque, fmt::Display};

use super::ast::{Role, Statement};

/// Represents a single lexical token in the SQL input
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Original text of the word
    pub text: String,
    /// Semantic role, assigned by the parser
    pub role: Option<Role>,
}

/// General class of a token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// SQL reserved keyword
    Keyword(Keyword),
    /// Anything else: names, values, punctuation
    Special,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = Keyword::from_str(&text).map_or(TokenKind::Special, TokenKind::Keyword);
        Self { kind, text, role: None }
    }

    pub fn keyword(&self) -> Option<&Keyword> {
        match &self.kind {
            TokenKind::Keyword(keyword) => Some(keyword),
            TokenKind::Special => None,
        }
    }

    /// Case-insensitive comparison of the token text
    pub fn is(&self, text: &str) -> bool {
        self.text.eq_ignore_ascii_case(text)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// SQL reserved keywords
#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    Create,
    Drop,
    Use,
    Database,
    Table,
    Insert,
    Alter,
    Select,
    Delete,
    Update,
    Literal,
}

impl Keyword {
    /// Attempts to parse a string as a keyword (case-insensitive)
    pub fn from_str(ident: &str) -> Option<Keyword> {
        Some(match ident.to_uppercase().as_ref() {
            "CREATE" => Keyword::Create,
            "DROP" => Keyword::Drop,
            "USE" => Keyword::Use,
            "DATABASE" => Keyword::Database,
            "TABLE" => Keyword::Table,
            "INSERT" => Keyword::Insert,
            "ALTER" => Keyword::Alter,
            "SELECT" => Keyword::Select,
            "DELETE" => Keyword::Delete,
            "UPDATE" => Keyword::Update,
            "LITERAL" => Keyword::Literal,
            _ => return None,
        })
    }

    /// Returns the uppercase string representation of the keyword
    pub fn to_str(&self) -> &str {
        match self {
            Keyword::Create => "CREATE",
            Keyword::Drop => "DROP",
            Keyword::Use => "USE",
            Keyword::Database => "DATABASE",
            Keyword::Table => "TABLE",
            Keyword::Insert => "INSERT",
            Keyword::Alter => "ALTER",
            Keyword::Select => "SELECT",
            Keyword::Delete => "DELETE",
            Keyword::Update => "UPDATE",
            Keyword::Literal => "LITERAL",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Inline comment marker; it and everything after it is dropped
const COMMENT: &str = "--";

/// Maximum number of `.` qualifiers split apart in one statement
const MAX_QUALIFIERS: usize = 2;

/// SQL lexical analyzer (lexer/tokenizer)
pub struct Lexer {
    words: VecDeque<String>,
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.words.pop_front().map(Token::new)
    }
}

impl Lexer {
    /// Creates a new lexer for the given SQL text
    pub fn new(sql_text: &str) -> Self {
        Self {
            words: Self::normalize(sql_text)
                .split_whitespace()
                .map(|w| w.to_string())
                .collect(),
        }
    }

    /// Tokenizes the whole input into an untyped statement
    pub fn tokenize(self) -> Statement {
        Statement::new(self.collect())
    }

    /// Separates punctuation that would otherwise glue onto the next word
    fn normalize(sql_text: &str) -> String {
        let text = sql_text.split(COMMENT).next().unwrap_or_default();
        let text = text.trim().trim_end_matches(';');
        let text = text.replacen('(', " (", 1).replacen(',', ", ", 1);
        Self::split_qualifiers(&text)
    }

    /// Puts spaces around up to two `.` that join identifiers (`E.id`),
    /// leaving decimal literals such as `19.99` intact
    fn split_qualifiers(text: &str) -> String {
        let chars = text.chars().collect::<Vec<_>>();
        let mut out = String::with_capacity(text.len() + 4);
        let mut split = 0;
        for (i, &c) in chars.iter().enumerate() {
            let qualifier = c == '.'
                && split < MAX_QUALIFIERS
                && i > 0
                && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_')
                && !chars[..i]
                    .iter()
                    .rev()
                    .take_while(|c| c.is_alphanumeric() || **c == '_')
                    .all(|c| c.is_ascii_digit())
                && chars
                    .get(i + 1)
                    .is_some_and(|n| n.is_alphabetic() || *n == '_');
            if qualifier {
                out.push_str(" . ");
                split += 1;
            } else {
                out.push(c);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{Keyword, Lexer, Token, TokenKind};

    fn texts(sql: &str) -> Vec<String> {
        Lexer::new(sql).map(|t| t.text).collect()
    }

    #[test]
    fn test_lexer_create_table() {
        let tokens = Lexer::new("CREATE table tbl(id int, name varchar(20));").collect::<Vec<_>>();
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Create));
        assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::Table));
        assert_eq!(tokens[2], Token::new("tbl"));
        assert_eq!(tokens[2].kind, TokenKind::Special);
        assert_eq!(
            texts("CREATE table tbl(id int, name varchar(20));"),
            vec!["CREATE", "table", "tbl", "(id", "int,", "name", "varchar(20))"]
        );
    }

    #[test]
    fn test_lexer_insert_into() {
        assert_eq!(
            texts("insert into Product values(1,'Gizmo',  19.99);"),
            vec!["insert", "into", "Product", "values", "(1,", "'Gizmo',", "19.99)"]
        );
    }

    #[test]
    fn test_lexer_select() {
        assert_eq!(
            texts("select name,price from Product where pid != 2"),
            vec!["select", "name,", "price", "from", "Product", "where", "pid", "!=", "2"]
        );
    }

    #[test]
    fn test_lexer_qualifiers() {
        assert_eq!(
            texts("select * from Employee E, Sales S where E.id = S.employeeID"),
            vec![
                "select", "*", "from", "Employee", "E,", "Sales", "S", "where", "E", ".", "id",
                "=", "S", ".", "employeeID"
            ]
        );
        assert_eq!(
            texts("update t set price = 1.5 where name = a.b.c.d"),
            vec!["update", "t", "set", "price", "=", "1.5", "where", "name", "=", "a", ".", "b", ".", "c.d"]
        );
    }

    #[test]
    fn test_lexer_comment() {
        assert_eq!(texts("drop table t; -- gone"), vec!["drop", "table", "t"]);
        assert_eq!(texts("use db1--trailing"), vec!["use", "db1"]);
        assert!(texts("-- only a comment").is_empty());
    }

    #[test]
    fn test_lexer_keywords_case_insensitive() {
        let tokens = Lexer::new("sElEcT literal Values").collect::<Vec<_>>();
        assert_eq!(tokens[0].keyword(), Some(&Keyword::Select));
        assert_eq!(tokens[1].keyword(), Some(&Keyword::Literal));
        assert_eq!(tokens[2].keyword(), None);
        assert!(tokens[2].is("VALUES"));
    }
}
