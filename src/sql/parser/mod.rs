use crate::sql::parser::ast::{Role, Statement, StatementType};
use crate::sql::parser::lexer::{Keyword, Lexer, Token};

pub mod ast;
pub mod lexer;

/// One step of positional role assignment
///
/// Indices past the end of the statement are skipped, so short input just
/// leaves roles unassigned; the generator reports the missing role.
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Assign the role to the token at the index
    Fixed(usize, Role),
    /// Assign the role if the token text matches, continue either way
    Optional(usize, &'static str, Role),
    /// Assign the role if the token text matches, otherwise stop
    Expect(usize, &'static str, Role),
    /// Assign the role of the first matching text, otherwise stop
    Choice(usize, &'static [(&'static str, Role)]),
    /// Cycle through the roles from the index to the end of the statement
    Cycle(usize, &'static [Role]),
}

use Rule::*;

const WHERE_COMPARATORS: &[(&str, Role)] = &[
    ("!=", Role::NotEquals),
    ("=", Role::Equals),
    (">", Role::GreaterThan),
];

const DELETE_COMPARATORS: &[(&str, Role)] = &[("=", Role::Equals), (">", Role::GreaterThan)];

const DATABASE: &[Rule] = &[Fixed(2, Role::DatabaseName)];

const USE_DATABASE: &[Rule] = &[Fixed(1, Role::DatabaseName)];

const CREATE_TABLE: &[Rule] = &[
    Fixed(2, Role::TableName),
    Cycle(3, &[Role::ColName, Role::ColType]),
];

const DROP_TABLE: &[Rule] = &[Fixed(2, Role::TableName)];

// ALTER TABLE t ADD col type
const ALTER_TABLE: &[Rule] = &[
    Fixed(2, Role::TableName),
    Expect(3, "add", Role::AddCol),
    Fixed(4, Role::ColName),
    Fixed(5, Role::ColType),
];

// SELECT * FROM t
const SELECT_ALL: &[Rule] = &[
    Expect(1, "*", Role::All),
    Expect(2, "from", Role::From),
    Fixed(3, Role::TableName),
];

// SELECT a, b FROM t WHERE c != v
const SELECT_COLUMNS: &[Rule] = &[
    Fixed(1, Role::ColName),
    Fixed(2, Role::ColName),
    Expect(3, "from", Role::From),
    Fixed(4, Role::TableName),
    Expect(5, "where", Role::Where),
    Fixed(6, Role::ColName),
    Choice(7, WHERE_COMPARATORS),
    Fixed(8, Role::ColValue),
];

// SELECT * FROM A a, B b WHERE a . x = b . y
const SELECT_INNER_COMMA: &[Rule] = &[
    Expect(1, "*", Role::All),
    Expect(2, "from", Role::From),
    Fixed(3, Role::TableName),
    Fixed(4, Role::TableAlias),
    Fixed(5, Role::TableName),
    Fixed(6, Role::TableAlias),
    Expect(7, "where", Role::Where),
    Fixed(8, Role::Qualifier),
    Fixed(10, Role::ColName),
    Expect(11, "=", Role::Equals),
    Fixed(12, Role::Qualifier),
    Fixed(14, Role::ColName),
];

// SELECT * FROM A a INNER JOIN B b ON a . x = b . y
const SELECT_INNER_JOIN: &[Rule] = &[
    Expect(1, "*", Role::All),
    Expect(2, "from", Role::From),
    Fixed(3, Role::TableName),
    Fixed(4, Role::TableAlias),
    Expect(5, "inner", Role::Join),
    Expect(6, "join", Role::Join),
    Fixed(7, Role::TableName),
    Fixed(8, Role::TableAlias),
    Expect(9, "on", Role::On),
    Fixed(10, Role::Qualifier),
    Fixed(12, Role::ColName),
    Expect(13, "=", Role::Equals),
    Fixed(14, Role::Qualifier),
    Fixed(16, Role::ColName),
];

// SELECT * FROM A a LEFT JOIN B b ON a . x = b . y
const SELECT_LEFT_JOIN: &[Rule] = &[
    Expect(1, "*", Role::All),
    Expect(2, "from", Role::From),
    Fixed(3, Role::TableName),
    Fixed(4, Role::TableAlias),
    Expect(5, "left", Role::Join),
    Expect(6, "join", Role::Join),
    Fixed(7, Role::TableName),
    Fixed(8, Role::TableAlias),
    Expect(9, "on", Role::On),
    Fixed(10, Role::Qualifier),
    Fixed(12, Role::ColName),
    Expect(13, "=", Role::Equals),
    Fixed(14, Role::Qualifier),
    Fixed(16, Role::ColName),
];

// SELECT * FROM A a LEFT OUTER JOIN B b ON a . x = b . y
const SELECT_LEFT_OUTER_JOIN: &[Rule] = &[
    Expect(1, "*", Role::All),
    Expect(2, "from", Role::From),
    Fixed(3, Role::TableName),
    Fixed(4, Role::TableAlias),
    Expect(5, "left", Role::Join),
    Expect(6, "outer", Role::Join),
    Expect(7, "join", Role::Join),
    Fixed(8, Role::TableName),
    Fixed(9, Role::TableAlias),
    Expect(10, "on", Role::On),
    Fixed(11, Role::Qualifier),
    Fixed(13, Role::ColName),
    Expect(14, "=", Role::Equals),
    Fixed(15, Role::Qualifier),
    Fixed(17, Role::ColName),
];

// INSERT INTO t VALUES (v, ...)
const INSERT: &[Rule] = &[
    Optional(1, "into", Role::Into),
    Fixed(2, Role::TableName),
    Expect(3, "values", Role::Values),
    Cycle(4, &[Role::Value]),
];

// UPDATE t SET c = v WHERE c = v
const UPDATE: &[Rule] = &[
    Fixed(1, Role::TableName),
    Expect(2, "set", Role::Set),
    Fixed(3, Role::ColName),
    Expect(4, "=", Role::Equals),
    Fixed(5, Role::ColValue),
    Expect(6, "where", Role::Where),
    Fixed(7, Role::ColName),
    Expect(8, "=", Role::Equals),
    Fixed(9, Role::ColValue),
];

// DELETE FROM t WHERE c (=|>) v
const DELETE: &[Rule] = &[
    Expect(1, "from", Role::From),
    Fixed(2, Role::TableName),
    Expect(3, "where", Role::Where),
    Fixed(4, Role::ColName),
    Choice(5, DELETE_COMPARATORS),
    Fixed(6, Role::ColValue),
];

/// SQL Parser - Infers the statement type and tags tokens with their roles
///
/// The grammar is positional: each statement shape has one canonical token
/// layout, described by a static rule list. Parsing never fails; anything
/// unrecognized leaves the type or the roles unset.
pub struct Parser {
    statement: Statement,
}

impl Parser {
    /// Creates a new parser for the given SQL input
    pub fn new(input: &str) -> Self {
        Parser {
            statement: Lexer::new(input).tokenize(),
        }
    }

    /// Creates a parser for an already tokenized statement
    pub fn from_statement(statement: Statement) -> Self {
        Parser { statement }
    }

    /// Parses the statement: sets its type and assigns token roles
    pub fn parse(self) -> Statement {
        let mut statement = self.statement;
        statement.kind = Self::infer_type(&statement.tokens);
        if let Some(kind) = statement.kind {
            let rules = Self::rules(kind, &statement.tokens);
            Self::assign_roles(&mut statement.tokens, rules);
        }
        statement
    }

    /// Infers a statement's type from how it begins
    fn infer_type(tokens: &[Token]) -> Option<StatementType> {
        let first = tokens.first()?;
        if first.is("begin") {
            return Some(StatementType::Begin);
        }
        if first.is("commit") {
            return Some(StatementType::Commit);
        }
        let second = tokens.get(1)?;

        Some(match (first.keyword()?, second.keyword()) {
            (Keyword::Create, Some(Keyword::Database)) => StatementType::CreateDatabase,
            (Keyword::Drop, Some(Keyword::Database)) => StatementType::DropDatabase,
            (Keyword::Use, _) => StatementType::UseDatabase,
            (Keyword::Create, Some(Keyword::Table)) => StatementType::CreateTable,
            (Keyword::Drop, Some(Keyword::Table)) => StatementType::DropTable,
            (Keyword::Alter, Some(Keyword::Table)) => StatementType::AlterTable,
            (Keyword::Insert, _) => StatementType::Insert,
            (Keyword::Select, _) => Self::infer_select(tokens),
            (Keyword::Update, _) => StatementType::Update,
            (Keyword::Delete, _) => StatementType::Delete,
            _ => return None,
        })
    }

    /// Distinguishes plain selects from the two join forms
    fn infer_select(tokens: &[Token]) -> StatementType {
        let at = |i: usize, text: &str| tokens.get(i).is_some_and(|t| t.is(text));
        if !at(1, "*") {
            return StatementType::Select;
        }
        if at(5, "inner") || tokens.get(4).is_some_and(|t| t.text.ends_with(',')) {
            StatementType::SelectInner
        } else if at(5, "left") {
            StatementType::SelectLeft
        } else {
            StatementType::Select
        }
    }

    /// Picks the rule list for a statement type and shape
    fn rules(kind: StatementType, tokens: &[Token]) -> &'static [Rule] {
        let at = |i: usize, text: &str| tokens.get(i).is_some_and(|t| t.is(text));
        match kind {
            StatementType::CreateDatabase | StatementType::DropDatabase => DATABASE,
            StatementType::UseDatabase => USE_DATABASE,
            StatementType::CreateTable => CREATE_TABLE,
            StatementType::DropTable => DROP_TABLE,
            StatementType::AlterTable => ALTER_TABLE,
            StatementType::Select if at(1, "*") => SELECT_ALL,
            StatementType::Select => SELECT_COLUMNS,
            StatementType::SelectInner if at(5, "inner") => SELECT_INNER_JOIN,
            StatementType::SelectInner => SELECT_INNER_COMMA,
            StatementType::SelectLeft if at(6, "outer") => SELECT_LEFT_OUTER_JOIN,
            StatementType::SelectLeft => SELECT_LEFT_JOIN,
            StatementType::Insert => INSERT,
            StatementType::Update => UPDATE,
            StatementType::Delete => DELETE,
            StatementType::Begin | StatementType::Commit => &[],
        }
    }

    /// Walks the rules in order, tagging tokens
    fn assign_roles(tokens: &mut [Token], rules: &[Rule]) {
        for rule in rules {
            match *rule {
                Fixed(i, role) => {
                    if let Some(token) = tokens.get_mut(i) {
                        token.role = Some(role);
                    }
                }
                Optional(i, text, role) => {
                    if let Some(token) = tokens.get_mut(i).filter(|t| t.is(text)) {
                        token.role = Some(role);
                    }
                }
                Expect(i, text, role) => match tokens.get_mut(i) {
                    Some(token) if token.is(text) => token.role = Some(role),
                    _ => return,
                },
                Choice(i, choices) => {
                    let Some(token) = tokens.get_mut(i) else {
                        return;
                    };
                    match choices.iter().find(|(text, _)| token.is(text)) {
                        Some((_, role)) => token.role = Some(*role),
                        None => return,
                    }
                }
                Cycle(start, roles) => {
                    for (i, token) in tokens.iter_mut().enumerate().skip(start) {
                        token.role = Some(roles[(i - start) % roles.len()]);
                    }
                }
            }
        }
    }
}

/// Parses a tokenized statement
pub fn parse(statement: Statement) -> Statement {
    Parser::from_statement(statement).parse()
}

#[cfg(test)]
mod tests {
    use super::{Parser, parse};
    use crate::{
        error::{Error, Result},
        sql::parser::{
            ast::{Role, StatementType},
            lexer::Lexer,
        },
    };

    #[test]
    fn test_parser_create_table() -> Result<()> {
        let stmt = Parser::new("CREATE TABLE Product (pid int, name varchar(20), price float);").parse();
        assert_eq!(stmt.kind, Some(StatementType::CreateTable));
        assert_eq!(stmt.first(Role::TableName)?, "Product");
        assert_eq!(stmt.all(Role::ColName), vec!["(pid", "name", "price"]);
        assert_eq!(stmt.all(Role::ColType), vec!["int,", "varchar(20),", "float)"]);
        Ok(())
    }

    #[test]
    fn test_parser_database() -> Result<()> {
        let stmt = Parser::new("create database db_1").parse();
        assert_eq!(stmt.kind, Some(StatementType::CreateDatabase));
        assert_eq!(stmt.first(Role::DatabaseName)?, "db_1");

        let stmt = Parser::new("DROP DATABASE db_1;").parse();
        assert_eq!(stmt.kind, Some(StatementType::DropDatabase));
        assert_eq!(stmt.first(Role::DatabaseName)?, "db_1");

        let stmt = Parser::new("USE db_1;").parse();
        assert_eq!(stmt.kind, Some(StatementType::UseDatabase));
        assert_eq!(stmt.first(Role::DatabaseName)?, "db_1");

        let stmt = Parser::new("drop table t").parse();
        assert_eq!(stmt.kind, Some(StatementType::DropTable));
        assert_eq!(stmt.first(Role::TableName)?, "t");
        Ok(())
    }

    #[test]
    fn test_parser_alter() -> Result<()> {
        let stmt = Parser::new("ALTER TABLE Product ADD mpg float;").parse();
        assert_eq!(stmt.kind, Some(StatementType::AlterTable));
        assert_eq!(stmt.first(Role::AddCol)?, "ADD");
        assert_eq!(stmt.first(Role::ColName)?, "mpg");
        assert_eq!(stmt.first(Role::ColType)?, "float");

        let stmt = Parser::new("ALTER TABLE Product DROP mpg;").parse();
        assert!(stmt.first(Role::AddCol).is_err());
        assert!(stmt.first(Role::ColName).is_err());
        Ok(())
    }

    #[test]
    fn test_parser_select() -> Result<()> {
        let stmt = Parser::new("select * from Product;").parse();
        assert_eq!(stmt.kind, Some(StatementType::Select));
        assert_eq!(stmt.first(Role::All)?, "*");
        assert_eq!(stmt.first(Role::TableName)?, "Product");

        let stmt = Parser::new("select name, price from Product where pid != 2;").parse();
        assert_eq!(stmt.kind, Some(StatementType::Select));
        assert_eq!(stmt.all(Role::ColName), vec!["name,", "price", "pid"]);
        assert_eq!(stmt.first(Role::TableName)?, "Product");
        assert_eq!(stmt.first(Role::NotEquals)?, "!=");
        assert_eq!(stmt.first(Role::ColValue)?, "2");

        let stmt = Parser::new("select name, price from Product").parse();
        assert_eq!(stmt.all(Role::ColName).len(), 2);
        assert!(stmt.first(Role::Where).is_err());
        Ok(())
    }

    #[test]
    fn test_parser_insert() -> Result<()> {
        let stmt = Parser::new("insert into Product values(1, 'Gizmo', 19.99);").parse();
        assert_eq!(stmt.kind, Some(StatementType::Insert));
        assert_eq!(stmt.first(Role::TableName)?, "Product");
        assert_eq!(stmt.all(Role::Value), vec!["(1,", "'Gizmo',", "19.99)"]);
        Ok(())
    }

    #[test]
    fn test_parser_update() -> Result<()> {
        let stmt = Parser::new("update Product set name = 'Gizmo' where name = 'SuperGizmo';").parse();
        assert_eq!(stmt.kind, Some(StatementType::Update));
        assert_eq!(stmt.first(Role::TableName)?, "Product");
        assert_eq!(stmt.first(Role::ColName)?, "name");
        assert_eq!(stmt.first(Role::ColValue)?, "'Gizmo'");
        assert_eq!(stmt.second(Role::ColName)?, "name");
        assert_eq!(stmt.second(Role::ColValue)?, "'SuperGizmo'");
        Ok(())
    }

    #[test]
    fn test_parser_delete_comparators() -> Result<()> {
        let stmt = Parser::new("delete from Product where name = 'Gizmo';").parse();
        assert_eq!(stmt.kind, Some(StatementType::Delete));
        assert_eq!(stmt.find(&[Role::Equals, Role::GreaterThan]), Some(Role::Equals));
        assert_eq!(stmt.first(Role::ColValue)?, "'Gizmo'");

        let stmt = Parser::new("delete from Product where price > 150;").parse();
        assert_eq!(stmt.find(&[Role::Equals, Role::GreaterThan]), Some(Role::GreaterThan));

        let stmt = Parser::new("delete from Product where price < 150;").parse();
        assert_eq!(stmt.find(&[Role::Equals, Role::GreaterThan]), None);
        assert!(stmt.first(Role::ColValue).is_err());
        Ok(())
    }

    #[test]
    fn test_parser_joins() -> Result<()> {
        let stmt = Parser::new("select * from Employee E, Sales S where E.id = S.employeeID;").parse();
        assert_eq!(stmt.kind, Some(StatementType::SelectInner));
        assert_eq!(stmt.all(Role::TableName), vec!["Employee", "Sales"]);
        assert_eq!(stmt.all(Role::TableAlias), vec!["E,", "S"]);
        assert_eq!(stmt.all(Role::Qualifier), vec!["E", "S"]);
        assert_eq!(stmt.all(Role::ColName), vec!["id", "employeeID"]);

        let stmt =
            Parser::new("select * from Employee E inner join Sales S on E.id = S.employeeID;").parse();
        assert_eq!(stmt.kind, Some(StatementType::SelectInner));
        assert_eq!(stmt.all(Role::TableName), vec!["Employee", "Sales"]);
        assert_eq!(stmt.all(Role::ColName), vec!["id", "employeeID"]);

        let stmt =
            Parser::new("select * from Employee E left outer join Sales S on E.id = S.employeeID;")
                .parse();
        assert_eq!(stmt.kind, Some(StatementType::SelectLeft));
        assert_eq!(stmt.all(Role::TableName), vec!["Employee", "Sales"]);
        assert_eq!(stmt.all(Role::Qualifier), vec!["E", "S"]);
        assert_eq!(stmt.all(Role::ColName), vec!["id", "employeeID"]);

        let stmt = Parser::new("select * from Employee E left join Sales S on E.id = S.employeeID;").parse();
        assert_eq!(stmt.kind, Some(StatementType::SelectLeft));
        assert_eq!(stmt.all(Role::ColName), vec!["id", "employeeID"]);
        Ok(())
    }

    #[test]
    fn test_parser_transactions() {
        assert_eq!(Parser::new("begin transaction;").parse().kind, Some(StatementType::Begin));
        assert_eq!(Parser::new("BEGIN").parse().kind, Some(StatementType::Begin));
        assert_eq!(Parser::new("commit;").parse().kind, Some(StatementType::Commit));
    }

    #[test]
    fn test_parser_never_fails() {
        assert_eq!(Parser::new("").parse().kind, None);
        assert_eq!(Parser::new("select").parse().kind, None);
        assert_eq!(Parser::new("explain select * from t").parse().kind, None);

        let stmt = parse(Lexer::new("update t").tokenize());
        assert_eq!(stmt.kind, Some(StatementType::Update));
        assert_eq!(stmt.first(Role::TableName).ok(), Some("t"));
        assert!(matches!(stmt.first(Role::ColName), Err(Error::Parse(_))));
    }
}
