use log::info;

use crate::{
    error::{Error, Result},
    sql::{
        engine::{Context, Engine},
        executor::{
            ResultSet,
            join::{inner_join, left_join},
        },
        parser::ast::{Role, Statement, StatementType},
        plan::Operation,
        schema::ColumnDef,
        types::{AlterMethod, Comparator, Filter, Record, is_valid_name, parse_number},
    },
};

/// Operation generator - maps a parsed statement to its assert and invoke
/// steps
///
/// Every token the operation needs is extracted here, so a statement missing
/// a role fails with a parse error before anything runs.
pub struct Generator;

impl Generator {
    pub fn generate<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        match stmt.kind {
            Some(StatementType::CreateDatabase) => Self::create_database(stmt),
            Some(StatementType::DropDatabase) => Self::drop_database(stmt),
            Some(StatementType::UseDatabase) => Self::use_database(stmt),
            Some(StatementType::CreateTable) => Self::create_table(stmt),
            Some(StatementType::DropTable) => Self::drop_table(stmt),
            Some(StatementType::AlterTable) => Self::alter_table(stmt),
            Some(StatementType::Select) => Self::select(stmt),
            Some(StatementType::SelectInner) => Self::join(stmt, false),
            Some(StatementType::SelectLeft) => Self::join(stmt, true),
            Some(StatementType::Insert) => Self::insert(stmt),
            Some(StatementType::Update) => Self::update(stmt),
            Some(StatementType::Delete) => Self::delete(stmt),
            Some(StatementType::Begin | StatementType::Commit) => Err(Error::Internal(
                "transaction control is handled by the session".into(),
            )),
            None => Err(Error::Parse(format!(
                "unrecognized statement '{}'",
                stmt.tokens
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            ))),
        }
    }

    fn create_database<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let name = stmt.first(Role::DatabaseName)?.to_string();
        let n = name.clone();
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                check_name(&format!("create database {}", n), &n)?;
                if ctx.engine().database_exists(&n)? {
                    return Err(Error::Precondition(format!(
                        "Failed to create database {} because it already exists.",
                        n
                    )));
                }
                Ok(())
            },
            move |ctx: &mut Context<E>| {
                ctx.engine().create_database(&name)?;
                info!("created database {}", name);
                Ok(ResultSet::CreateDatabase { name })
            },
        ))
    }

    fn drop_database<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let name = stmt.first(Role::DatabaseName)?.to_string();
        let n = name.clone();
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                check_name(&format!("delete {}", n), &n)?;
                if !ctx.engine().database_exists(&n)? {
                    return Err(Error::Precondition(format!(
                        "Failed to delete {} because it does not exist.",
                        n
                    )));
                }
                if ctx.engine().database_locked(&n, ctx.id())? {
                    return Err(Error::Precondition(format!(
                        "Failed to delete {} because it is in use by another session.",
                        n
                    )));
                }
                Ok(())
            },
            move |ctx: &mut Context<E>| {
                ctx.engine().drop_database(&name)?;
                ctx.leave_database(&name);
                info!("dropped database {}", name);
                Ok(ResultSet::DropDatabase { name })
            },
        ))
    }

    fn use_database<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let name = stmt.first(Role::DatabaseName)?.to_string();
        let n = name.clone();
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                check_name(&format!("use database {}", n), &n)?;
                if !ctx.engine().database_exists(&n)? {
                    return Err(Error::Precondition(format!(
                        "Failed to use database {} because it does not exist.",
                        n
                    )));
                }
                Ok(())
            },
            move |ctx: &mut Context<E>| {
                ctx.use_database(&name);
                Ok(ResultSet::UseDatabase { name })
            },
        ))
    }

    fn create_table<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let table_name = stmt.first(Role::TableName)?.to_string();
        let columns = column_defs(stmt)?;
        let t = table_name.clone();
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                let db = database(ctx, "create", &t)?;
                check_name(&format!("create table {}", t), &t)?;
                if ctx.engine().table_exists(db, &t)? {
                    return Err(Error::Precondition(format!(
                        "Failed to create table {} because it already exists.",
                        t
                    )));
                }
                Ok(())
            },
            move |ctx: &mut Context<E>| {
                let db = database(ctx, "create", &table_name)?;
                ctx.engine().create_table(db, &table_name, &columns)?;
                info!("created table {}/{}", db, table_name);
                Ok(ResultSet::CreateTable { table_name })
            },
        ))
    }

    fn drop_table<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let table_name = stmt.first(Role::TableName)?.to_string();
        let t = table_name.clone();
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                let db = existing_table(ctx, "delete", &t)?;
                ctx.engine().lock_table(db, &t, ctx.id())
            },
            move |ctx: &mut Context<E>| {
                let db = database(ctx, "delete", &table_name)?;
                ctx.engine().drop_table(db, &table_name)?;
                ctx.engine().unlock_table(db, &table_name, ctx.id())?;
                info!("dropped table {}/{}", db, table_name);
                Ok(ResultSet::DropTable { table_name })
            },
        ))
    }

    fn alter_table<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let table_name = stmt.first(Role::TableName)?.to_string();
        let method = match stmt.first(Role::AddCol)? {
            m if m.eq_ignore_ascii_case("add") => AlterMethod::Add,
            m => return Err(Error::Parse(format!("unsupported alter method {}", m))),
        };
        let column = ColumnDef::new(
            strip_comma(stmt.first(Role::ColName)?),
            strip_comma(stmt.first(Role::ColType)?),
        );
        let t = table_name.clone();
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                let db = existing_table(ctx, "alter", &t)?;
                ctx.engine().lock_table(db, &t, ctx.id())
            },
            move |ctx: &mut Context<E>| {
                let db = database(ctx, "alter", &table_name)?;
                ctx.engine().alter_table(db, &table_name, method, column)?;
                info!("altered table {}/{}", db, table_name);
                Ok(ResultSet::AlterTable { table_name })
            },
        ))
    }

    /// `SELECT *` returns the raw table; a column list projects two columns,
    /// optionally filtered by a WHERE clause
    fn select<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let table_name = stmt.first(Role::TableName)?.to_string();
        let t = table_name.clone();

        let projection = match stmt.first(Role::All) {
            Ok(_) => None,
            Err(_) => {
                let columns = vec![
                    strip_comma(stmt.first(Role::ColName)?),
                    strip_comma(stmt.second(Role::ColName)?),
                ];
                let filter = match stmt.first(Role::Where) {
                    Ok(_) => {
                        let comparator = match stmt.find(&[
                            Role::NotEquals,
                            Role::Equals,
                            Role::GreaterThan,
                        ]) {
                            Some(Role::NotEquals) => Comparator::NotEquals,
                            Some(Role::GreaterThan) => Comparator::GreaterThan,
                            Some(_) => Comparator::Equals,
                            None => return Err(Error::Parse("expected a comparator".into())),
                        };
                        Some(Filter::new(
                            stmt.third(Role::ColName)?,
                            comparator,
                            unquote(stmt.first(Role::ColValue)?),
                        ))
                    }
                    Err(_) => None,
                };
                Some((columns, filter))
            }
        };
        let operand = numeric_operand(projection.as_ref().and_then(|(_, f)| f.as_ref()));

        Ok(Operation::new(
            move |ctx: &Context<E>| {
                existing_table(ctx, "query", &t)?;
                if let Some(value) = &operand {
                    parse_number(value)?;
                }
                Ok(())
            },
            move |ctx: &mut Context<E>| {
                let db = database(ctx, "query", &table_name)?;
                Ok(match projection {
                    None => ResultSet::Raw {
                        content: ctx.engine().select_all(db, &table_name)?,
                    },
                    Some((columns, filter)) => ResultSet::Raw {
                        content: ctx
                            .engine()
                            .select_where(db, &table_name, &columns, filter.as_ref())?,
                    },
                })
            },
        ))
    }

    /// Joins two tables on one pair of columns, in any of the three join
    /// spellings
    fn join<E: Engine>(stmt: &Statement, outer: bool) -> Result<Operation<E>> {
        let left = stmt.first(Role::TableName)?.to_string();
        let right = stmt.second(Role::TableName)?.to_string();
        let left_alias = strip_comma(stmt.first(Role::TableAlias)?);
        let right_alias = strip_comma(stmt.second(Role::TableAlias)?);

        let mut left_col = stmt.first(Role::ColName)?.to_string();
        let mut right_col = stmt.second(Role::ColName)?.to_string();
        let qualifier = stmt.first(Role::Qualifier)?;
        stmt.second(Role::Qualifier)?;
        let names_right = |q: &str| q.eq_ignore_ascii_case(&right_alias) || q.eq_ignore_ascii_case(&right);
        let names_left = |q: &str| q.eq_ignore_ascii_case(&left_alias) || q.eq_ignore_ascii_case(&left);
        if names_right(qualifier) && !names_left(qualifier) {
            std::mem::swap(&mut left_col, &mut right_col);
        }

        let (l, r) = (left.clone(), right.clone());
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                existing_table(ctx, "query", &l)?;
                existing_table(ctx, "query", &r)?;
                Ok(())
            },
            move |ctx: &mut Context<E>| {
                let db = database(ctx, "query", &left)?;
                let lset = ctx.engine().select_set(db, &left)?;
                let rset = ctx.engine().select_set(db, &right)?;
                let set = if outer {
                    left_join(lset, rset, &left_col, &right_col)?
                } else {
                    inner_join(lset, rset, &left_col, &right_col)?
                };
                Ok(ResultSet::Scan { set })
            },
        ))
    }

    fn insert<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let table_name = stmt.first(Role::TableName)?.to_string();
        let values = record_values(stmt)?;
        let t = table_name.clone();
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                let db = existing_table(ctx, "query", &t)?;
                ctx.engine().lock_table(db, &t, ctx.id())
            },
            move |ctx: &mut Context<E>| {
                let db = database(ctx, "query", &table_name)?;
                ctx.engine().insert_record(db, &table_name, values)?;
                Ok(ResultSet::Insert { count: 1 })
            },
        ))
    }

    fn update<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let table_name = stmt.first(Role::TableName)?.to_string();
        let to_col = stmt.first(Role::ColName)?.to_string();
        let to_val = unquote(stmt.first(Role::ColValue)?);
        let filter = Filter::new(
            stmt.second(Role::ColName)?,
            Comparator::Equals,
            unquote(stmt.second(Role::ColValue)?),
        );
        let t = table_name.clone();
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                let db = existing_table(ctx, "query", &t)?;
                ctx.engine().lock_table(db, &t, ctx.id())
            },
            move |ctx: &mut Context<E>| {
                let db = database(ctx, "query", &table_name)?;
                let count = ctx
                    .engine()
                    .update_record(db, &table_name, filter, &to_col, &to_val)?;
                Ok(ResultSet::Update { count })
            },
        ))
    }

    fn delete<E: Engine>(stmt: &Statement) -> Result<Operation<E>> {
        let table_name = stmt.first(Role::TableName)?.to_string();
        let comparator = match stmt.find(&[Role::Equals, Role::GreaterThan]) {
            Some(Role::GreaterThan) => Comparator::GreaterThan,
            Some(_) => Comparator::Equals,
            None => return Err(Error::Parse("expected a comparator".into())),
        };
        let filter = Filter::new(
            stmt.first(Role::ColName)?,
            comparator,
            unquote(stmt.first(Role::ColValue)?),
        );
        let operand = numeric_operand(Some(&filter));
        let t = table_name.clone();
        Ok(Operation::new(
            move |ctx: &Context<E>| {
                let db = existing_table(ctx, "query", &t)?;
                if let Some(value) = &operand {
                    parse_number(value)?;
                }
                ctx.engine().lock_table(db, &t, ctx.id())
            },
            move |ctx: &mut Context<E>| {
                let db = database(ctx, "query", &table_name)?;
                let count = ctx.engine().delete_record(db, &table_name, filter)?;
                Ok(ResultSet::Delete { count })
            },
        ))
    }
}

/// Returns the database in use, or why the table action cannot run
fn database<'a, E: Engine>(ctx: &'a Context<E>, action: &str, table: &str) -> Result<&'a str> {
    ctx.database().ok_or_else(|| {
        Error::Precondition(format!(
            "Failed to {} table {} because no database is in use.",
            action, table
        ))
    })
}

/// Like `database`, also requiring the table to exist
fn existing_table<'a, E: Engine>(ctx: &'a Context<E>, action: &str, table: &str) -> Result<&'a str> {
    let db = database(ctx, action, table)?;
    check_name(&format!("{} table {}", action, table), table)?;
    if !ctx.engine().table_exists(db, table)? {
        return Err(Error::Precondition(format!(
            "Failed to {} table {} because it does not exist.",
            action, table
        )));
    }
    Ok(db)
}

/// Database and table names become path components
fn check_name(action: &str, name: &str) -> Result<()> {
    if !is_valid_name(name) {
        return Err(Error::Precondition(format!(
            "Failed to {} because the name is invalid.",
            action
        )));
    }
    Ok(())
}

/// The operand of a `>` filter, which must be numeric
fn numeric_operand(filter: Option<&Filter>) -> Option<String> {
    filter
        .filter(|f| f.comparator == Comparator::GreaterThan)
        .map(|f| f.value.clone())
}

fn strip_comma(text: &str) -> String {
    text.strip_suffix(',').unwrap_or(text).to_string()
}

fn unquote(text: &str) -> String {
    text.replace('\'', "")
}

/// Column definitions of CREATE TABLE, without the surrounding parentheses
/// and separators
fn column_defs(stmt: &Statement) -> Result<Vec<ColumnDef>> {
    let names = stmt.all(Role::ColName);
    let types = stmt.all(Role::ColType);
    if names.is_empty() {
        return Err(Error::Parse(format!("expected a {}", Role::ColName)));
    }
    if names.len() != types.len() {
        return Err(Error::Parse(format!(
            "expected a {} for column {}",
            Role::ColType,
            names[names.len() - 1]
        )));
    }

    let last = types.len() - 1;
    let mut columns = Vec::with_capacity(names.len());
    for (i, (name, datatype)) in names.into_iter().zip(types).enumerate() {
        let name = if i == 0 { name.strip_prefix('(').unwrap_or(name) } else { name };
        let mut datatype = strip_comma(datatype);
        if i == last && datatype.matches(')').count() > datatype.matches('(').count() {
            datatype.pop();
        }
        columns.push(ColumnDef::new(strip_comma(name), datatype));
    }
    Ok(columns)
}

/// Values of INSERT, without the surrounding parentheses, separators and
/// quotes
fn record_values(stmt: &Statement) -> Result<Record> {
    let values = stmt.all(Role::Value);
    if values.is_empty() {
        return Err(Error::Parse(format!("expected a {}", Role::Value)));
    }

    let last = values.len() - 1;
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let mut value = strip_comma(value);
            if i == 0 && value.starts_with('(') {
                value.remove(0);
            }
            if i == last && value.ends_with(')') {
                value.pop();
            }
            unquote(&value)
        })
        .collect())
}
