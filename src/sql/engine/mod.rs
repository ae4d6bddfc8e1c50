use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};

use crate::{
    error::{Error, Result},
    sql::{
        executor::{
            Executor, ResultSet,
            mutation::{AlterTable, Delete, Insert, Update},
            query::{Projection, Scan},
        },
        parser::{Parser, ast::StatementType},
        plan::{Operation, generator::Generator},
        schema::{ColumnDef, Set},
        types::{AlterMethod, DatabaseMeta, Filter, Record},
    },
};

mod text;

pub use text::TextEngine;

/// Identifies the session owning a table lock
pub type SessionId = u64;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// SQL engine trait (table-level operations)
///
/// Implementors provide raw table text and locking; row operations are
/// built on top by decoding the table into a `Set`, mutating it in memory
/// and writing the whole table back.
pub trait Engine: Clone + 'static {
    fn database_exists(&self, db: &str) -> Result<bool>;
    /// Creates the database directory and its metadata
    fn create_database(&self, db: &str) -> Result<()>;
    fn database_meta(&self, db: &str) -> Result<DatabaseMeta>;
    /// Removes the database together with all of its tables
    fn drop_database(&self, db: &str) -> Result<()>;

    fn table_exists(&self, db: &str, table: &str) -> Result<bool>;
    /// Creates a table holding only its schema line
    fn create_table(&self, db: &str, table: &str, columns: &[ColumnDef]) -> Result<()>;
    fn drop_table(&self, db: &str, table: &str) -> Result<()>;

    /// Returns the full table file contents
    fn read_table(&self, db: &str, table: &str) -> Result<String>;
    /// Replaces the full table file contents
    fn write_table(&self, db: &str, table: &str, content: String) -> Result<()>;

    /// Takes the exclusive lock on a table; re-entrant for the same owner
    fn lock_table(&self, db: &str, table: &str, owner: SessionId) -> Result<()>;
    fn unlock_table(&self, db: &str, table: &str, owner: SessionId) -> Result<()>;
    /// Releases every lock held by the owner
    fn release_locks(&self, owner: SessionId) -> Result<()>;
    /// Whether a session other than the owner holds a lock on a table of the database
    fn database_locked(&self, db: &str, owner: SessionId) -> Result<bool>;

    fn select_all(&self, db: &str, table: &str) -> Result<String> {
        self.read_table(db, table)
    }

    fn select_set(&self, db: &str, table: &str) -> Result<Set> {
        Set::decode(table, &self.read_table(db, table)?)
    }

    fn write_set(&self, db: &str, set: &Set) -> Result<()> {
        self.write_table(db, &set.name, set.encode())
    }

    /// Projects the named columns of the records that pass the filter
    fn select_where(
        &self,
        db: &str,
        table: &str,
        columns: &[String],
        filter: Option<&Filter>,
    ) -> Result<String> {
        let scan = Scan::new(self.select_set(db, table)?, filter.cloned());
        Ok(Projection::new(scan, columns.to_vec()).execute()?.to_string())
    }

    fn alter_table(&self, db: &str, table: &str, method: AlterMethod, column: ColumnDef) -> Result<()> {
        let mut set = self.select_set(db, table)?;
        AlterTable::new(method, column).execute(&mut set)?;
        self.write_set(db, &set)
    }

    fn insert_record(&self, db: &str, table: &str, values: Record) -> Result<()> {
        let mut set = self.select_set(db, table)?;
        Insert::new(values).execute(&mut set)?;
        self.write_set(db, &set)
    }

    /// Returns the number of records modified
    fn update_record(
        &self,
        db: &str,
        table: &str,
        filter: Filter,
        to_col: &str,
        to_val: &str,
    ) -> Result<usize> {
        let mut set = self.select_set(db, table)?;
        let result = Update::new(filter, to_col.to_string(), to_val.to_string()).execute(&mut set)?;
        self.write_set(db, &set)?;
        count(result)
    }

    /// Returns the number of records deleted
    fn delete_record(&self, db: &str, table: &str, filter: Filter) -> Result<usize> {
        let mut set = self.select_set(db, table)?;
        let result = Delete::new(filter).execute(&mut set)?;
        self.write_set(db, &set)?;
        count(result)
    }

    fn session(&self) -> Session<Self> {
        Session::new(self.clone())
    }
}

fn count(result: ResultSet) -> Result<usize> {
    match result {
        ResultSet::Insert { count } | ResultSet::Update { count } | ResultSet::Delete { count } => {
            Ok(count)
        }
        _ => Err(Error::Internal("Unexpected result set".into())),
    }
}

/// Per-session state visible to operations
pub struct Context<E: Engine> {
    engine: E,
    id: SessionId,
    database: Option<String>,
}

impl<E: Engine> Context<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            database: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The database in use, if any
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn use_database(&mut self, name: &str) {
        self.database = Some(name.to_string());
    }

    /// Forgets the database in use if it is the named one
    pub fn leave_database(&mut self, name: &str) {
        if self.database.as_deref() == Some(name) {
            self.database = None;
        }
    }

    pub fn is_any_database_in_use(&self) -> bool {
        self.database.is_some()
    }
}

/// Operations staged between BEGIN and COMMIT
struct Transaction<E: Engine> {
    operations: Vec<Operation<E>>,
    /// Set once a staged statement fails; COMMIT then aborts
    failed: bool,
}

/// SQL session for executing statements
///
/// Outside a transaction every statement runs immediately (assert, then
/// invoke). Between BEGIN and COMMIT statements are asserted and staged.
pub struct Session<E: Engine> {
    ctx: Context<E>,
    txn: Option<Transaction<E>>,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E) -> Self {
        Self {
            ctx: Context::new(engine),
            txn: None,
        }
    }

    pub fn context(&self) -> &Context<E> {
        &self.ctx
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Executes a SQL statement and returns its printable result
    pub fn execute(&mut self, sql: &str) -> Result<String> {
        let stmt = Parser::new(sql).parse();
        debug!("session {} executing {:?}", self.ctx.id, stmt.kind);

        match stmt.kind {
            Some(StatementType::Begin) => self.begin(),
            Some(StatementType::Commit) => self.commit(),
            _ => {
                let operation = Generator::generate::<E>(&stmt);
                match self.txn.as_mut() {
                    Some(txn) => {
                        let staged = operation.and_then(|op| {
                            op.assert(&self.ctx)?;
                            Ok(op)
                        });
                        match staged {
                            Ok(op) => {
                                txn.operations.push(op);
                                Ok("Operation staged for commit.".into())
                            }
                            Err(err) => {
                                txn.failed = true;
                                Err(err)
                            }
                        }
                    }
                    None => {
                        let op = operation?;
                        let result = op.assert(&self.ctx).and_then(|_| op.invoke(&mut self.ctx));
                        self.release_locks();
                        result
                    }
                }
            }
        }
    }

    fn begin(&mut self) -> Result<String> {
        if self.txn.is_some() {
            return Err(Error::Precondition(
                "Failed to begin transaction because one is already in progress.".into(),
            ));
        }
        self.txn = Some(Transaction {
            operations: Vec::new(),
            failed: false,
        });
        info!("session {} began a transaction", self.ctx.id);
        Ok("Transaction starts.".into())
    }

    /// Re-asserts every staged operation, then invokes them in order
    ///
    /// The first failing assert aborts the whole batch before anything is
    /// invoked. Once invoking starts, each operation reports on its own.
    fn commit(&mut self) -> Result<String> {
        let Some(txn) = self.txn.take() else {
            return Err(Error::Precondition(
                "Failed to commit because no transaction is in progress.".into(),
            ));
        };

        if txn.failed {
            warn!("session {} aborted a failed transaction", self.ctx.id);
            self.release_locks();
            return Err(Error::Aborted(None));
        }

        for op in &txn.operations {
            if let Err(err) = op.assert(&self.ctx) {
                warn!("session {} aborted a transaction: {}", self.ctx.id, err);
                self.release_locks();
                return Err(Error::Aborted(Some(Box::new(err))));
            }
        }

        let mut lines = Vec::with_capacity(txn.operations.len() + 1);
        for op in txn.operations {
            match op.invoke(&mut self.ctx) {
                Ok(line) => lines.push(line),
                Err(err) => lines.push(err.to_string()),
            }
        }
        lines.push("Transaction committed.".to_string());
        self.release_locks();
        info!("session {} committed a transaction", self.ctx.id);
        Ok(lines.join("\n"))
    }

    fn release_locks(&self) {
        if let Err(err) = self.ctx.engine.release_locks(self.ctx.id) {
            warn!("session {} failed to release its locks: {}", self.ctx.id, err);
        }
    }
}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        self.release_locks();
    }
}
