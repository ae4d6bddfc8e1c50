use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};

use log::{debug, warn};

use crate::{
    error::{Error, Result},
    sql::{
        schema::{ColumnDef, Set},
        types::{DatabaseMeta, is_valid_name},
    },
    storage::engine::Engine as StorageEngine,
};

use super::{Engine, SessionId};

/// Name of the metadata file kept in every database directory
const META_FILE: &str = ".meta";

/// Text table engine
///
/// Each database is a directory and each table a file of `|`-delimited
/// lines: the schema line first, then one line per record. Storage access
/// is serialized through a shared mutex; clones share storage and locks.
pub struct TextEngine<E: StorageEngine> {
    kv: Arc<Mutex<E>>,
    locks: Arc<Mutex<HashMap<String, SessionId>>>,
}

impl<E: StorageEngine> Clone for TextEngine<E> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl<E: StorageEngine> TextEngine<E> {
    pub fn new(engine: E) -> Self {
        Self {
            kv: Arc::new(Mutex::new(engine)),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Rejects names that would escape the data directory
    fn check(name: &str) -> Result<&str> {
        match is_valid_name(name) {
            true => Ok(name),
            false => Err(Error::Precondition(format!("Invalid name {}.", name))),
        }
    }

    fn table_key(db: &str, table: &str) -> Result<String> {
        Ok(format!("{}/{}", Self::check(db)?, Self::check(table)?))
    }

    fn meta_key(db: &str) -> Result<String> {
        Ok(format!("{}/{}", Self::check(db)?, META_FILE))
    }

    fn owner() -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".into())
    }
}

impl<E: StorageEngine> Engine for TextEngine<E> {
    fn database_exists(&self, db: &str) -> Result<bool> {
        self.kv.lock()?.exists(Self::check(db)?)
    }

    fn create_database(&self, db: &str) -> Result<()> {
        let meta = DatabaseMeta {
            owner: Self::owner(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e| Error::Internal(e.to_string()))?
                .as_secs(),
        };
        let key = Self::meta_key(db)?;
        let mut kv = self.kv.lock()?;
        kv.create_dir(db)?;
        kv.set(&key, bincode::serialize(&meta)?)?;
        debug!("created database {} owned by {}", db, meta.owner);
        Ok(())
    }

    fn database_meta(&self, db: &str) -> Result<DatabaseMeta> {
        let value = self
            .kv
            .lock()?
            .get(&Self::meta_key(db)?)?
            .ok_or_else(|| Error::Internal(format!("database {} has no metadata", db)))?;
        Ok(bincode::deserialize(&value)?)
    }

    fn drop_database(&self, db: &str) -> Result<()> {
        self.kv.lock()?.delete_dir(Self::check(db)?)
    }

    fn table_exists(&self, db: &str, table: &str) -> Result<bool> {
        self.kv.lock()?.exists(&Self::table_key(db, table)?)
    }

    fn create_table(&self, db: &str, table: &str, columns: &[ColumnDef]) -> Result<()> {
        let mut schema = Set::encode_schema(columns);
        schema.push('\n');
        self.kv
            .lock()?
            .set(&Self::table_key(db, table)?, schema.into_bytes())
    }

    fn drop_table(&self, db: &str, table: &str) -> Result<()> {
        self.kv.lock()?.delete(&Self::table_key(db, table)?)
    }

    fn read_table(&self, db: &str, table: &str) -> Result<String> {
        match self.kv.lock()?.get(&Self::table_key(db, table)?)? {
            Some(value) => Ok(String::from_utf8(value)?),
            None => Err(Error::Precondition(format!(
                "Failed to query table {} because it does not exist.",
                table
            ))),
        }
    }

    fn write_table(&self, db: &str, table: &str, content: String) -> Result<()> {
        self.kv
            .lock()?
            .set(&Self::table_key(db, table)?, content.into_bytes())
    }

    fn lock_table(&self, db: &str, table: &str, owner: SessionId) -> Result<()> {
        let key = Self::table_key(db, table)?;
        let mut locks = self.locks.lock()?;
        match locks.get(&key) {
            Some(&holder) if holder != owner => {
                warn!("session {} blocked on table {} held by session {}", owner, key, holder);
                Err(Error::Precondition(format!(
                    "Failed to lock table {} because it is in use by another session.",
                    table
                )))
            }
            Some(_) => Ok(()),
            None => {
                debug!("session {} locked table {}", owner, key);
                locks.insert(key, owner);
                Ok(())
            }
        }
    }

    fn unlock_table(&self, db: &str, table: &str, owner: SessionId) -> Result<()> {
        let key = Self::table_key(db, table)?;
        let mut locks = self.locks.lock()?;
        if locks.get(&key) == Some(&owner) {
            locks.remove(&key);
        }
        Ok(())
    }

    fn release_locks(&self, owner: SessionId) -> Result<()> {
        self.locks.lock()?.retain(|_, holder| *holder != owner);
        Ok(())
    }

    fn database_locked(&self, db: &str, owner: SessionId) -> Result<bool> {
        let prefix = format!("{}/", Self::check(db)?);
        Ok(self
            .locks
            .lock()?
            .iter()
            .any(|(key, &holder)| holder != owner && key.starts_with(&prefix)))
    }
}

#[cfg(test)]
mod tests {
    use super::TextEngine;
    use crate::{
        error::{Error, Result},
        sql::{
            engine::Engine,
            schema::ColumnDef,
            types::{AlterMethod, Comparator, Filter},
        },
        storage::{disk::DiskEngine, engine::Engine as StorageEngine, memory::MemoryEngine},
    };

    fn product_table(engine: &impl Engine) -> Result<()> {
        engine.create_database("db")?;
        engine.create_table(
            "db",
            "Product",
            &[
                ColumnDef::new("pid", "int"),
                ColumnDef::new("name", "varchar(20)"),
                ColumnDef::new("price", "float"),
            ],
        )?;
        for (pid, name, price) in [
            ("1", "Gizmo", "19.99"),
            ("2", "PowerGizmo", "29.99"),
            ("3", "SingleTouch", "149.99"),
            ("4", "MultiTouch", "199.99"),
            ("5", "SuperGizmo", "49.99"),
        ] {
            engine.insert_record("db", "Product", vec![pid.into(), name.into(), price.into()])?;
        }
        Ok(())
    }

    fn test_databases(engine: impl StorageEngine) -> Result<()> {
        let engine = TextEngine::new(engine);
        assert!(!engine.database_exists("db")?);
        engine.create_database("db")?;
        assert!(engine.database_exists("db")?);
        assert!(engine.create_database("db").is_err());
        assert!(engine.database_meta("db")?.created_at > 0);

        engine.create_table("db", "t", &[ColumnDef::new("a", "int")])?;
        assert!(engine.table_exists("db", "t")?);
        assert!(!engine.table_exists("db", "u")?);

        for name in ["../db", ".", "a/b"] {
            assert!(matches!(engine.database_exists(name), Err(Error::Precondition(_))));
            assert!(matches!(engine.drop_database(name), Err(Error::Precondition(_))));
            assert!(matches!(engine.read_table("db", name), Err(Error::Precondition(_))));
            assert!(matches!(engine.drop_table("db", name), Err(Error::Precondition(_))));
        }
        assert!(matches!(
            engine.write_table("db", ".meta", String::new()),
            Err(Error::Precondition(_))
        ));

        engine.drop_database("db")?;
        assert!(!engine.database_exists("db")?);
        assert!(!engine.table_exists("db", "t")?);
        Ok(())
    }

    fn test_tables(engine: impl StorageEngine) -> Result<()> {
        let engine = TextEngine::new(engine);
        product_table(&engine)?;
        assert_eq!(
            engine.select_all("db", "Product")?,
            "pid int|name varchar(20)|price float\n\
             1|Gizmo|19.99\n\
             2|PowerGizmo|29.99\n\
             3|SingleTouch|149.99\n\
             4|MultiTouch|199.99\n\
             5|SuperGizmo|49.99\n"
        );

        engine.alter_table("db", "Product", AlterMethod::Add, ColumnDef::new("stock", "int"))?;
        let set = engine.select_set("db", "Product")?;
        assert_eq!(set.columns.len(), 4);
        assert!(set.records.iter().all(|r| r.len() == 4));

        engine.drop_table("db", "Product")?;
        assert!(!engine.table_exists("db", "Product")?);
        assert!(matches!(
            engine.read_table("db", "Product"),
            Err(Error::Precondition(_))
        ));
        Ok(())
    }

    fn test_records(engine: impl StorageEngine) -> Result<()> {
        let engine = TextEngine::new(engine);
        product_table(&engine)?;

        let filter = Filter::new("pid", Comparator::NotEquals, "2");
        let columns = vec!["name".to_string(), "price".to_string()];
        let rows = engine.select_where("db", "Product", &columns, Some(&filter))?;
        assert_eq!(
            rows,
            "name varchar(20)|price float\n\
             Gizmo|19.99\n\
             SingleTouch|149.99\n\
             MultiTouch|199.99\n\
             SuperGizmo|49.99"
        );

        let filter = Filter::new("name", Comparator::Equals, "SuperGizmo");
        assert_eq!(engine.update_record("db", "Product", filter, "name", "Gizmo")?, 1);
        let filter = Filter::new("name", Comparator::Equals, "Gizmo");
        assert_eq!(engine.delete_record("db", "Product", filter)?, 2);
        let filter = Filter::new("price", Comparator::GreaterThan, "150");
        assert_eq!(engine.delete_record("db", "Product", filter)?, 1);

        let before = engine.select_all("db", "Product")?;
        let filter = Filter::new("name", Comparator::GreaterThan, "150");
        assert!(matches!(
            engine.delete_record("db", "Product", filter),
            Err(Error::Precondition(_))
        ));
        assert_eq!(engine.select_all("db", "Product")?, before);
        assert_eq!(
            before,
            "pid int|name varchar(20)|price float\n2|PowerGizmo|29.99\n3|SingleTouch|149.99\n"
        );
        Ok(())
    }

    fn test_locks(engine: impl StorageEngine) -> Result<()> {
        let engine = TextEngine::new(engine);
        let other = engine.clone();

        engine.lock_table("db", "t", 1)?;
        engine.lock_table("db", "t", 1)?;
        assert!(matches!(other.lock_table("db", "t", 2), Err(Error::Precondition(_))));
        assert!(other.database_locked("db", 2)?);
        assert!(!engine.database_locked("db", 1)?);
        assert!(!other.database_locked("db_2", 2)?);
        other.lock_table("db", "u", 2)?;

        engine.unlock_table("db", "t", 2)?;
        assert!(other.lock_table("db", "t", 2).is_err());
        engine.release_locks(1)?;
        other.lock_table("db", "t", 2)?;
        assert!(engine.lock_table("db", "u", 1).is_err());
        Ok(())
    }

    #[test]
    fn test_memory() -> Result<()> {
        test_databases(MemoryEngine::new())?;
        test_tables(MemoryEngine::new())?;
        test_records(MemoryEngine::new())?;
        test_locks(MemoryEngine::new())?;
        Ok(())
    }

    #[test]
    fn test_disk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        test_databases(DiskEngine::new(dir.path().join("databases"))?)?;
        test_tables(DiskEngine::new(dir.path().join("tables"))?)?;
        test_records(DiskEngine::new(dir.path().join("records"))?)?;
        test_locks(DiskEngine::new(dir.path().join("locks"))?)?;
        Ok(())
    }
}
