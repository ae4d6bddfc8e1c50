use crate::error::Result;

/// Abstract storage engine interface (path-level operations)
///
/// Different from sql::engine::Engine which operates on tables. Keys are
/// `/`-separated paths relative to the storage root: a directory per
/// database (`db`) and a file per table (`db/table`).
pub trait Engine: Send + 'static {
    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()>;
    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>>;
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Whether a file or directory exists at the key
    fn exists(&mut self, key: &str) -> Result<bool>;

    /// Creates a directory, failing if it already exists
    fn create_dir(&mut self, key: &str) -> Result<()>;

    /// Removes a directory together with every file below it
    fn delete_dir(&mut self, key: &str) -> Result<()>;
}
