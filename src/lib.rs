//! sqlit - A small SQL-like database over flat text files
//!
//! This crate provides:
//! - A tokenizer and positional, table-driven parser
//! - A generator turning statements into (assert, invoke) operations
//! - Sessions with BEGIN/COMMIT staging and per-table locks
//! - Pluggable path-level storage (disk and in-memory)

pub mod error;
pub mod sql;
pub mod storage;
