//! SQL processing module
//!
//! This module provides:
//! - `parser`: tokenizer and role-assigning parser
//! - `types`: records, filters and database metadata
//! - `schema`: column definitions and the in-memory table `Set`
//! - `plan`: operation generation
//! - `executor`: scans, joins and mutations over `Set`s
//! - `engine`: table-level engine, sessions and transactions

pub mod engine;
pub mod executor;
pub mod parser;
pub mod plan;
pub mod schema;
pub mod types;
