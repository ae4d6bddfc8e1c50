//! Path-level storage engines underneath the table layer

pub mod disk;
pub mod engine;
pub mod memory;
