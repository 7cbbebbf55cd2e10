pub mod error;
pub mod file;
pub mod memory;
pub mod requests;
pub mod source;
pub mod sql;
