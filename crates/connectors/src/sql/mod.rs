pub mod executor;
pub mod source;
