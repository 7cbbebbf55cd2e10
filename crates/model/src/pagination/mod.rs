pub mod cursor;
pub mod error;
pub mod fetch_result;
pub mod order;
pub mod page;
pub mod token;
