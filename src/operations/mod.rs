pub mod adopt;
pub mod merge;
pub mod query;
