pub mod backend;
pub mod query;

pub use backend::{DEFAULT_COUNT, FsSearch};
pub use query::{PatternType, QueryError, SearchQuery, parse};
