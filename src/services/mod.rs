//! Services module for lookup orchestration
//!
//! Coordinates the source adapters: the resolver applies the source order,
//! the search controller runs it off the foreground task.

pub mod resolver;
pub mod search;

pub use resolver::LookupResolver;
pub use search::{ResultSink, SearchController, SearchDispatch};
