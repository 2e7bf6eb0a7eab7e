pub mod adapters;
pub mod models;
pub mod services;
pub mod utils;

pub use models::{LookupResult, Term};
pub use services::{LookupResolver, ResultSink, SearchController, SearchDispatch};
