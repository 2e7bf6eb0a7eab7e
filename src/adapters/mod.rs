//! External definition sources
//!
//! This module contains adapters for the services a term is looked up in:
//! - MedlinePlus: authoritative health-topic summaries (XML)
//! - Wikipedia: general encyclopedia summaries (MediaWiki JSON API)

pub mod medlineplus;
pub mod wikipedia;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::models::{LookupResult, Term};

// Re-export commonly used types
pub use medlineplus::MedlinePlusClient;
pub use wikipedia::WikipediaClient;

/// A service that can define a term.
///
/// Implementations never fail past this boundary: every transport, parse or
/// service-specific problem comes back as `LookupResult::ServiceError`.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    /// Name used when attributing failures to this source
    fn name(&self) -> &str;

    /// Look the term up, returning `Found`, `NotFound` or `ServiceError`
    async fn lookup(&self, term: &Term) -> LookupResult;
}
