//! Ordered two-source term resolution
//!
//! MedlinePlus is asked first. Wikipedia is consulted only when MedlinePlus
//! has no entry; a MedlinePlus failure is reported as-is and never masked by
//! a fallback hit.

use std::sync::Arc;
use tracing::{debug, info};

use crate::adapters::{DefinitionSource, MedlinePlusClient, WikipediaClient};
use crate::models::{not_found_message, AppSettings, LookupResult, Term};

/// Resolves a term against a primary and a fallback source
#[derive(Clone)]
pub struct LookupResolver {
    primary: Arc<dyn DefinitionSource>,
    fallback: Arc<dyn DefinitionSource>,
}

impl LookupResolver {
    pub fn new(primary: Arc<dyn DefinitionSource>, fallback: Arc<dyn DefinitionSource>) -> Self {
        Self { primary, fallback }
    }

    /// MedlinePlus first, Wikipedia as fallback
    pub fn from_settings(settings: &AppSettings) -> Result<Self, String> {
        let primary = MedlinePlusClient::new(settings)?;
        let fallback = WikipediaClient::new(settings)?;
        Ok(Self::new(Arc::new(primary), Arc::new(fallback)))
    }

    /// Resolve a term to a renderable result. Never fails.
    pub async fn resolve(&self, term: &Term) -> LookupResult {
        // 1. Authoritative source
        let primary = self.primary.lookup(term).await;
        if !primary.is_not_found() {
            info!("Resolved {} via {}", term, self.primary.name());
            return primary;
        }

        // 2. Primary has no entry; ask the fallback
        debug!(
            "{} has no entry for {}, trying {}",
            self.primary.name(),
            term,
            self.fallback.name()
        );
        let fallback = self.fallback.lookup(term).await;

        if fallback.is_not_found() {
            return LookupResult::service_error(self.fallback.name(), not_found_message(term));
        }

        info!("Resolved {} via {}", term, self.fallback.name());
        fallback
    }
}
