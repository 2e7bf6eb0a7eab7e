use serde::Serialize;

use super::term::Term;

/// Source name used when MedlinePlus itself fails
pub const MEDLINEPLUS_SOURCE: &str = "MedlinePlus";

/// Attribution shown with MedlinePlus definitions
pub const MEDLINEPLUS_ATTRIBUTION: &str = "MedlinePlus (U.S. National Library of Medicine)";

pub const WIKIPEDIA_SOURCE: &str = "Wikipedia";

/// Source name for failures that happen outside any one source (worker crash)
pub const TERM_FINDER_SOURCE: &str = "Term Finder";

/// Outcome of one search request.
///
/// Immutable once built; `render` turns any variant into display text without
/// further interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupResult {
    Found { source_name: String, text: String },
    NotFound,
    Ambiguous { options: Vec<String> },
    ServiceError { source_name: String, message: String },
}

impl LookupResult {
    /// Build a `Found` result whose text carries the "Source:" header
    pub fn found(source_name: &str, body: &str) -> Self {
        LookupResult::Found {
            source_name: source_name.to_string(),
            text: format!("Source: {}\n\n{}", source_name, body),
        }
    }

    pub fn service_error(source_name: &str, message: impl Into<String>) -> Self {
        LookupResult::ServiceError {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LookupResult::Found { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupResult::NotFound)
    }

    /// Name of the source the result is attributed to, if any
    pub fn source_name(&self) -> Option<&str> {
        match self {
            LookupResult::Found { source_name, .. }
            | LookupResult::ServiceError { source_name, .. } => Some(source_name),
            LookupResult::NotFound | LookupResult::Ambiguous { .. } => None,
        }
    }

    /// Text to put in the result area
    pub fn render(&self) -> String {
        match self {
            LookupResult::Found { text, .. } => text.clone(),
            LookupResult::NotFound => "No definition was found.".to_string(),
            LookupResult::Ambiguous { options } => {
                format!("The term is ambiguous; candidates: {}", candidate_list(options, DEFAULT_CANDIDATES))
            }
            LookupResult::ServiceError {
                source_name,
                message,
            } => format!("{}: {}", source_name, message),
        }
    }
}

/// How many candidate titles an ambiguity message lists by default
pub const DEFAULT_CANDIDATES: usize = 4;

/// Message for a term that matches several pages
pub fn ambiguity_message(term: &Term, options: &[String], limit: usize) -> String {
    format!(
        "'{}' is ambiguous; candidates: {}",
        term,
        candidate_list(options, limit)
    )
}

/// Message for a term neither source knows
pub fn not_found_message(term: &Term) -> String {
    format!("'{}' could not be found in either source", term)
}

fn candidate_list(options: &[String], limit: usize) -> String {
    let shown: Vec<&str> = options.iter().take(limit).map(String::as_str).collect();
    format!("{}...", shown.join(", "))
}
