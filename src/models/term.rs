use std::fmt;

/// Raised when the user submits nothing but whitespace
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Please enter a term to search.")]
pub struct EmptyInputError;

/// A search term as typed by the user, trimmed and known to be non-empty.
///
/// No case folding or other normalization happens here: the term is handed
/// to the sources verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term(String);

impl Term {
    /// Trim the raw input and reject it if nothing is left
    pub fn normalize(raw_input: &str) -> Result<Self, EmptyInputError> {
        let trimmed = raw_input.trim();
        if trimmed.is_empty() {
            return Err(EmptyInputError);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Term {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
