//! MedlinePlus web service client
//!
//! Queries the U.S. National Library of Medicine health-topics database and
//! turns the `FullSummary` field of the first matching document into text.
//! See: https://medlineplus.gov/about/developers/webservices/

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::DefinitionSource;
use crate::models::{AppSettings, LookupResult, Term, MEDLINEPLUS_ATTRIBUTION, MEDLINEPLUS_SOURCE};
use crate::utils::html::flatten_html;
use crate::utils::http::{build_client, fetch_text, HttpError};

/// Value of the `name` attribute on the summary `content` element
const FULL_SUMMARY: &str = "FullSummary";

/// Failures while querying MedlinePlus
#[derive(Debug, thiserror::Error)]
pub enum MedlinePlusError {
    /// Connection error, timeout, non-2xx status or a body cut off mid-read
    #[error("service unavailable")]
    Unavailable(#[source] HttpError),
    /// Response body is not a well-formed XML document
    #[error("parse failure")]
    Parse(String),
}

impl MedlinePlusError {
    pub fn into_lookup_result(self) -> LookupResult {
        LookupResult::service_error(MEDLINEPLUS_SOURCE, self.to_string())
    }
}

impl From<HttpError> for MedlinePlusError {
    fn from(err: HttpError) -> Self {
        MedlinePlusError::Unavailable(err)
    }
}

/// Client for the MedlinePlus health-topics search
pub struct MedlinePlusClient {
    client: Client,
    base_url: String,
}

impl MedlinePlusClient {
    /// Create a new client from settings
    pub fn new(settings: &AppSettings) -> Result<Self, String> {
        let client = build_client(settings.request_timeout(), &settings.user_agent)?;
        Ok(Self::with_client(client, &settings.medlineplus_url))
    }

    /// Create a new client with an existing reqwest client
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    fn query_url(&self, term: &Term) -> String {
        format!(
            "{}?db=healthTopics&term={}&rettype=brief",
            self.base_url,
            urlencoding::encode(term.as_str())
        )
    }

    /// Fetch the flattened full summary for a term
    ///
    /// # Returns
    /// * `Ok(Some(text))` - Cleaned summary text
    /// * `Ok(None)` - MedlinePlus has no summary for the term
    /// * `Err(MedlinePlusError)` - Transport or parse failure
    pub async fn find_definition(&self, term: &Term) -> Result<Option<String>, MedlinePlusError> {
        debug!("MedlinePlus lookup for: {}", term);

        let xml_response = fetch_text(&self.client, &self.query_url(term)).await?;

        let summary = match extract_full_summary(&xml_response)? {
            Some(html) => html,
            None => {
                debug!("No MedlinePlus summary for: {}", term);
                return Ok(None);
            }
        };

        let text = flatten_html(&summary);
        if text.is_empty() {
            debug!("MedlinePlus summary for {} is empty after cleaning", term);
            return Ok(None);
        }

        Ok(Some(text))
    }
}

#[async_trait]
impl DefinitionSource for MedlinePlusClient {
    fn name(&self) -> &str {
        MEDLINEPLUS_SOURCE
    }

    async fn lookup(&self, term: &Term) -> LookupResult {
        match self.find_definition(term).await {
            Ok(Some(text)) => {
                info!("Found MedlinePlus definition for {}", term);
                LookupResult::found(MEDLINEPLUS_ATTRIBUTION, &text)
            }
            Ok(None) => LookupResult::NotFound,
            Err(e) => {
                match &e {
                    MedlinePlusError::Unavailable(cause) => {
                        warn!("MedlinePlus request failed: {}", cause)
                    }
                    MedlinePlusError::Parse(detail) => {
                        warn!("MedlinePlus returned malformed XML: {}", detail)
                    }
                }
                e.into_lookup_result()
            }
        }
    }
}

/// Open summary element being read
struct Capture {
    depth: usize,
    text: String,
    /// Set once a child element starts; only the leading text counts
    saw_child: bool,
}

/// Find the first `<content name="FullSummary">` element and return its text.
///
/// Only the element's own leading text (and CDATA) is taken, up to its first
/// child element. The whole document is read so that a malformed tail is
/// still reported as a parse failure. Returns `Ok(None)` when the element is
/// absent or blank.
pub fn extract_full_summary(xml: &str) -> Result<Option<String>, MedlinePlusError> {
    let mut reader = Reader::from_str(xml);

    let mut depth: usize = 0;
    let mut seen_root = false;
    let mut summary: Option<String> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                open_element(&mut seen_root, depth)?;
                mark_child(&mut capture, depth);
                depth += 1;
                if summary.is_none() && capture.is_none() && is_full_summary(&e)? {
                    capture = Some(Capture {
                        depth,
                        text: String::new(),
                        saw_child: false,
                    });
                }
            }
            Ok(Event::Empty(e)) => {
                open_element(&mut seen_root, depth)?;
                mark_child(&mut capture, depth);
                if summary.is_none() && capture.is_none() && is_full_summary(&e)? {
                    summary = Some(String::new());
                }
            }
            Ok(Event::End(_)) => {
                if capture.as_ref().is_some_and(|c| c.depth == depth) {
                    summary = capture.take().map(|c| c.text);
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| MedlinePlusError::Parse(e.to_string()))?;
                if let Some(c) = capture.as_mut() {
                    if !c.saw_child {
                        c.text.push_str(&text);
                    }
                } else if depth == 0 && !text.trim().is_empty() {
                    return Err(MedlinePlusError::Parse(
                        "text outside the document element".to_string(),
                    ));
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(open) = capture.as_mut().filter(|open| !open.saw_child) {
                    let bytes = c.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| MedlinePlusError::Parse(e.to_string()))?;
                    open.text.push_str(text);
                }
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions, doctype
            Ok(_) => {}
            Err(e) => return Err(MedlinePlusError::Parse(e.to_string())),
        }
    }

    if !seen_root {
        return Err(MedlinePlusError::Parse("no element found".to_string()));
    }
    if depth != 0 {
        return Err(MedlinePlusError::Parse(
            "document ended inside an element".to_string(),
        ));
    }

    Ok(summary
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty()))
}

/// Track the document element; a second top-level element is malformed
fn open_element(seen_root: &mut bool, depth: usize) -> Result<(), MedlinePlusError> {
    if depth == 0 {
        if *seen_root {
            return Err(MedlinePlusError::Parse(
                "junk after document element".to_string(),
            ));
        }
        *seen_root = true;
    }
    Ok(())
}

/// Note a child element opening directly inside the summary element
fn mark_child(capture: &mut Option<Capture>, depth: usize) {
    if let Some(c) = capture.as_mut() {
        if c.depth == depth {
            c.saw_child = true;
        }
    }
}

fn is_full_summary(element: &BytesStart) -> Result<bool, MedlinePlusError> {
    if element.name().as_ref() != b"content" {
        return Ok(false);
    }

    for attr in element.attributes() {
        let attr = attr.map_err(|e| MedlinePlusError::Parse(e.to_string()))?;
        if attr.key.as_ref() == b"name" {
            let value = attr
                .unescape_value()
                .map_err(|e| MedlinePlusError::Parse(e.to_string()))?;
            return Ok(value == FULL_SUMMARY);
        }
    }

    Ok(false)
}
