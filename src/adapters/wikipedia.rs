//! Wikipedia summary client
//!
//! Fetches a short plain-text introduction for a page title through the
//! MediaWiki Action API. Titles are used verbatim (redirects are followed,
//! search suggestions are not).
//! See: https://www.mediawiki.org/wiki/API:Main_page

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::DefinitionSource;
use crate::models::{
    ambiguity_message, not_found_message, AppSettings, LookupResult, Term, WIKIPEDIA_SOURCE,
};
use crate::utils::http::{build_client, fetch_text, HttpError};

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    disambiguation: Option<String>,
}

/// Response to `action=parse`
#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsedPage>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    /// Rendered page HTML
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

/// What the summary query found for a title
#[derive(Debug, PartialEq)]
enum PageSummary {
    Extract(String),
    /// Disambiguation page, under its resolved title
    Disambiguation(String),
}

/// Failures while fetching a Wikipedia summary
#[derive(Debug, thiserror::Error)]
pub enum WikipediaError {
    #[error("page not found")]
    PageNotFound,
    #[error("title refers to several pages")]
    Disambiguation(Vec<String>),
    #[error("{0}")]
    Api(String),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl WikipediaError {
    /// Convert into the result shown to the user for `term`
    pub fn into_lookup_result(self, term: &Term, max_candidates: usize) -> LookupResult {
        let message = match self {
            WikipediaError::PageNotFound => not_found_message(term),
            WikipediaError::Disambiguation(options) => {
                ambiguity_message(term, &options, max_candidates)
            }
            other => other.to_string(),
        };
        LookupResult::service_error(WIKIPEDIA_SOURCE, message)
    }
}

/// Client for the MediaWiki Action API
pub struct WikipediaClient {
    client: Client,
    api_url: String,
    sentences: u32,
    max_candidates: usize,
}

impl WikipediaClient {
    /// Create a new client from settings
    pub fn new(settings: &AppSettings) -> Result<Self, String> {
        let client = build_client(settings.request_timeout(), &settings.user_agent)?;
        Ok(Self::with_client(client, settings))
    }

    /// Create a new client with an existing reqwest client
    pub fn with_client(client: Client, settings: &AppSettings) -> Self {
        Self {
            client,
            api_url: settings.wikipedia_api_url.clone(),
            sentences: settings.summary_sentences,
            max_candidates: settings.max_candidates,
        }
    }

    fn summary_url(&self, title: &str) -> String {
        format!(
            "{}?action=query&format=json&formatversion=2&prop=extracts|pageprops&ppprop=disambiguation&explaintext=1&exsentences={}&redirects=1&titles={}",
            self.api_url,
            self.sentences,
            urlencoding::encode(title)
        )
    }

    fn page_html_url(&self, title: &str) -> String {
        format!(
            "{}?action=parse&format=json&formatversion=2&prop=text&redirects=1&page={}",
            self.api_url,
            urlencoding::encode(title)
        )
    }

    /// Fetch the opening sentences of the page for a term
    ///
    /// # Returns
    /// * `Ok(summary)` - Plain-text summary of at most the configured sentence count
    /// * `Err(WikipediaError)` - Missing page, disambiguation page, or request failure
    pub async fn find_summary(&self, term: &Term) -> Result<String, WikipediaError> {
        debug!("Wikipedia summary lookup for: {}", term);

        let body = fetch_text(&self.client, &self.summary_url(term.as_str())).await?;

        match parse_summary(&body)? {
            PageSummary::Extract(summary) => Ok(summary),
            PageSummary::Disambiguation(title) => {
                debug!("Wikipedia title {} is a disambiguation page", title);
                let body = fetch_text(&self.client, &self.page_html_url(&title)).await?;
                Err(WikipediaError::Disambiguation(parse_candidates(&body)?))
            }
        }
    }
}

#[async_trait]
impl DefinitionSource for WikipediaClient {
    fn name(&self) -> &str {
        WIKIPEDIA_SOURCE
    }

    async fn lookup(&self, term: &Term) -> LookupResult {
        match self.find_summary(term).await {
            Ok(summary) => {
                info!("Found Wikipedia summary for {}", term);
                LookupResult::found(WIKIPEDIA_SOURCE, &summary)
            }
            Err(e) => {
                match &e {
                    WikipediaError::PageNotFound => debug!("No Wikipedia page for {}", term),
                    WikipediaError::Disambiguation(options) => {
                        debug!("{} is ambiguous on Wikipedia ({} candidates)", term, options.len())
                    }
                    other => warn!("Wikipedia lookup failed: {}", other),
                }
                e.into_lookup_result(term, self.max_candidates)
            }
        }
    }
}

fn api_error(err: ApiError) -> WikipediaError {
    WikipediaError::Api(format!("{}: {}", err.code, err.info))
}

fn decode(body: &str) -> Result<QueryResponse, WikipediaError> {
    let resp: QueryResponse =
        serde_json::from_str(body).map_err(|e| WikipediaError::Decode(e.to_string()))?;

    if let Some(err) = resp.error {
        return Err(api_error(err));
    }

    Ok(resp)
}

fn first_page(resp: QueryResponse) -> Result<Page, WikipediaError> {
    resp.query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(|| WikipediaError::Decode("response has no pages".to_string()))
}

/// Classify the response to a summary query
fn parse_summary(body: &str) -> Result<PageSummary, WikipediaError> {
    let page = first_page(decode(body)?)?;

    if page.missing || page.invalid {
        return Err(WikipediaError::PageNotFound);
    }

    if page
        .pageprops
        .as_ref()
        .is_some_and(|props| props.disambiguation.is_some())
    {
        return Ok(PageSummary::Disambiguation(page.title));
    }

    match page.extract {
        Some(extract) if !extract.trim().is_empty() => {
            Ok(PageSummary::Extract(extract.trim().to_string()))
        }
        _ => Err(WikipediaError::PageNotFound),
    }
}

/// Candidate titles listed on a rendered disambiguation page, in page order.
///
/// Each list item outside the table of contents contributes the text of its
/// first link; items without a link are skipped.
fn parse_candidates(body: &str) -> Result<Vec<String>, WikipediaError> {
    let resp: ParseResponse =
        serde_json::from_str(body).map_err(|e| WikipediaError::Decode(e.to_string()))?;

    if let Some(err) = resp.error {
        return Err(api_error(err));
    }

    let page = resp
        .parse
        .ok_or_else(|| WikipediaError::Decode("response has no parsed page".to_string()))?;

    let item_sel = Selector::parse("li").map_err(|e| WikipediaError::Decode(e.to_string()))?;
    let link_sel = Selector::parse("a").map_err(|e| WikipediaError::Decode(e.to_string()))?;

    let html = Html::parse_fragment(&page.text);
    let candidates = html
        .select(&item_sel)
        .filter(|item| !item.value().classes().any(|class| class.contains("tocsection")))
        .filter_map(|item| item.select(&link_sel).next())
        .map(|link| link.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .collect();

    Ok(candidates)
}
