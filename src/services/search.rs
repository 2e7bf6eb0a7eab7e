//! Foreground search controller
//!
//! Owns the "request in flight" guard and the single-slot channel the
//! background worker hands its result back through. At most one search runs
//! at a time; requests made while one is running are refused, not queued.

use std::any::Any;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::resolver::LookupResolver;
use crate::models::{EmptyInputError, LookupResult, Term, TERM_FINDER_SOURCE};

/// Receives finished results on the controller owner's task
pub trait ResultSink {
    fn on_result_ready(&mut self, result: LookupResult);
}

impl ResultSink for Vec<LookupResult> {
    fn on_result_ready(&mut self, result: LookupResult) {
        self.push(result);
    }
}

/// What happened to a search request
#[derive(Debug, PartialEq)]
pub enum SearchDispatch {
    /// A worker was started for this term
    Dispatched(Term),
    /// Another search is still running
    Busy,
    /// Nothing to search for; no request was made
    EmptyInput(EmptyInputError),
}

/// Owner of the search state; lives on the foreground task
pub struct SearchController {
    resolver: LookupResolver,
    in_flight: bool,
    sender: mpsc::Sender<LookupResult>,
    receiver: mpsc::Receiver<LookupResult>,
}

impl SearchController {
    pub fn new(resolver: LookupResolver) -> Self {
        let (sender, receiver) = mpsc::channel(1);
        Self {
            resolver,
            in_flight: false,
            sender,
            receiver,
        }
    }

    /// Whether a search is running (input should be disabled)
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Validate the raw input and, if possible, start a background search
    pub fn on_search_requested(&mut self, raw_input: &str) -> SearchDispatch {
        let term = match Term::normalize(raw_input) {
            Ok(term) => term,
            Err(e) => return SearchDispatch::EmptyInput(e),
        };

        if self.in_flight {
            warn!("Search for {} refused: another search is running", term);
            return SearchDispatch::Busy;
        }

        self.in_flight = true;
        spawn_search(self.resolver.clone(), term.clone(), self.sender.clone());

        SearchDispatch::Dispatched(term)
    }

    /// Wait for the running search and hand its result to the sink.
    ///
    /// Returns `false` straight away when nothing is in flight.
    pub async fn deliver_next<S: ResultSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        if !self.in_flight {
            return false;
        }

        match self.receiver.recv().await {
            Some(result) => {
                self.finish(result, sink);
                true
            }
            None => false,
        }
    }

    /// Hand over a result only if it is already waiting in the slot
    pub fn drain_ready<S: ResultSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        if !self.in_flight {
            return false;
        }

        match self.receiver.try_recv() {
            Ok(result) => {
                self.finish(result, sink);
                true
            }
            Err(_) => false,
        }
    }

    fn finish<S: ResultSink + ?Sized>(&mut self, result: LookupResult, sink: &mut S) {
        self.in_flight = false;
        sink.on_result_ready(result);
    }
}

/// Run the resolver on its own task and post exactly one result to the slot
fn spawn_search(resolver: LookupResolver, term: Term, slot: mpsc::Sender<LookupResult>) {
    let request_id = Uuid::new_v4();
    let span = info_span!("search", %request_id, term = %term);

    tokio::spawn(
        async move {
            info!("Search started");

            let worker = tokio::spawn(async move { resolver.resolve(&term).await }.in_current_span());

            let result = match worker.await {
                Ok(result) => result,
                Err(e) => {
                    error!("Search worker failed: {}", e);
                    LookupResult::service_error(TERM_FINDER_SOURCE, describe_join_error(e))
                }
            };

            if slot.send(result).await.is_err() {
                warn!("Search finished after the controller was dropped");
            }
        }
        .instrument(span),
    );
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        format!("lookup crashed: {}", panic_message(err.into_panic()))
    } else {
        "lookup was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fake::FakeSource;
    use crate::models::{MEDLINEPLUS_ATTRIBUTION, MEDLINEPLUS_SOURCE, WIKIPEDIA_SOURCE};
    use std::sync::Arc;
    use std::time::Duration;

    fn medlineplus_hit() -> LookupResult {
        LookupResult::found(MEDLINEPLUS_ATTRIBUTION, "High blood sugar")
    }

    #[tokio::test]
    async fn test_blank_input_never_reaches_sources() {
        let primary = FakeSource::new(MEDLINEPLUS_SOURCE, medlineplus_hit());
        let fallback = FakeSource::new(WIKIPEDIA_SOURCE, LookupResult::NotFound);
        let mut controller =
            SearchController::new(LookupResolver::new(primary.clone(), fallback.clone()));

        for raw in ["", "   ", "\t\n"] {
            assert_eq!(
                controller.on_search_requested(raw),
                SearchDispatch::EmptyInput(EmptyInputError)
            );
        }

        assert!(!controller.is_busy());
        let mut sink: Vec<LookupResult> = Vec::new();
        assert!(!controller.deliver_next(&mut sink).await);
        assert_eq!(primary.calls(), 0);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_delivers_one_result_and_clears_guard() {
        let primary = FakeSource::new(MEDLINEPLUS_SOURCE, medlineplus_hit());
        let fallback = FakeSource::new(WIKIPEDIA_SOURCE, LookupResult::NotFound);
        let mut controller = SearchController::new(LookupResolver::new(primary, fallback));

        let dispatch = controller.on_search_requested("  diabetes ");
        assert_eq!(
            dispatch,
            SearchDispatch::Dispatched(Term::normalize("diabetes").unwrap())
        );
        assert!(controller.is_busy());

        let mut sink: Vec<LookupResult> = Vec::new();
        assert!(controller.deliver_next(&mut sink).await);
        assert_eq!(sink, vec![medlineplus_hit()]);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_overlapping_search_is_refused() {
        let primary = FakeSource::gated(MEDLINEPLUS_SOURCE, medlineplus_hit());
        let fallback = FakeSource::new(WIKIPEDIA_SOURCE, LookupResult::NotFound);
        let mut controller = SearchController::new(LookupResolver::new(primary.clone(), fallback));
        let mut sink: Vec<LookupResult> = Vec::new();

        assert!(matches!(
            controller.on_search_requested("diabetes"),
            SearchDispatch::Dispatched(_)
        ));
        assert_eq!(controller.on_search_requested("asthma"), SearchDispatch::Busy);
        assert!(!controller.drain_ready(&mut sink));

        primary.release();
        assert!(controller.deliver_next(&mut sink).await);
        assert_eq!(sink.len(), 1);
        assert_eq!(primary.calls(), 1);

        // Guard is clear again, so the next search goes through
        assert!(matches!(
            controller.on_search_requested("asthma"),
            SearchDispatch::Dispatched(_)
        ));
        primary.release();
        assert!(controller.deliver_next(&mut sink).await);
        assert_eq!(sink.len(), 2);
        assert_eq!(primary.calls(), 2);
    }

    #[tokio::test]
    async fn test_drain_ready_picks_up_finished_result() {
        let primary = FakeSource::new(MEDLINEPLUS_SOURCE, medlineplus_hit());
        let fallback = FakeSource::new(WIKIPEDIA_SOURCE, LookupResult::NotFound);
        let mut controller = SearchController::new(LookupResolver::new(primary, fallback));
        let mut sink: Vec<LookupResult> = Vec::new();

        controller.on_search_requested("diabetes");

        let mut delivered = false;
        for _ in 0..200 {
            if controller.drain_ready(&mut sink) {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(delivered);
        assert_eq!(sink, vec![medlineplus_hit()]);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_worker_panic_becomes_service_error() {
        let primary = FakeSource::panicking(MEDLINEPLUS_SOURCE);
        let fallback = FakeSource::new(WIKIPEDIA_SOURCE, LookupResult::NotFound);
        let mut controller = SearchController::new(LookupResolver::new(primary, fallback.clone()));
        let mut sink: Vec<LookupResult> = Vec::new();

        controller.on_search_requested("diabetes");
        assert!(controller.deliver_next(&mut sink).await);

        assert_eq!(
            sink,
            vec![LookupResult::service_error(
                "Term Finder",
                "lookup crashed: MedlinePlus exploded"
            )]
        );
        assert_eq!(fallback.calls(), 0);
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new("owned".to_string())), "owned");
        assert_eq!(panic_message(Box::new(42u8)), "unknown panic");
    }

    #[tokio::test]
    async fn test_fallback_result_reaches_sink() {
        let primary: Arc<FakeSource> = FakeSource::new(MEDLINEPLUS_SOURCE, LookupResult::NotFound);
        let fallback = FakeSource::new(
            WIKIPEDIA_SOURCE,
            LookupResult::found(WIKIPEDIA_SOURCE, "A summary."),
        );
        let mut controller =
            SearchController::new(LookupResolver::new(primary.clone(), fallback.clone()));
        let mut sink: Vec<LookupResult> = Vec::new();

        controller.on_search_requested("aspirin");
        controller.deliver_next(&mut sink).await;

        assert_eq!(sink[0].source_name(), Some("Wikipedia"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }
}
