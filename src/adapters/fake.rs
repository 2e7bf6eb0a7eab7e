//! Scripted definition source for resolver and controller tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use super::DefinitionSource;
use crate::models::{LookupResult, Term};

/// Source that always answers the same and counts its calls.
///
/// A gated source holds every answer until `release` is called; a panicking
/// source crashes instead of answering.
pub struct FakeSource {
    name: &'static str,
    answer: LookupResult,
    calls: AtomicUsize,
    gate: Option<Notify>,
    panics: bool,
}

impl FakeSource {
    pub fn new(name: &'static str, answer: LookupResult) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer,
            calls: AtomicUsize::new(0),
            gate: None,
            panics: false,
        })
    }

    pub fn gated(name: &'static str, answer: LookupResult) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer,
            calls: AtomicUsize::new(0),
            gate: Some(Notify::new()),
            panics: false,
        })
    }

    pub fn panicking(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            answer: LookupResult::NotFound,
            calls: AtomicUsize::new(0),
            gate: None,
            panics: true,
        })
    }

    /// Let one waiting (or the next) lookup answer
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DefinitionSource for FakeSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn lookup(&self, _term: &Term) -> LookupResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.panics {
            panic!("{} exploded", self.name);
        }
        self.answer.clone()
    }
}
