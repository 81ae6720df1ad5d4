//! The subscribe/notify contract between the run engine and its consumers.
//!
//! A [`DocumentCallback`] is invoked synchronously for each document, on the
//! engine's thread, between the plan's suspension points. Callbacks never run
//! concurrently with each other or with the engine, so no locking is required.
//! Any per-run state a callback holds (a file handle, an accumulator, a plot)
//! is created at `start` and discarded at `stop`.
//!
//! Errors returned by a callback propagate to the caller of the run; nothing
//! is swallowed or logged-and-continued at this layer.

use crate::error::AppResult;
use crate::experiment::document::{DescriptorDoc, Document, EventDoc, StartDoc, StopDoc};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

/// A subscriber invoked synchronously for each document.
///
/// All handlers default to no-ops so a callback only implements the stages it
/// cares about. [`DocumentCallback::dispatch`] routes a [`Document`] to the
/// matching handler.
pub trait DocumentCallback {
    fn start(&mut self, _doc: &StartDoc) -> AppResult<()> {
        Ok(())
    }

    fn descriptor(&mut self, _doc: &DescriptorDoc) -> AppResult<()> {
        Ok(())
    }

    fn event(&mut self, _doc: &EventDoc) -> AppResult<()> {
        Ok(())
    }

    fn stop(&mut self, _doc: &StopDoc) -> AppResult<()> {
        Ok(())
    }

    /// Route a document to the matching handler.
    fn dispatch(&mut self, doc: &Document) -> AppResult<()> {
        match doc {
            Document::Start(d) => self.start(d),
            Document::Descriptor(d) => self.descriptor(d),
            Document::Event(d) => self.event(d),
            Document::Stop(d) => self.stop(d),
        }
    }
}

/// Shared single-threaded callbacks.
///
/// Lets a caller keep a handle to a callback (to read accumulated state after
/// the run) while the registry drives it. Execution is single-threaded, so
/// `Rc<RefCell<_>>` is sufficient; the borrow is scoped to one dispatch.
impl<C: DocumentCallback> DocumentCallback for Rc<RefCell<C>> {
    fn start(&mut self, doc: &StartDoc) -> AppResult<()> {
        self.borrow_mut().start(doc)
    }

    fn descriptor(&mut self, doc: &DescriptorDoc) -> AppResult<()> {
        self.borrow_mut().descriptor(doc)
    }

    fn event(&mut self, doc: &EventDoc) -> AppResult<()> {
        self.borrow_mut().event(doc)
    }

    fn stop(&mut self, doc: &StopDoc) -> AppResult<()> {
        self.borrow_mut().stop(doc)
    }
}

/// Topic filter for a subscription. The demos always subscribe to `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionFilter {
    All,
    Start,
    Descriptor,
    Event,
    Stop,
}

impl SubscriptionFilter {
    /// Whether a document passes this filter.
    pub fn matches(&self, doc: &Document) -> bool {
        matches!(
            (self, doc),
            (SubscriptionFilter::All, _)
                | (SubscriptionFilter::Start, Document::Start(_))
                | (SubscriptionFilter::Descriptor, Document::Descriptor(_))
                | (SubscriptionFilter::Event, Document::Event(_))
                | (SubscriptionFilter::Stop, Document::Stop(_))
        )
    }
}

/// Token returned by [`CallbackRegistry::subscribe`], usable to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

/// Ordered list of subscribers with topic filters.
///
/// `publish` invokes matching subscribers in subscription order and returns
/// the first error encountered.
#[derive(Default)]
pub struct CallbackRegistry {
    subs: Vec<Option<(SubscriptionFilter, Box<dyn DocumentCallback>)>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for documents matching `filter`.
    pub fn subscribe(
        &mut self,
        filter: SubscriptionFilter,
        callback: Box<dyn DocumentCallback>,
    ) -> SubscriptionId {
        self.subs.push(Some((filter, callback)));
        SubscriptionId(self.subs.len() - 1)
    }

    /// Remove a previously registered callback.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        if let Some(slot) = self.subs.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subs.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a document to every matching subscriber, synchronously.
    pub fn publish(&mut self, doc: &Document) -> AppResult<()> {
        debug!("publishing {} document", doc_kind(doc));
        for slot in self.subs.iter_mut().flatten() {
            let (filter, callback) = slot;
            if filter.matches(doc) {
                callback.dispatch(doc)?;
            }
        }
        Ok(())
    }
}

fn doc_kind(doc: &Document) -> &'static str {
    match doc {
        Document::Start(_) => "start",
        Document::Descriptor(_) => "descriptor",
        Document::Event(_) => "event",
        Document::Stop(_) => "stop",
    }
}
