use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use crate::models::message::RequestId;
use crate::models::search::SearchResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PopupView {
    Idle,
    Loading { query: String },
    Results { results: Vec<SearchResult> },
    NoResults,
    Error { message: String },
}

/// Per-popup state: the rendered view and the id of the most recent search.
pub struct PopupState {
    view: Mutex<PopupView>,
    latest_request: AtomicU64,
    notification_seq: AtomicU64,
}

impl Default for PopupState {
    fn default() -> Self {
        Self {
            view: Mutex::new(PopupView::Idle),
            latest_request: AtomicU64::new(0),
            notification_seq: AtomicU64::new(0),
        }
    }
}

impl PopupState {
    pub fn view(&self) -> PopupView {
        self.view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn latest_request(&self) -> RequestId {
        RequestId(self.latest_request.load(Ordering::SeqCst))
    }

    /// Takes a fresh request id and switches the view to loading.
    pub fn begin_request(&self, query: &str) -> RequestId {
        let mut view = self
            .view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        *view = PopupView::Loading {
            query: query.to_string(),
        };
        RequestId(id)
    }

    /// Applies `next` only if `id` is still the latest request. Returns whether it was applied.
    pub fn complete_request(&self, id: RequestId, next: PopupView) -> bool {
        let mut view = self
            .view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.latest_request.load(Ordering::SeqCst) != id.0 {
            return false;
        }
        *view = next;
        true
    }

    /// Ends the session: in-flight searches become stale and results are dropped.
    pub fn close(&self) {
        let mut view = self
            .view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.latest_request.fetch_add(1, Ordering::SeqCst);
        *view = PopupView::Idle;
    }

    /// Ids for fire-and-forget messages. Separate from search ids so a highlight
    /// never supersedes a pending search.
    pub fn next_notification_id(&self) -> RequestId {
        RequestId(self.notification_seq.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn current_results(&self) -> Vec<SearchResult> {
        match self.view() {
            PopupView::Results { results } => results,
            _ => Vec::new(),
        }
    }
}
