use std::sync::Arc;

use crate::bus::MessageBus;
use crate::error::AppError;
use crate::models::address::{TabId, Target};
use crate::models::message::{Envelope, Message, ReplyEnvelope};
use crate::models::search::{Query, SearchReply, SearchResult};
use crate::services::render_service;
use crate::services::tab_service::BrowserHost;
use crate::state::{PopupState, PopupView};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    /// A newer search was submitted before this reply arrived.
    Superseded,
    Displayed(Vec<SearchResult>),
    Failed(String),
}

/// One open popup. Closing it drops any reply still in flight.
#[derive(Clone)]
pub struct PopupController {
    bus: MessageBus,
    browser: BrowserHost,
    state: Arc<PopupState>,
}

impl PopupController {
    pub fn new(bus: MessageBus, browser: BrowserHost) -> Self {
        Self {
            bus,
            browser,
            state: Arc::new(PopupState::default()),
        }
    }

    pub fn view(&self) -> PopupView {
        self.state.view()
    }

    pub fn render_html(&self) -> String {
        render_service::render_html(&self.state.view())
    }

    pub fn render_text(&self) -> String {
        render_service::render_text(&self.state.view())
    }

    pub async fn submit_search(&self, input: &str) -> SubmitOutcome {
        let Ok(query) = Query::parse(input) else {
            return SubmitOutcome::Ignored;
        };

        let id = self.state.begin_request(query.as_str());
        let envelope = Envelope::new(
            id,
            Message::Search {
                query: query.to_string(),
            },
        );
        let reply = self
            .bus
            .request::<ReplyEnvelope>(Target::background(), &envelope)
            .await;

        let (view, outcome) = match reply {
            Ok(reply) if reply.id != id => {
                let message = format!("Mismatched reply {} for request {id}", reply.id);
                (
                    PopupView::Error {
                        message: message.clone(),
                    },
                    SubmitOutcome::Failed(message),
                )
            }
            Ok(ReplyEnvelope {
                reply: SearchReply::Results { results },
                ..
            }) => {
                let view = if results.is_empty() {
                    PopupView::NoResults
                } else {
                    PopupView::Results {
                        results: results.clone(),
                    }
                };
                (view, SubmitOutcome::Displayed(results))
            }
            Ok(ReplyEnvelope {
                reply: SearchReply::Error { error },
                ..
            }) => (
                PopupView::Error {
                    message: error.clone(),
                },
                SubmitOutcome::Failed(error),
            ),
            Err(e) => {
                let message = e.capture().to_string();
                (
                    PopupView::Error {
                        message: message.clone(),
                    },
                    SubmitOutcome::Failed(message),
                )
            }
        };

        if !self.state.complete_request(id, view) {
            tracing::debug!(request = %id, "discarding stale search reply");
            return SubmitOutcome::Superseded;
        }
        outcome
    }

    /// Opens `result.url` in a new tab and asks that tab's page to highlight the snippet.
    /// Must be called inside a tokio runtime.
    pub fn select_result(&self, result: &SearchResult) -> Result<TabId, AppError> {
        let tab = self.browser.open_tab(&result.url)?;
        let envelope = Envelope::new(
            self.state.next_notification_id(),
            Message::Highlight {
                text: result.snippet.clone(),
            },
        );
        if let Err(e) = self.bus.notify(Target::content(tab), &envelope) {
            tracing::debug!(tab = %tab, error = %e, "highlight not delivered");
        }
        Ok(tab)
    }

    /// Selects the result at `index` (0-based) of the current results view.
    pub fn select_index(&self, index: usize) -> Result<TabId, AppError> {
        let results = self.state.current_results();
        let result = results
            .get(index)
            .ok_or_else(|| AppError::General(format!("no result at position {}", index + 1)))?;
        self.select_result(result)
    }

    /// Replies still in flight on other handles are discarded once this returns.
    pub fn close(self) {
        self.state.close();
        tracing::debug!(latest = %self.state.latest_request(), "popup closed");
    }
}
