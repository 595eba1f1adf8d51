use crate::bus::{Delivery, Inbox};
use crate::models::address::TabId;
use crate::models::message::Message;
use crate::services::tab_service::PageHandle;

pub fn show_highlight(page: &PageHandle, snippet: &str) {
    page.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .show_highlight(snippet);
}

pub fn dismiss(page: &PageHandle) {
    page.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .dismiss();
}

/// Handles one message addressed to this page. Never replies.
pub fn handle_delivery(tab: TabId, page: &PageHandle, delivery: Delivery) {
    let envelope = match delivery.envelope() {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(tab = %tab, error = %e, "dropping malformed message");
            return;
        }
    };

    match envelope.message {
        Message::Highlight { text } => show_highlight(page, &text),
        other => {
            tracing::debug!(tab = %tab, action = other.action(), "ignoring message");
        }
    }
}

/// Overlay agent loop for one page; lives until the tab closes or navigates away.
pub async fn run(tab: TabId, mut inbox: Inbox, page: PageHandle) {
    while let Some(delivery) = inbox.recv().await {
        handle_delivery(tab, &page, delivery);
    }
    tracing::debug!(tab = %tab, "content context closed");
}
