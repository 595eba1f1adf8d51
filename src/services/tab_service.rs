use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use url::Url;

use crate::bus::MessageBus;
use crate::commands::content_commands;
use crate::error::AppError;
use crate::models::address::{TabId, Target};
use crate::services::overlay_service::PageDocument;

pub type PageHandle = Arc<Mutex<PageDocument>>;

const SCRIPTABLE_SCHEMES: &[&str] = &["http", "https"];

struct Tab {
    url: String,
    page: PageHandle,
    agent: Option<JoinHandle<()>>,
}

impl Drop for Tab {
    fn drop(&mut self) {
        if let Some(agent) = self.agent.take() {
            agent.abort();
        }
    }
}

fn parse_navigation_url(url: &str) -> Result<Url, AppError> {
    Url::parse(url).map_err(|e| AppError::Navigation(format!("cannot open '{url}': {e}")))
}

/// Content scripts are only injected into web pages.
pub fn accepts_content_scripts(url: &Url) -> bool {
    SCRIPTABLE_SCHEMES.contains(&url.scheme())
}

/// In-process browser: owns tabs and injects one overlay agent per web page.
#[derive(Clone)]
pub struct BrowserHost {
    bus: MessageBus,
    next_tab: Arc<AtomicU64>,
    tabs: Arc<Mutex<HashMap<TabId, Tab>>>,
}

impl BrowserHost {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            next_tab: Arc::new(AtomicU64::new(0)),
            tabs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn load(&self, id: TabId, raw_url: &str, url: &Url) -> Tab {
        let page: PageHandle = Arc::new(Mutex::new(PageDocument::new(raw_url)));
        let target = Target::content(id);
        let agent = if accepts_content_scripts(url) {
            let inbox = self.bus.register(target);
            Some(tokio::spawn(content_commands::run(id, inbox, page.clone())))
        } else {
            self.bus.unregister(target);
            None
        };
        Tab {
            url: raw_url.to_string(),
            page,
            agent,
        }
    }

    /// Opens a new tab. The content context is reachable once this returns.
    /// Must be called inside a tokio runtime.
    pub fn open_tab(&self, url: &str) -> Result<TabId, AppError> {
        let parsed = parse_navigation_url(url)?;
        let id = TabId(self.next_tab.fetch_add(1, Ordering::SeqCst) + 1);
        let tab = self.load(id, url, &parsed);
        let scripted = tab.agent.is_some();

        self.tabs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, tab);
        tracing::info!(tab = %id, %url, scripted, "tab opened");
        Ok(id)
    }

    /// Loads `url` into an existing tab with a fresh document.
    /// Must be called inside a tokio runtime.
    pub fn navigate(&self, id: TabId, url: &str) -> Result<(), AppError> {
        let parsed = parse_navigation_url(url)?;
        let mut tabs = self
            .tabs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !tabs.contains_key(&id) {
            return Err(AppError::Navigation(format!("no such tab: {id}")));
        }
        // Old agent is aborted when the replaced tab drops.
        tabs.insert(id, self.load(id, url, &parsed));
        tracing::info!(tab = %id, %url, "tab navigated");
        Ok(())
    }

    pub fn close_tab(&self, id: TabId) -> Result<(), AppError> {
        let removed = self
            .tabs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id);
        match removed {
            Some(_) => {
                self.bus.unregister(Target::content(id));
                tracing::info!(tab = %id, "tab closed");
                Ok(())
            }
            None => Err(AppError::Navigation(format!("no such tab: {id}"))),
        }
    }

    pub fn page(&self, id: TabId) -> Option<PageHandle> {
        self.tabs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .map(|tab| tab.page.clone())
    }

    pub fn tab_url(&self, id: TabId) -> Option<String> {
        self.tabs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .map(|tab| tab.url.clone())
    }

    pub fn tab_count(&self) -> usize {
        self.tabs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
