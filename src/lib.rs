pub mod bus;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

use commands::background_commands;
use commands::popup_commands::PopupController;
use config::ExtensionConfig;
use error::AppError;
use models::address::Target;
use services::search_service::SearchClient;
use services::tab_service::BrowserHost;
use tokio::task::JoinHandle;

/// Installs the global tracing subscriber. `RUST_LOG` wins over `default_directive`.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// A running extension: the background coordinator, the browser host and the bus
/// between them. Popups are opened on demand.
pub struct Extension {
    bus: bus::MessageBus,
    browser: BrowserHost,
    background: JoinHandle<()>,
}

impl Extension {
    /// Must be called inside a tokio runtime.
    pub fn start(config: ExtensionConfig) -> Result<Self, AppError> {
        config.validate()?;
        let client = SearchClient::new(&config)?;
        let bus = bus::MessageBus::new();
        let inbox = bus.register(Target::background());
        let background = tokio::spawn(background_commands::run(inbox, client));
        let browser = BrowserHost::new(bus.clone());
        tracing::info!(endpoint = %config.endpoint, "extension started");

        Ok(Self {
            bus,
            browser,
            background,
        })
    }

    pub fn browser(&self) -> &BrowserHost {
        &self.browser
    }

    pub fn open_popup(&self) -> PopupController {
        PopupController::new(self.bus.clone(), self.browser.clone())
    }

    pub fn shutdown(self) {
        self.bus.unregister(Target::background());
        self.background.abort();
        tracing::info!("extension stopped");
    }
}
