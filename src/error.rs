use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search request failed (HTTP {0})")]
    Status(u16),

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),

    #[error("No query provided")]
    InvalidQuery,

    #[error("Message delivery failed: {0}")]
    Delivery(String),

    #[error("No reply received from the background coordinator")]
    NoReply,

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    General(String),
}

impl AppError {
    pub fn capture(self) -> Self {
        tracing::error!(error = %self, "operation failed");
        self
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
