use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("vSphere API error: {0}")]
    VsphereApi(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
