use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("unexpected document shape: {0}")]
    Shape(String),
    #[error("request to the analysis backend failed")]
    Http(#[from] reqwest::Error),
    #[error("analysis backend returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("background load worker disconnected")]
    WorkerDisconnected,
}
