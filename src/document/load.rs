use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::{LoadError, SourceDocument, parse_document};

const SCAN_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Scan(ScanRequest),
}

impl DocumentSource {
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Scan(request) => format!("{} via {}", request.repo_root, request.endpoint),
        }
    }
}

/// Request sent to the analysis backend's scan endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScanRequest {
    #[serde(skip)]
    pub endpoint: String,
    pub repo_root: String,
    pub include_tests: bool,
    pub max_depth: u32,
}

pub fn load_document(source: &DocumentSource) -> Result<SourceDocument, LoadError> {
    match source {
        DocumentSource::File(path) => {
            let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            parse_document(&raw)
        }
        DocumentSource::Scan(request) => scan(request),
    }
}

fn scan(request: &ScanRequest) -> Result<SourceDocument, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(SCAN_TIMEOUT)
        .build()?;
    let response = client.post(&request.endpoint).json(request).send()?;

    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<Value>()
            .ok()
            .and_then(|body| body.get("detail").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());
        return Err(LoadError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    let body = response.json::<Value>()?;
    SourceDocument::from_value(&body)
}
