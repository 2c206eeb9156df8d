use thiserror::Error;

/// Failure to obtain a batch of prices from a provider. The whole cycle is skipped.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("provider API error (code {code}): {msg}")]
    Api { code: i64, msg: String },
}

/// A single ticker record that could not be turned into a quote. Only that record is skipped.
#[derive(Error, Debug)]
#[error("malformed ticker record for {}: {reason}", symbol.as_deref().unwrap_or("<unknown>"))]
pub struct MalformedRecord {
    pub symbol: Option<String>,
    pub reason: String,
}

/// Alert delivery failure. Logged by the caller, never retried.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// A panic caught at a cycle boundary.
#[derive(Error, Debug, Clone)]
#[error("poll cycle fault: {message}")]
pub struct LoopFault {
    pub message: String,
}

impl LoopFault {
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}
