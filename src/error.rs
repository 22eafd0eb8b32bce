use thiserror::Error;

/// Error types that can occur when talking to the remote API.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// Authentication and authorization errors
    #[error("Auth error: {0}")]
    AuthError(String),
    /// Invalid request parameters or format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// API response parsing or format error
    #[error("Response format error: {message}. Raw response: {raw_response}")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// A stream frame whose payload could not be decoded
    #[error("JSON Parse on {raw} with error {message}")]
    StreamParse { raw: String, message: String },
    /// An `event: error` frame sent by the server mid-stream
    #[error("Stream error event: {payload}")]
    StreamError { payload: String },
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    JsonError(String),
    /// Local file-system errors
    #[error("IO error: {0}")]
    Io(String),
    /// Client configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Converts reqwest HTTP errors into LlmErrors
impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        LLMError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        LLMError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<std::io::Error> for LLMError {
    fn from(err: std::io::Error) -> Self {
        LLMError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for LLMError {
    fn from(err: toml::de::Error) -> Self {
        LLMError::Config(err.to_string())
    }
}
