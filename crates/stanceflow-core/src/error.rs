use thiserror::Error;

#[derive(Debug, Error)]
pub enum StanceflowError {
    // Collaborator errors (model invocation)
    #[error("model request failed: {0}")]
    ModelRequest(String),

    #[error("model stream error: {0}")]
    ModelStream(String),

    #[error("model returned an empty response")]
    EmptyModelResponse,

    // Graph errors
    #[error("node '{0}' not found in graph")]
    UnknownNode(String),

    #[error("invalid graph: {0}")]
    Graph(String),

    // Run errors
    #[error("run cancelled")]
    Cancelled,

    // Config errors
    #[error("config error: {0}")]
    Config(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StanceflowError {
    /// Whether this error originated in an external collaborator call.
    /// Collaborator errors fail the run but keep the partial state.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            Self::ModelRequest(_) | Self::ModelStream(_) | Self::EmptyModelResponse
        )
    }
}

pub type Result<T> = std::result::Result<T, StanceflowError>;
