#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Source unavailable: {source_name} ({reason})")]
    SourceUnavailable { source_name: String, reason: String },
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}
