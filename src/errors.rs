#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("could not resolve {0}")]
    Resolution(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid wizard transition: {0}")]
    InvalidTransition(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Title and body of the transient notice shown for this error.
    pub fn notice(&self) -> (&'static str, String) {
        match self {
            AppError::Validation(msg) => ("Validation", msg.clone()),
            AppError::Resolution(_) => (
                "Error",
                "Could not resolve city/vehicle/trip type. Please revise your selection."
                    .to_string(),
            ),
            AppError::Transport(_) | AppError::Http(_) => {
                ("Error", "Something went wrong.".to_string())
            }
            AppError::Rejected { message, .. } => ("Request failed", message.clone()),
            AppError::InvalidTransition(msg) => ("Error", msg.clone()),
            AppError::Storage(_) | AppError::Config(_) => ("Error", self.to_string()),
        }
    }
}
