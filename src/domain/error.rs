// src/domain/error.rs
use thiserror::Error;

/// Fallback text when the backend gives no usable `detail`
pub const GENERIC_BACKEND_MESSAGE: &str = "An error occurred while talking to the backend";

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Note not found: {0}")]
    NoteNotFound(i64),
    #[error("Folder not found: {0}")]
    FolderNotFound(i64),
    #[error("Challenge not found: {0}")]
    ChallengeNotFound(i64),
    #[error("Tool not found: {0}")]
    ToolNotFound(i64),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Backend rejected request ({status}): {detail}")]
    Backend { status: u16, detail: String },
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Cannot move folder {folder} under {target}: it would become its own ancestor")]
    FolderCycle { folder: i64, target: i64 },
    #[error("No note is active")]
    NoActiveNote,
    #[error("File error: {0}")]
    Io(String),
}

impl DomainError {
    /// Message suitable for the dismissible error area of the console
    pub fn user_message(&self) -> String {
        match self {
            DomainError::Backend { detail, .. } if !detail.trim().is_empty() => detail.clone(),
            DomainError::Backend { .. } | DomainError::Transport(_) | DomainError::Decode(_) => {
                GENERIC_BACKEND_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Form validation failures; these block submission and never reach the backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_backend_detail_when_building_user_message_then_returns_detail() {
        let err = DomainError::Backend {
            status: 404,
            detail: "Challenge not found".to_string(),
        };
        assert_eq!(err.user_message(), "Challenge not found");
    }

    #[test]
    fn given_transport_failure_when_building_user_message_then_returns_generic_text() {
        let err = DomainError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), GENERIC_BACKEND_MESSAGE);
    }

    #[test]
    fn given_missing_field_when_displaying_then_names_field() {
        let err: DomainError = ValidationError::MissingField("title").into();
        assert_eq!(err.to_string(), "title is required");
    }
}
