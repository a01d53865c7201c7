use tracing::{error, warn};

/// Failures the study tool surfaces to the user.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("No quiz files found under {0}")]
    NoQuizFiles(String),

    #[error("Quiz file {path} could not be loaded: {reason}")]
    MalformedFile { path: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid exam date '{value}' for course {course}")]
    InvalidExamDate { course: String, value: String },
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
    pub user_friendly_message: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
            user_friendly_message: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn with_user_message(mut self, message: &str) -> Self {
        self.user_friendly_message = Some(message.to_string());
        self
    }
}

impl QuizError {
    /// Log the error with its context and return the line to show the user.
    pub fn report_with_context(self, context: ErrorContext) -> String {
        match &self {
            QuizError::MalformedFile { .. } => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Skipping unreadable quiz file"
                );
                context
                    .user_friendly_message
                    .unwrap_or_else(|| self.to_string())
            }
            QuizError::InvalidExamDate { .. } => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Ignoring exam date"
                );
                context
                    .user_friendly_message
                    .unwrap_or_else(|| self.to_string())
            }
            QuizError::Storage(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Storage error"
                );
                context.user_friendly_message.unwrap_or_else(|| {
                    format!("Could not save {}. Progress will be retried on the next answer.", context.resource_type)
                })
            }
            QuizError::NoQuizFiles(_) | QuizError::Config(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Fatal error"
                );
                context
                    .user_friendly_message
                    .unwrap_or_else(|| self.to_string())
            }
        }
    }
}
