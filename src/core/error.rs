use std::fmt;
use thiserror::Error;

/// A single failed field rule.
///
/// `field` is `None` for form-level problems (missing asset, missing
/// identifier) that do not belong to one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn form(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Collected local validation failures for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Messages attached to one field, in rule order.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.field.as_deref() == Some(field))
            .map(|e| e.message.as_str())
    }

    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("{0}")]
    MutationRejected(String),

    #[error("{0}")]
    FetchFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn validation(error: FieldError) -> Self {
        Self::ValidationFailed(ValidationErrors::single(error))
    }

    /// Text shown to the user in a notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationFailed(errors) => errors
                .first_message()
                .map(str::to_string)
                .unwrap_or_else(|| "Validation failed".to_string()),
            Self::UploadFailed(message)
            | Self::MutationRejected(message)
            | Self::FetchFailed(message) => message.clone(),
            Self::Config(message) => format!("Configuration error: {}", message),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
