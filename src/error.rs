use thiserror::Error;

pub type Result<T> = std::result::Result<T, VisitorError>;

/// Every failure the app surfaces to the user. Messages are shown verbatim
/// in the UI toast layer, so they stay in user-facing wording.
#[derive(Debug, Error)]
pub enum VisitorError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("{0}")]
    Store(String),

    #[error("Incorrect password")]
    Credential,

    #[error("Excel export is only available on Windows or mobile.")]
    ExportUnavailable,

    #[error("Admin access required")]
    NotAuthenticated,

    #[error("Edit mode is not active")]
    EditModeInactive,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
