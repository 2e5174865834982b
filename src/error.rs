use thiserror::Error;

use crate::sheets::credentials::{CREDENTIAL_FILE, SECRET_ENV};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by either storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Exercise already exists: {0}")]
    DuplicateName(String),

    #[error(
        "Missing Google Sheets credentials. Set the {SECRET_ENV} secret to the service account \
         JSON, or place '{CREDENTIAL_FILE}' in the working directory."
    )]
    MissingCredential,

    #[error("No ids left in {0}")]
    IdsExhausted(String),

    #[error("Spreadsheet backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Sheet '{sheet}' is missing required column '{missing}'")]
    SchemaMismatch { sheet: String, missing: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Sheets API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not sign token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
