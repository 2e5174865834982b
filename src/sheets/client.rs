//! Remote worksheet access.
//!
//! [`SheetClient`] is the seam between the spreadsheet store and the service
//! that hosts the worksheets. [`GoogleSheetsClient`] talks to the Google
//! Sheets and Drive APIs with a service account; configuration comes from
//! [`credentials`](super::credentials).

use std::time::{Duration, Instant};

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::credentials::ServiceAccountKey;
use crate::error::{Result, StoreError};

/// Worksheet operations needed by [`SheetStore`](super::SheetStore).
///
/// Every call is one blocking round trip. Values are plain text, row 1 of a
/// worksheet being its header.
pub trait SheetClient {
    fn worksheet_titles(&mut self) -> Result<Vec<String>>;
    fn add_worksheet(&mut self, title: &str) -> Result<()>;
    /// All rows including the header. An empty worksheet yields no rows.
    fn read_values(&mut self, title: &str) -> Result<Vec<Vec<String>>>;
    /// Appends rows after the last non-empty row.
    fn append_rows(&mut self, title: &str, rows: &[Vec<String>]) -> Result<()>;
    /// Clears the worksheet and writes `values` from A1.
    fn replace_values(&mut self, title: &str, values: &[Vec<String>]) -> Result<()>;
}

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
/// Grid size of newly added worksheets.
const NEW_SHEET_ROWS: u32 = 100;
const NEW_SHEET_COLS: u32 = 20;
/// Tokens are refreshed this long before Google says they expire.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct DriveFiles {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets client for one spreadsheet, found by its document name.
#[derive(Debug)]
pub struct GoogleSheetsClient {
    http: Client,
    key: ServiceAccountKey,
    token: Option<AccessToken>,
    spreadsheet_id: String,
}

impl GoogleSheetsClient {
    /// Authenticates and opens the spreadsheet called `document_name`.
    ///
    /// Anything but a rejected credential surfaces as `BackendUnavailable`
    /// and is not retried.
    pub fn connect(key: ServiceAccountKey, document_name: &str) -> Result<Self> {
        let mut client = Self {
            http: Client::new(),
            key,
            token: None,
            spreadsheet_id: String::new(),
        };

        client.spreadsheet_id = client
            .find_spreadsheet(document_name)
            .map_err(startup_error)?;
        tracing::info!("Connected to spreadsheet {}", document_name);
        Ok(client)
    }

    fn find_spreadsheet(&mut self, name: &str) -> Result<String> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME
        );
        let request = self
            .authorized(self.http.get(DRIVE_FILES_API))?
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ]);
        let found: DriveFiles = handle_response(request.send()?)?;

        found
            .files
            .into_iter()
            .find(|f| f.name == name)
            .map(|f| f.id)
            .ok_or_else(|| {
                StoreError::BackendUnavailable(format!(
                    "Spreadsheet '{}' not found. Create it and share it with {}.",
                    name, self.key.client_email
                ))
            })
    }

    fn access_token(&mut self) -> Result<String> {
        if let Some(token) = &self.token {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPES,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let signing_key = jsonwebtoken::EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        let assertion = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &signing_key,
        )?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()?;
        let token: TokenResponse = handle_response(response).map_err(|e| match e {
            StoreError::Api { body, .. } => StoreError::Auth(body),
            other => other,
        })?;

        tracing::debug!("Obtained access token for {}", self.key.client_email);
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_MARGIN);
        self.token = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    fn authorized(&mut self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.bearer_auth(self.access_token()?))
    }

    fn values_url(&self, title: &str, suffix: &str) -> String {
        // Quoted A1 range naming the whole sheet
        let range = format!("'{}'", title.replace('\'', "''"));
        format!(
            "{}/{}/values/{}{}",
            SHEETS_API,
            self.spreadsheet_id,
            urlencoding::encode(&range),
            suffix
        )
    }
}

impl SheetClient for GoogleSheetsClient {
    fn worksheet_titles(&mut self) -> Result<Vec<String>> {
        let url = format!("{}/{}", SHEETS_API, self.spreadsheet_id);
        let request = self
            .authorized(self.http.get(&url))?
            .query(&[("fields", "sheets.properties.title")]);
        let meta: SpreadsheetMeta = handle_response(request.send()?)?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    fn add_worksheet(&mut self, title: &str) -> Result<()> {
        tracing::debug!("Adding worksheet {}", title);
        let url = format!("{}/{}:batchUpdate", SHEETS_API, self.spreadsheet_id);
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": NEW_SHEET_ROWS, "columnCount": NEW_SHEET_COLS }
                    }
                }
            }]
        });
        let request = self.authorized(self.http.post(&url))?.json(&body);
        handle_empty_response(request.send()?)
    }

    fn read_values(&mut self, title: &str) -> Result<Vec<Vec<String>>> {
        tracing::debug!("Reading worksheet {}", title);
        let url = self.values_url(title, "");
        let request = self.authorized(self.http.get(&url))?;
        let range: ValueRange = handle_response(request.send()?)?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    fn append_rows(&mut self, title: &str, rows: &[Vec<String>]) -> Result<()> {
        tracing::debug!("Appending {} rows to {}", rows.len(), title);
        let url = self.values_url(title, ":append");
        let request = self
            .authorized(self.http.post(&url))?
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": rows }));
        handle_empty_response(request.send()?)
    }

    fn replace_values(&mut self, title: &str, values: &[Vec<String>]) -> Result<()> {
        tracing::debug!("Rewriting {} with {} rows", title, values.len());
        let clear_url = self.values_url(title, ":clear");
        let request = self.authorized(self.http.post(&clear_url))?.json(&json!({}));
        handle_empty_response(request.send()?)?;

        if values.is_empty() {
            return Ok(());
        }
        let url = self.values_url(title, "");
        let request = self
            .authorized(self.http.put(&url))?
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": values }));
        handle_empty_response(request.send()?)
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Handle response, converting HTTP errors to StoreError.
fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json()?)
    } else {
        Err(error_for(status, response.text().unwrap_or_default()))
    }
}

/// Handle response whose body is not needed.
fn handle_empty_response(response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(error_for(status, response.text().unwrap_or_default()))
    }
}

/// Failures while opening the spreadsheet. Credential problems keep their own
/// variants so the caller can tell a bad key from an unreachable service.
fn startup_error(err: StoreError) -> StoreError {
    match err {
        StoreError::Http(e) => StoreError::BackendUnavailable(e.to_string()),
        StoreError::Json(e) => StoreError::BackendUnavailable(e.to_string()),
        StoreError::Api { status, body } => {
            StoreError::BackendUnavailable(format!("Sheets API error {}: {}", status, body))
        }
        other => other,
    }
}

fn error_for(status: StatusCode, body: String) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Auth(body),
        _ => StoreError::Api {
            status: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_credentials_map_to_auth() {
        assert!(matches!(error_for(StatusCode::UNAUTHORIZED, "no".into()), StoreError::Auth(_)));
        assert!(matches!(error_for(StatusCode::FORBIDDEN, "no".into()), StoreError::Auth(_)));
        assert!(matches!(
            error_for(StatusCode::BAD_REQUEST, "bad".into()),
            StoreError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn server_errors_at_startup_mean_unavailable() {
        let err = startup_error(error_for(StatusCode::SERVICE_UNAVAILABLE, "down".into()));

        match err {
            StoreError::BackendUnavailable(message) => {
                assert!(message.contains("503"));
                assert!(message.contains("down"));
            }
            other => panic!("expected BackendUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn auth_failures_at_startup_stay_auth() {
        let err = startup_error(error_for(StatusCode::FORBIDDEN, "denied".into()));
        assert!(matches!(err, StoreError::Auth(body) if body == "denied"));

        let missing = startup_error(StoreError::BackendUnavailable("not found".into()));
        assert!(matches!(missing, StoreError::BackendUnavailable(_)));
    }
}
