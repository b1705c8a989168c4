use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use engine::{HEADERS, Record, Row, Store, StoreError, store};
use reqwest::{Method, RequestBuilder, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tokio::sync::Mutex;

use crate::{
    SheetsError,
    auth::{self, AccessToken},
    credentials::ServiceAccountKey,
};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const NEW_WORKSHEET_ROWS: usize = 1000;

/// Where the transactions live and how to authenticate.
#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub spreadsheet_name: String,
    pub worksheet: String,
    pub credentials_json: Option<String>,
    pub credentials_file: Option<PathBuf>,
    /// Shared as writer when the spreadsheet has to be created.
    pub share_email: Option<String>,
    pub request_timeout: Duration,
    /// Base of the Sheets v4 `spreadsheets` collection.
    pub sheets_api: String,
    /// Base of the Drive v3 API.
    pub drive_api: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_name: "Tally".to_string(),
            worksheet: "Transactions".to_string(),
            credentials_json: None,
            credentials_file: Some(PathBuf::from("credentials.json")),
            share_email: None,
            request_timeout: Duration::from_secs(30),
            sheets_api: SHEETS_API.to_string(),
            drive_api: DRIVE_API.to_string(),
        }
    }
}

struct Auth {
    key: ServiceAccountKey,
    token: Option<AccessToken>,
}

/// [`Store`] backed by a worksheet of a Google spreadsheet.
///
/// The spreadsheet is located (or created) on first use and its id cached
/// until [`Store::reconnect`].
pub struct SheetsStore {
    http: reqwest::Client,
    config: SheetsConfig,
    auth: Mutex<Option<Auth>>,
    spreadsheet_id: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetSheets {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Row>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSummary {
    updated_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    #[serde(default)]
    updates: UpdateSummary,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

impl SheetsStore {
    pub fn new(config: SheetsConfig) -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            auth: Mutex::new(None),
            spreadsheet_id: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, SheetsError> {
        let mut guard = self.auth.lock().await;
        if guard.is_none() {
            let key = ServiceAccountKey::load(
                self.config.credentials_json.as_deref(),
                self.config.credentials_file.as_deref(),
            )
            .await?;
            tracing::info!("Google Sheets client authorized as {}", key.client_email);
            *guard = Some(Auth { key, token: None });
        }

        let Some(auth) = guard.as_mut() else {
            return Err(SheetsError::NotConfigured(
                "credentials unavailable".to_string(),
            ));
        };
        if let Some(token) = auth.token.as_ref().filter(|t| t.is_fresh(chrono::Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = auth::fetch_token(&self.http, &auth.key).await?;
        let value = token.value.clone();
        auth.token = Some(token);
        Ok(value)
    }

    async fn call<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, SheetsError> {
        let token = self.access_token().await?;
        let resp = req.bearer_auth(token).send().await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let message = match resp.json::<GoogleErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => "Google API error".to_string(),
        };
        Err(SheetsError::Api { status, message })
    }

    async fn find_spreadsheet(&self) -> Result<Option<String>, SheetsError> {
        let query = drive_name_query(&self.config.spreadsheet_name);
        let url = api_url(&self.config.drive_api, &["files"])?;
        let list: DriveFileList = self
            .call(self.http.get(url).query(&[
                ("q", query.as_str()),
                ("fields", "files(id)"),
                ("pageSize", "1"),
            ]))
            .await?;
        Ok(list.files.into_iter().next().map(|file| file.id))
    }

    async fn create_spreadsheet(&self) -> Result<String, SheetsError> {
        let created: CreatedSpreadsheet = self
            .call(self.http.post(&self.config.sheets_api).json(&json!({
                "properties": { "title": self.config.spreadsheet_name }
            })))
            .await?;
        tracing::info!("Created new spreadsheet: {}", self.config.spreadsheet_name);

        if let Some(email) = self.config.share_email.as_deref() {
            let url = api_url(
                &self.config.drive_api,
                &["files", &created.spreadsheet_id, "permissions"],
            )?;
            let _: serde_json::Value = self
                .call(self.http.post(url).json(&json!({
                    "type": "user",
                    "role": "writer",
                    "emailAddress": email,
                })))
                .await?;
            tracing::info!("Shared spreadsheet with {email}");
        }

        Ok(created.spreadsheet_id)
    }

    async fn ensure_worksheet(&self, spreadsheet_id: &str) -> Result<(), SheetsError> {
        let url = api_url(&self.config.sheets_api, &[spreadsheet_id])?;
        let existing: SpreadsheetSheets = self
            .call(
                self.http
                    .get(url)
                    .query(&[("fields", "sheets.properties.title")]),
            )
            .await?;
        if existing
            .sheets
            .iter()
            .any(|sheet| sheet.properties.title == self.config.worksheet)
        {
            return Ok(());
        }

        let url = api_url(
            &self.config.sheets_api,
            &[&format!("{spreadsheet_id}:batchUpdate")],
        )?;
        let _: serde_json::Value = self
            .call(self.http.post(url).json(&json!({
                "requests": [{
                    "addSheet": {
                        "properties": {
                            "title": self.config.worksheet,
                            "gridProperties": {
                                "rowCount": NEW_WORKSHEET_ROWS,
                                "columnCount": HEADERS.len(),
                            }
                        }
                    }
                }]
            })))
            .await?;

        let header: Row = HEADERS.iter().map(|h| json!(h)).collect();
        self.append_values(spreadsheet_id, vec![header]).await?;
        tracing::info!(
            "Created '{}' worksheet with headers",
            self.config.worksheet
        );
        Ok(())
    }

    /// Spreadsheet id, opening (and creating) the spreadsheet on first use.
    async fn spreadsheet(&self) -> Result<String, SheetsError> {
        let mut guard = self.spreadsheet_id.lock().await;
        if let Some(id) = guard.as_ref() {
            return Ok(id.clone());
        }

        let id = match self.find_spreadsheet().await? {
            Some(id) => {
                tracing::info!("Opened spreadsheet: {}", self.config.spreadsheet_name);
                id
            }
            None => self.create_spreadsheet().await?,
        };
        self.ensure_worksheet(&id).await?;

        *guard = Some(id.clone());
        Ok(id)
    }

    fn values_request(
        &self,
        method: Method,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<RequestBuilder, SheetsError> {
        let url = api_url(&self.config.sheets_api, &[spreadsheet_id, "values", range])?;
        Ok(self.http.request(method, url))
    }

    async fn read_values(&self, spreadsheet_id: &str, cells: &str) -> Result<Vec<Row>, SheetsError> {
        let range = a1_range(&self.config.worksheet, cells);
        let req = self.values_request(Method::GET, spreadsheet_id, &range)?.query(&[
            ("majorDimension", "ROWS"),
            ("valueRenderOption", "UNFORMATTED_VALUE"),
            ("dateTimeRenderOption", "FORMATTED_STRING"),
        ]);
        let values: ValueRange = self.call(req).await?;
        Ok(values.values)
    }

    async fn append_values(&self, spreadsheet_id: &str, rows: Vec<Row>) -> Result<usize, SheetsError> {
        let requested = rows.len();
        let range = format!("{}:append", a1_range(&self.config.worksheet, "A1"));
        let req = self
            .values_request(Method::POST, spreadsheet_id, &range)?
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "majorDimension": "ROWS", "values": rows }));
        let resp: AppendResponse = self.call(req).await?;
        Ok(resp.updates.updated_rows.unwrap_or(requested))
    }
}

#[async_trait]
impl Store for SheetsStore {
    async fn open(&self) -> Result<(), StoreError> {
        self.spreadsheet().await?;
        Ok(())
    }

    async fn reconnect(&self) {
        *self.spreadsheet_id.lock().await = None;
        *self.auth.lock().await = None;
        tracing::info!("Google Sheets session reset");
    }

    async fn read_identifier_column(&self) -> Result<Vec<String>, StoreError> {
        let id = self.spreadsheet().await?;
        let table = self.read_values(&id, "A:A").await?;
        Ok(store::identifiers_from_table(&table))
    }

    async fn read_all_rows(&self) -> Result<Vec<Record>, StoreError> {
        let id = self.spreadsheet().await?;
        let table = self.read_values(&id, "A:I").await?;
        Ok(store::records_from_table(&table))
    }

    async fn append_rows(&self, rows: Vec<Row>) -> Result<usize, StoreError> {
        let id = self.spreadsheet().await?;
        let written = self.append_values(&id, rows).await?;
        tracing::info!("Appended {written} row(s) to spreadsheet");
        Ok(written)
    }
}

/// `'Sheet name'!A1` style range; quotes inside the name are doubled.
fn a1_range(worksheet: &str, cells: &str) -> String {
    format!("'{}'!{cells}", worksheet.replace('\'', "''"))
}

/// Drive search expression matching a non-trashed spreadsheet by exact name.
fn drive_name_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false")
}

/// `base` with each of `segments` appended as a percent-encoded path segment.
fn api_url(base: &str, segments: &[&str]) -> Result<Url, SheetsError> {
    let mut url = Url::parse(base).map_err(|err| SheetsError::Url(err.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| SheetsError::Url(format!("{base} cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
