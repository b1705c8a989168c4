use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
};
use serde_json::{Value, json};

use engine::{HEADERS, Store, StoreError};
use sheets::{SheetsConfig, SheetsStore};

const PRIVATE_KEY: &str = include_str!("fixtures/service_account.pem");
const TOKEN: &str = "fake-access-token";

/// Just enough of the Drive, Sheets and OAuth endpoints to drive the store.
#[derive(Default)]
struct Google {
    spreadsheet: Option<String>,
    worksheets: Vec<String>,
    table: Vec<Value>,
    shared_with: Vec<String>,
    calls: Vec<String>,
    unauthorized: usize,
    fail_appends: bool,
}

type Shared = Arc<Mutex<Google>>;

impl Google {
    fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }

    fn count_matching(&self, pred: impl Fn(&str) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c.as_str())).count()
    }
}

fn header_row() -> Value {
    json!(HEADERS)
}

async fn fake_google(
    State(google): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    let bearer = format!("Bearer {TOKEN}");
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let mut g = google.lock().unwrap();
    g.calls.push(format!("{method} {path}"));

    if path != "/token"
        && headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            != Some(bearer.as_str())
    {
        g.unauthorized += 1;
    }

    let ok = |value: Value| (StatusCode::OK, Json(value));
    match (method.as_str(), path.as_str()) {
        ("POST", "/token") => ok(json!({ "access_token": TOKEN, "expires_in": 3600 })),
        ("GET", "/drive/files") => {
            let files: Vec<Value> = g
                .spreadsheet
                .iter()
                .map(|id| json!({ "id": id }))
                .collect();
            ok(json!({ "files": files }))
        }
        ("POST", "/sheets") => {
            g.spreadsheet = Some("created-id".to_string());
            g.worksheets = vec!["Sheet1".to_string()];
            ok(json!({ "spreadsheetId": "created-id" }))
        }
        ("POST", p) if p.ends_with("/permissions") => {
            let email = body["emailAddress"].as_str().unwrap_or_default().to_string();
            g.shared_with.push(email);
            ok(json!({ "id": "perm" }))
        }
        ("POST", p) if p.ends_with(":batchUpdate") => {
            let title = body["requests"][0]["addSheet"]["properties"]["title"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            g.worksheets.push(title);
            ok(json!({ "replies": [{}] }))
        }
        ("POST", p) if p.ends_with(":append") => {
            if g.fail_appends {
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": { "code": 429, "message": "Quota exceeded" } })),
                );
            }
            let rows = body["values"].as_array().cloned().unwrap_or_default();
            let written = rows.len();
            g.table.extend(rows);
            ok(json!({ "updates": { "updatedRows": written } }))
        }
        ("GET", p) if p.ends_with("!A:A") => {
            let column: Vec<Value> = g
                .table
                .iter()
                .map(|row| json!([row[0].clone()]))
                .collect();
            ok(json!({ "values": column }))
        }
        ("GET", p) if p.contains("/values/") => ok(json!({ "values": g.table })),
        ("GET", p) if p.starts_with("/sheets/") => {
            let sheets: Vec<Value> = g
                .worksheets
                .iter()
                .map(|title| json!({ "properties": { "title": title } }))
                .collect();
            ok(json!({ "sheets": sheets }))
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "message": format!("no route for {path}") } })),
        ),
    }
}

async fn spawn_google(google: Shared) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(fake_google).with_state(google.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn store_for(base: &str, share_email: Option<&str>) -> SheetsStore {
    let key = json!({
        "type": "service_account",
        "client_email": "tally@example.iam.gserviceaccount.com",
        "private_key": PRIVATE_KEY,
        "token_uri": format!("{base}/token"),
    });
    SheetsStore::new(SheetsConfig {
        credentials_json: Some(key.to_string()),
        credentials_file: None,
        share_email: share_email.map(str::to_string),
        sheets_api: format!("{base}/sheets"),
        drive_api: format!("{base}/drive"),
        ..SheetsConfig::default()
    })
    .unwrap()
}

fn existing_sheet(rows: Vec<Value>) -> Shared {
    let mut table = vec![header_row()];
    table.extend(rows);
    Arc::new(Mutex::new(Google {
        spreadsheet: Some("existing-id".to_string()),
        worksheets: vec!["Transactions".to_string()],
        table,
        ..Google::default()
    }))
}

#[tokio::test]
async fn missing_spreadsheet_is_created_shared_and_headed_once() {
    let google = Shared::default();
    let base = spawn_google(google.clone()).await;
    let store = store_for(&base, Some("owner@example.com"));

    store.open().await.unwrap();
    let calls_after_first_open = google.lock().unwrap().calls.len();
    store.open().await.unwrap();

    let g = google.lock().unwrap();
    assert_eq!(g.calls.len(), calls_after_first_open);
    assert_eq!(g.calls[0], "POST /token");
    assert_eq!(g.count("POST /token"), 1);
    assert_eq!(g.count("POST /sheets"), 1);
    assert_eq!(g.shared_with, vec!["owner@example.com"]);
    assert_eq!(g.count_matching(|c| c.ends_with(":batchUpdate")), 1);
    assert_eq!(g.count_matching(|c| c.ends_with(":append")), 1);
    assert_eq!(g.worksheets, vec!["Sheet1", "Transactions"]);
    assert_eq!(g.table, vec![header_row()]);
    assert_eq!(g.unauthorized, 0);
}

#[tokio::test]
async fn created_spreadsheet_is_not_shared_without_email() {
    let google = Shared::default();
    let base = spawn_google(google.clone()).await;
    let store = store_for(&base, None);

    store.open().await.unwrap();

    let g = google.lock().unwrap();
    assert_eq!(g.count("POST /sheets"), 1);
    assert!(g.shared_with.is_empty());
    assert_eq!(g.count_matching(|c| c.ends_with("/permissions")), 0);
}

#[tokio::test]
async fn existing_worksheet_is_reused_and_read() {
    let google = existing_sheet(vec![
        json!([
            "a", "income", 100, "2024-01-05", "", "general", "cash", "User",
            "2024-01-05T10:00:00Z"
        ]),
        json!([42, "expense", "12.5", "2024-01-06"]),
    ]);
    let base = spawn_google(google.clone()).await;
    let store = store_for(&base, Some("owner@example.com"));

    assert_eq!(store.read_identifier_column().await.unwrap(), vec!["a", "42"]);

    let records = store.read_all_rows().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text("ID"), "a");
    assert_eq!(records[0].number("Amount"), 100.0);
    assert_eq!(records[1].number("Amount"), 12.5);
    assert_eq!(records[1].text("Created"), "");

    let g = google.lock().unwrap();
    assert_eq!(g.count("POST /sheets"), 0);
    assert!(g.shared_with.is_empty());
    assert_eq!(g.count_matching(|c| c.ends_with(":batchUpdate")), 0);
    assert_eq!(g.count_matching(|c| c.ends_with(":append")), 0);
    assert_eq!(g.count("GET /drive/files"), 1);
}

#[tokio::test]
async fn append_returns_the_reported_row_count() {
    let google = existing_sheet(Vec::new());
    let base = spawn_google(google.clone()).await;
    let store = store_for(&base, None);

    let written = store
        .append_rows(vec![
            vec![json!("a"), json!("income"), json!(1.0)],
            vec![json!("b"), json!("expense"), json!(2.0)],
        ])
        .await
        .unwrap();
    assert_eq!(written, 2);

    let g = google.lock().unwrap();
    assert_eq!(g.count_matching(|c| c.ends_with(":append")), 1);
    let ids: Vec<&Value> = g.table.iter().skip(1).map(|row| &row[0]).collect();
    assert_eq!(ids, vec![&json!("a"), &json!("b")]);
}

#[tokio::test]
async fn google_errors_keep_status_and_message() {
    let google = existing_sheet(Vec::new());
    google.lock().unwrap().fail_appends = true;
    let base = spawn_google(google.clone()).await;
    let store = store_for(&base, None);

    let err = store
        .append_rows(vec![vec![json!("a")]])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
    let message = err.to_string();
    assert!(message.contains("429"));
    assert!(message.contains("Quota exceeded"));
}

#[tokio::test]
async fn reconnect_looks_the_spreadsheet_up_again() {
    let google = existing_sheet(Vec::new());
    let base = spawn_google(google.clone()).await;
    let store = store_for(&base, None);

    store.open().await.unwrap();
    store.reconnect().await;
    store.open().await.unwrap();

    let g = google.lock().unwrap();
    assert_eq!(g.count("GET /drive/files"), 2);
    assert_eq!(g.count("POST /token"), 2);
}
