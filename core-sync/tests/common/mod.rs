//! Test doubles shared by the integration tests: an in-memory Drive that
//! speaks the REST subset the provider uses, a scriptable identity library
//! and a fixed clock.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::{InMemoryDocumentStore, TracingNotificationSink};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    Clock, ConsentMode, HttpClient, HttpMethod, HttpRequest, HttpResponse, IdentityLibrary,
    TokenClient, TokenClientConfig, TokenResponse,
};
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use core_runtime::config::DriveConfig;
use core_runtime::events::{drain, CoreEvent, EventBus, Receiver};
use core_sync::{DriveService, HostServices};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DRIVE_BASE: &str = "https://drive.test/drive/v3";
pub const UPLOAD_BASE: &str = "https://drive.test/upload/drive/v3";
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

// ============================================================================
// In-memory Drive
// ============================================================================

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    pub parents: Vec<String>,
    pub mime_type: String,
    pub content: String,
    pub modified: DateTime<Utc>,
}

#[derive(Default)]
struct DriveState {
    files: Vec<StoredFile>,
    next_id: u32,
    writes: i64,
    reject_tokens: bool,
    fail_status: Option<u16>,
    requests: Vec<String>,
}

impl DriveState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("file-{}", self.next_id)
    }

    fn now(&mut self) -> DateTime<Utc> {
        self.writes += 1;
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(self.writes)
    }

    fn find(&self, id: &str) -> Option<&StoredFile> {
        self.files
            .iter()
            .find(|f| f.id == id && f.mime_type != FOLDER_MIME)
    }

    fn list(&self, params: &HashMap<String, String>) -> HttpResponse {
        let query = params.get("q").cloned().unwrap_or_default();

        if query.contains(FOLDER_MIME) {
            let name = between(&query, "name='", "'").unwrap_or_default();
            let files: Vec<Value> = self
                .files
                .iter()
                .filter(|f| f.mime_type == FOLDER_MIME && f.name == name)
                .map(|f| json!({"id": f.id, "name": f.name}))
                .collect();
            return ok(json!({ "files": files }));
        }

        let parent = query
            .split_once("' in parents")
            .and_then(|(head, _)| head.rsplit_once('\''))
            .map(|(_, id)| id)
            .unwrap_or_default();
        let exact = query
            .strip_prefix("name='")
            .and_then(|rest| rest.split_once('\''))
            .map(|(name, _)| name);
        let marker = between(&query, "name contains '", "'").unwrap_or_default();
        let mut matches: Vec<&StoredFile> = self
            .files
            .iter()
            .filter(|f| {
                f.mime_type != FOLDER_MIME
                    && f.parents.iter().any(|p| p == parent)
                    && match exact {
                        Some(name) => f.name == name,
                        None => f.name.contains(marker),
                    }
            })
            .collect();
        matches.sort_by(|a, b| b.modified.cmp(&a.modified));

        let files: Vec<Value> = matches
            .into_iter()
            .map(|f| {
                json!({
                    "id": f.id,
                    "name": f.name,
                    "modifiedTime": f.modified.to_rfc3339_opts(SecondsFormat::Millis, true),
                    "size": f.content.len().to_string(),
                })
            })
            .collect();
        ok(json!({ "files": files }))
    }

    fn create_folder(&mut self, request: &HttpRequest) -> HttpResponse {
        let body = body_json(request);
        let id = self.next_id();
        let modified = self.now();
        let name = body["name"].as_str().unwrap_or_default().to_string();
        self.files.push(StoredFile {
            id: id.clone(),
            name: name.clone(),
            parents: Vec::new(),
            mime_type: body["mimeType"].as_str().unwrap_or_default().to_string(),
            content: String::new(),
            modified,
        });
        ok(json!({"id": id, "name": name}))
    }

    fn download(&self, id: &str) -> HttpResponse {
        match self.find(id) {
            Some(file) => HttpResponse::new(200, file.content.clone()),
            None => not_found(id),
        }
    }

    fn modified_time(&self, id: &str) -> HttpResponse {
        match self.find(id) {
            Some(file) => ok(json!({
                "modifiedTime": file.modified.to_rfc3339_opts(SecondsFormat::Millis, true)
            })),
            None => not_found(id),
        }
    }

    fn rename(&mut self, id: &str, request: &HttpRequest) -> HttpResponse {
        let name = body_json(request)["name"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        match self.files.iter_mut().find(|f| f.id == id) {
            Some(file) => {
                file.name = name.clone();
                ok(json!({"id": id, "name": name}))
            }
            None => not_found(id),
        }
    }

    fn replace_content(&mut self, id: &str, request: &HttpRequest) -> HttpResponse {
        let modified = self.now();
        match self.files.iter_mut().find(|f| f.id == id) {
            Some(file) => {
                file.content = body_text(request);
                file.modified = modified;
                ok(json!({"id": file.id, "name": file.name}))
            }
            None => not_found(id),
        }
    }

    fn create_from_multipart(&mut self, request: &HttpRequest) -> HttpResponse {
        let Some(boundary) = request
            .header_value("Content-Type")
            .and_then(|ct| ct.strip_prefix("multipart/related; boundary="))
        else {
            return error(400, "Missing multipart boundary");
        };

        let body = body_text(request);
        let delimiter = format!("--{}", boundary);
        let parts: Vec<&str> = body
            .split(delimiter.as_str())
            .filter_map(|segment| {
                let (_, payload) = segment.split_once("\r\n\r\n")?;
                Some(payload.strip_suffix("\r\n").unwrap_or(payload))
            })
            .collect();
        let [metadata, content] = parts.as_slice() else {
            return error(400, "Expected metadata and media parts");
        };

        let metadata: Value = serde_json::from_str(metadata).unwrap_or_default();
        let id = self.next_id();
        let modified = self.now();
        let name = metadata["name"].as_str().unwrap_or_default().to_string();
        self.files.push(StoredFile {
            id: id.clone(),
            name: name.clone(),
            parents: metadata["parents"]
                .as_array()
                .map(|ps| ps.iter().filter_map(|p| p.as_str().map(String::from)).collect())
                .unwrap_or_default(),
            mime_type: metadata["mimeType"].as_str().unwrap_or_default().to_string(),
            content: content.to_string(),
            modified,
        });
        ok(json!({"id": id, "name": name}))
    }
}

pub struct FakeDrive {
    state: Mutex<DriveState>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DriveState::default()),
        }
    }

    pub fn add_folder(&self, name: &str) -> String {
        let mut state = self.lock();
        let id = state.next_id();
        state.files.push(StoredFile {
            id: id.clone(),
            name: name.to_string(),
            parents: Vec::new(),
            mime_type: FOLDER_MIME.to_string(),
            content: String::new(),
            modified: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        });
        id
    }

    /// Add a document last modified at `modified` (RFC 3339).
    pub fn add_file(&self, folder_id: &str, name: &str, content: &str, modified: &str) -> String {
        let mut state = self.lock();
        let id = state.next_id();
        state.files.push(StoredFile {
            id: id.clone(),
            name: name.to_string(),
            parents: vec![folder_id.to_string()],
            mime_type: "application/json".to_string(),
            content: content.to_string(),
            modified: DateTime::parse_from_rfc3339(modified)
                .unwrap()
                .with_timezone(&Utc),
        });
        id
    }

    pub fn file(&self, id: &str) -> Option<StoredFile> {
        self.lock().files.iter().find(|f| f.id == id).cloned()
    }

    pub fn files_named(&self, name: &str) -> Vec<StoredFile> {
        self.lock()
            .files
            .iter()
            .filter(|f| f.name == name && f.mime_type != FOLDER_MIME)
            .cloned()
            .collect()
    }

    pub fn folders_named(&self, name: &str) -> usize {
        self.lock()
            .files
            .iter()
            .filter(|f| f.name == name && f.mime_type == FOLDER_MIME)
            .count()
    }

    /// Answer every request with 401 while set.
    pub fn reject_tokens(&self, reject: bool) {
        self.lock().reject_tokens = reject;
    }

    /// Answer every request with `status` and a Drive error object while set.
    pub fn fail_with(&self, status: Option<u16>) {
        self.lock().fail_status = status;
    }

    /// `"<METHOD> <url>"` for every request received
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, DriveState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl HttpClient for FakeDrive {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let mut state = self.lock();
        state
            .requests
            .push(format!("{} {}", request.method, request.url));

        let bearer = request
            .header_value("Authorization")
            .is_some_and(|value| value.starts_with("Bearer "));
        if !bearer || state.reject_tokens {
            return Ok(error(401, "Invalid Credentials"));
        }
        if let Some(status) = state.fail_status {
            return Ok(error(status, "Backend Error"));
        }

        let (upload, rest) = if let Some(rest) = request.url.strip_prefix(UPLOAD_BASE) {
            (true, rest)
        } else if let Some(rest) = request.url.strip_prefix(DRIVE_BASE) {
            (false, rest)
        } else {
            return Ok(HttpResponse::new(404, ""));
        };

        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let params: HashMap<String, String> = query
            .split('&')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                Some((key.to_string(), urlencoding::decode(value).ok()?.into_owned()))
            })
            .collect();
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        let response = match (request.method, upload, segments.as_slice()) {
            (HttpMethod::Get, false, ["files"]) => state.list(&params),
            (HttpMethod::Post, false, ["files"]) => state.create_folder(&request),
            (HttpMethod::Get, false, ["files", id]) if params.contains_key("alt") => {
                state.download(id)
            }
            (HttpMethod::Get, false, ["files", id]) => state.modified_time(id),
            (HttpMethod::Patch, false, ["files", id]) => state.rename(id, &request),
            (HttpMethod::Patch, true, ["files", id]) => state.replace_content(id, &request),
            (HttpMethod::Post, true, ["files"]) => state.create_from_multipart(&request),
            _ => HttpResponse::new(404, ""),
        };
        Ok(response)
    }
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let len = text[from..].find(end)?;
    Some(&text[from..from + len])
}

fn body_text(request: &HttpRequest) -> String {
    String::from_utf8_lossy(request.body.as_deref().unwrap_or_default()).into_owned()
}

fn body_json(request: &HttpRequest) -> Value {
    serde_json::from_str(&body_text(request)).unwrap_or_default()
}

fn ok(body: Value) -> HttpResponse {
    HttpResponse::new(200, body.to_string())
}

fn error(status: u16, message: &str) -> HttpResponse {
    HttpResponse::new(
        status,
        json!({"error": {"code": status, "message": message}}).to_string(),
    )
}

fn not_found(id: &str) -> HttpResponse {
    error(404, &format!("File not found: {}", id))
}

// ============================================================================
// Identity provider
// ============================================================================

#[derive(Default)]
struct IdentityState {
    prior_consent: bool,
    deny_interactive: bool,
    issued: u32,
    prompts: u32,
    silent_requests: u32,
}

/// Identity library that is always loaded and grants `token-<n>` tokens.
#[derive(Default)]
pub struct FakeIdentity {
    state: Arc<Mutex<IdentityState>>,
}

impl FakeIdentity {
    /// The user consented in an earlier visit, so silent requests succeed.
    pub fn with_prior_consent() -> Self {
        let identity = Self::default();
        identity.state.lock().unwrap().prior_consent = true;
        identity
    }

    pub fn deny_interactive(&self, deny: bool) {
        self.state.lock().unwrap().deny_interactive = deny;
    }

    pub fn prompts(&self) -> u32 {
        self.state.lock().unwrap().prompts
    }

    pub fn silent_requests(&self) -> u32 {
        self.state.lock().unwrap().silent_requests
    }
}

#[async_trait]
impl IdentityLibrary for FakeIdentity {
    fn has_static_tag(&self) -> bool {
        true
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn inject(&self) -> BridgeResult<()> {
        Ok(())
    }

    fn create_token_client(&self, _config: TokenClientConfig) -> BridgeResult<Arc<dyn TokenClient>> {
        Ok(Arc::new(FakeTokenClient {
            state: self.state.clone(),
        }))
    }
}

struct FakeTokenClient {
    state: Arc<Mutex<IdentityState>>,
}

#[async_trait]
impl TokenClient for FakeTokenClient {
    async fn request_access_token(&self, mode: ConsentMode) -> TokenResponse {
        let mut state = self.state.lock().unwrap();
        match mode {
            ConsentMode::Interactive => {
                state.prompts += 1;
                if state.deny_interactive {
                    return TokenResponse::Denied {
                        error: "access_denied".to_string(),
                    };
                }
                state.prior_consent = true;
            }
            ConsentMode::Silent => {
                state.silent_requests += 1;
                if !state.prior_consent {
                    return TokenResponse::Failed {
                        kind: "interaction_required".to_string(),
                        message: None,
                    };
                }
            }
        }
        state.issued += 1;
        TokenResponse::Granted {
            access_token: format!("token-{}", state.issued),
            expires_in: Some(3599),
        }
    }
}

// ============================================================================
// Clock and harness
// ============================================================================

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn test_config() -> DriveConfig {
    DriveConfig::builder()
        .client_id("test-client.apps.googleusercontent.com")
        .drive_api_base(DRIVE_BASE)
        .upload_api_base(UPLOAD_BASE)
        .identity_poll_interval(std::time::Duration::from_millis(1))
        .identity_load_timeout(std::time::Duration::from_millis(20))
        .build()
        .unwrap()
}

pub struct Harness {
    pub service: DriveService,
    pub drive: Arc<FakeDrive>,
    pub identity: Arc<FakeIdentity>,
    pub notifications: Arc<TracingNotificationSink>,
    pub document: Arc<InMemoryDocumentStore>,
    pub events: Receiver<CoreEvent>,
}

impl Harness {
    pub fn new(drive: FakeDrive, identity: FakeIdentity) -> Self {
        Self::with_document(drive, identity, json!({"entries": []}))
    }

    pub fn with_document(drive: FakeDrive, identity: FakeIdentity, document: Value) -> Self {
        let drive = Arc::new(drive);
        let identity = Arc::new(identity);
        let notifications = Arc::new(TracingNotificationSink::default());
        let document = Arc::new(InMemoryDocumentStore::new(document));
        let event_bus = EventBus::default();
        let events = event_bus.subscribe();

        let host = HostServices {
            identity: identity.clone(),
            http_client: drive.clone(),
            notifier: notifications.clone(),
            document: document.clone(),
            view: document.clone(),
            clock: Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            )),
        };

        Self {
            service: DriveService::new(test_config(), host, event_bus),
            drive,
            identity,
            notifications,
            document,
            events,
        }
    }

    /// Notification texts, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .recent()
            .into_iter()
            .map(|(_, message)| message)
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        drain(&mut self.events)
    }
}
