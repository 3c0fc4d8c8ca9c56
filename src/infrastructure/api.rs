// src/infrastructure/api.rs
use crate::application::{ChallengeRepository, FolderRepository, NoteRepository, ToolRepository};
use crate::domain::challenge::FlagCheckResponse;
use crate::domain::error::GENERIC_BACKEND_MESSAGE;
use crate::domain::{
    Challenge, ChallengeForm, DomainError, FileResource, FlagOutcome, Folder, FolderId, NewTool,
    Note, NoteId, NoteInput, Tool,
};
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, trace};

/// Blocking client of the training platform's REST backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

#[derive(Serialize)]
struct FolderBody<'a> {
    name: &'a str,
    parent_id: Option<FolderId>,
}

#[derive(Serialize)]
struct MoveBody {
    new_parent_id: Option<FolderId>,
}

#[derive(Serialize)]
struct FlagBody<'a> {
    flag: &'a str,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid backend URL: {}", base_url))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("Backend URL cannot carry paths: {}", base_url));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        info!(%base, "Using backend");
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Joins path segments onto the base URL, percent-encoding each segment.
    /// A trailing empty segment yields a trailing slash.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, DomainError> {
        let response = request
            .send()
            .map_err(|e| DomainError::Transport(e.to_string()))?;
        let status = response.status();
        trace!(%status, url = %response.url(), "Backend responded");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(backend_error(status, &body))
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DomainError> {
        self.send(request)?
            .json::<T>()
            .map_err(|e| DomainError::Decode(e.to_string()))
    }

    fn send_empty(&self, request: RequestBuilder) -> Result<(), DomainError> {
        self.send(request).map(|_| ())
    }
}

/// Maps an error response to the domain error, preferring the backend's `detail` text
pub fn backend_error(status: StatusCode, body: &str) -> DomainError {
    let detail = extract_detail(body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| GENERIC_BACKEND_MESSAGE.to_string());
    DomainError::Backend {
        status: status.as_u16(),
        detail,
    }
}

/// Reads `detail` from an error body: a plain string, or a list of validation errors
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}

fn not_found_as(err: DomainError, mapped: DomainError) -> DomainError {
    match err {
        DomainError::Backend { status: 404, .. } => mapped,
        other => other,
    }
}

impl NoteRepository for ApiClient {
    #[instrument(level = "debug", skip(self))]
    fn list_notes(&mut self) -> Result<Vec<Note>, DomainError> {
        self.send_json(self.client.get(self.endpoint(&["notes", ""])))
    }

    #[instrument(level = "debug", skip(self))]
    fn get_note(&mut self, id: NoteId) -> Result<Note, DomainError> {
        self.send_json(self.client.get(self.endpoint(&["notes", &id.to_string()])))
            .map_err(|e| not_found_as(e, DomainError::NoteNotFound(id)))
    }

    #[instrument(level = "debug", skip(self, input), fields(title = %input.title))]
    fn create_note(&mut self, input: &NoteInput) -> Result<Note, DomainError> {
        let note: Note = self.send_json(self.client.post(self.endpoint(&["notes", ""])).json(input))?;
        debug!(note_id = note.id, "Backend assigned note id");
        Ok(note)
    }

    #[instrument(level = "debug", skip(self, input))]
    fn update_note(&mut self, id: NoteId, input: &NoteInput) -> Result<Note, DomainError> {
        self.send_json(
            self.client
                .put(self.endpoint(&["notes", &id.to_string()]))
                .json(input),
        )
        .map_err(|e| not_found_as(e, DomainError::NoteNotFound(id)))
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_note(&mut self, id: NoteId) -> Result<(), DomainError> {
        self.send_empty(self.client.delete(self.endpoint(&["notes", &id.to_string()])))
            .map_err(|e| not_found_as(e, DomainError::NoteNotFound(id)))
    }
}

impl FolderRepository for ApiClient {
    #[instrument(level = "debug", skip(self))]
    fn list_folders(&mut self) -> Result<Vec<Folder>, DomainError> {
        self.send_json(self.client.get(self.endpoint(&["folders", ""])))
    }

    #[instrument(level = "debug", skip(self))]
    fn create_folder(&mut self, name: &str, parent: Option<FolderId>) -> Result<Folder, DomainError> {
        self.send_json(
            self.client
                .post(self.endpoint(&["folders", ""]))
                .json(&FolderBody {
                    name,
                    parent_id: parent,
                }),
        )
    }

    #[instrument(level = "debug", skip(self))]
    fn move_folder(&mut self, id: FolderId, new_parent: Option<FolderId>) -> Result<(), DomainError> {
        self.send_empty(
            self.client
                .put(self.endpoint(&["folders", &id.to_string(), "move"]))
                .json(&MoveBody {
                    new_parent_id: new_parent,
                }),
        )
        .map_err(|e| not_found_as(e, DomainError::FolderNotFound(id)))
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_folder(&mut self, id: FolderId) -> Result<(), DomainError> {
        self.send_empty(self.client.delete(self.endpoint(&["folders", &id.to_string()])))
            .map_err(|e| not_found_as(e, DomainError::FolderNotFound(id)))
    }
}

impl ToolRepository for ApiClient {
    #[instrument(level = "debug", skip(self))]
    fn list_tools(&mut self, category: Option<&str>) -> Result<Vec<Tool>, DomainError> {
        let mut request = self.client.get(self.endpoint(&["tools", ""]));
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        self.send_json(request)
    }

    #[instrument(level = "debug", skip(self, tool), fields(name = %tool.name))]
    fn create_tool(&mut self, tool: &NewTool) -> Result<Tool, DomainError> {
        self.send_json(self.client.post(self.endpoint(&["tools", ""])).json(tool))
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_tool(&mut self, id: i64) -> Result<(), DomainError> {
        self.send_empty(self.client.delete(self.endpoint(&["tools", &id.to_string()])))
            .map_err(|e| not_found_as(e, DomainError::ToolNotFound(id)))
    }
}

impl ChallengeRepository for ApiClient {
    #[instrument(level = "debug", skip(self))]
    fn list_challenges(&mut self) -> Result<Vec<Challenge>, DomainError> {
        self.send_json(self.client.get(self.endpoint(&["challenges", ""])))
    }

    #[instrument(level = "debug", skip(self))]
    fn get_challenge(&mut self, id: i64) -> Result<Challenge, DomainError> {
        self.send_json(self.client.get(self.endpoint(&["challenges", &id.to_string()])))
            .map_err(|e| not_found_as(e, DomainError::ChallengeNotFound(id)))
    }

    #[instrument(level = "debug", skip(self, form), fields(title = %form.title))]
    fn create_challenge(&mut self, form: &ChallengeForm) -> Result<Challenge, DomainError> {
        self.send_json(self.client.post(self.endpoint(&["challenges", ""])).json(form))
    }

    #[instrument(level = "debug", skip(self, form))]
    fn update_challenge(&mut self, id: i64, form: &ChallengeForm) -> Result<Challenge, DomainError> {
        self.send_json(
            self.client
                .put(self.endpoint(&["challenges", &id.to_string()]))
                .json(form),
        )
        .map_err(|e| not_found_as(e, DomainError::ChallengeNotFound(id)))
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_challenge(&mut self, id: i64) -> Result<(), DomainError> {
        self.send_empty(self.client.delete(self.endpoint(&["challenges", &id.to_string()])))
            .map_err(|e| not_found_as(e, DomainError::ChallengeNotFound(id)))
    }

    #[instrument(level = "debug", skip(self))]
    fn toggle_solved(&mut self, id: i64) -> Result<Challenge, DomainError> {
        self.send_json(
            self.client
                .patch(self.endpoint(&["challenges", &id.to_string(), "toggle-solved"])),
        )
        .map_err(|e| not_found_as(e, DomainError::ChallengeNotFound(id)))
    }

    #[instrument(level = "debug", skip(self, flag))]
    fn check_flag(&mut self, id: i64, flag: &str) -> Result<FlagOutcome, DomainError> {
        let response: FlagCheckResponse = self.send_json(
            self.client
                .post(self.endpoint(&["challenges", &id.to_string(), "check-flag"]))
                .json(&FlagBody { flag }),
        )?;
        Ok(response.into())
    }

    #[instrument(level = "debug", skip(self))]
    fn upload_file(&mut self, id: i64, path: &Path) -> Result<FileResource, DomainError> {
        let form = multipart::Form::new()
            .file("file", path)
            .map_err(|e| DomainError::Io(format!("{}: {}", path.display(), e)))?;
        self.send_json(
            self.client
                .post(self.endpoint(&["challenges", &id.to_string(), "files", ""]))
                .multipart(form),
        )
    }

    #[instrument(level = "debug", skip(self))]
    fn download_file(&mut self, id: i64, filename: &str) -> Result<Vec<u8>, DomainError> {
        let response = self.send(
            self.client
                .get(self.endpoint(&["challenges", &id.to_string(), "files", filename]))
                .header(ACCEPT, "application/octet-stream"),
        )?;
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| DomainError::Transport(e.to_string()))
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_file(&mut self, id: i64, filename: &str) -> Result<(), DomainError> {
        self.send_empty(
            self.client
                .delete(self.endpoint(&["challenges", &id.to_string(), "files", filename])),
        )
    }
}
