//! HTTP facade.
//!
//! One router, all JSON under `/api`, bearer-token auth on everything
//! except login and the health probe. Handlers stay thin: they parse
//! the request, take the store lock for the read-modify-write, and
//! map [`AppError`] onto the status codes in one place.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;

use crate::chats::ChatArchive;
use crate::config::Config;
use crate::enrich::enrich;
use crate::error::AppError;
use crate::export;
use crate::llm::{ChatClient, WireMessage};
use crate::report::build_portfolio_text;
use crate::session::SessionStore;
use crate::store::RecordStore;
use crate::types::{DemFieldPatch, EnrichedRecord, NewDem};
use crate::util::sanitize_filename;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub config: Config,
    /// The store itself is lock-free; this mutex serializes the
    /// load-modify-save cycle so concurrent writers cannot drop each
    /// other's changes.
    pub store: Mutex<RecordStore>,
    pub chats: ChatArchive,
    pub sessions: SessionStore,
    pub llm: ChatClient,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = RecordStore::new(config.store_path());
        let chats = ChatArchive::new(config.chats_dir());
        let llm = ChatClient::new(&config);
        Self {
            config,
            store: Mutex::new(store),
            chats,
            sessions: SessionStore::new(),
            llm,
        }
    }
}

// ── Error handling ────────────────────────────────────────────────────

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("Persistence failure: {}", self);
        }
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default)]
    history: Vec<WireMessage>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    file_summaries: Vec<FileSummary>,
    /// When set, the exchange is appended to this project's history.
    #[serde(default)]
    project: Option<String>,
}

#[derive(Deserialize)]
struct FileSummary {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    summary: String,
}

#[derive(Deserialize)]
struct NotePayload {
    #[serde(default)]
    text: String,
    index: Option<usize>,
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    archived: Option<String>,
}

#[derive(Deserialize)]
struct ImportPayload {
    projects: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct OverwriteChatPayload {
    #[serde(default)]
    messages: Vec<crate::types::ChatMessage>,
}

// ── Router ────────────────────────────────────────────────────────────

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/chat", post(chat))
        .route("/api/upload", post(upload))
        .route("/api/dems/projects", get(list_dems).post(create_dem))
        .route("/api/dems/projects/{id}/note", post(add_note))
        .route("/api/dems/projects/{id}/note/edit", post(edit_note))
        .route("/api/dems/projects/{id}/note/delete", post(delete_note))
        .route("/api/dems/projects/{id}/update", post(update_dem))
        .route("/api/dems/projects/{id}/archive", post(archive_dem))
        .route("/api/dems/projects/{id}/restore", post(restore_dem))
        .route("/api/dems/projects/{id}/delete", post(delete_dem))
        .route("/api/dems/projects/{id}/attach", post(attach_document))
        .route("/api/dems/projects/{id}/summary/delete", post(delete_summary))
        .route("/api/dems/projects/{id}/analysis", post(solution_analysis))
        .route("/api/dems/export", get(export_active_xlsx))
        .route("/api/dems/export_archived", get(export_archived_xlsx))
        .route("/api/dems/export_json", get(export_json))
        .route("/api/dems/import", post(import_dems))
        .route("/api/dems/report", post(report_panel))
        .route("/api/dems/report/ai", post(report_ai))
        .route("/api/dems/download/{fmt}", get(download_report))
        .route("/api/files", get(list_files))
        .route("/api/files/{filename}", get(download_file))
        .route("/api/files/{filename}/delete", post(delete_file))
        .route("/api/chats", get(list_chats))
        .route(
            "/api/chats/{name}",
            get(get_chat).post(overwrite_chat).delete(delete_chat),
        )
        .route("/api/chats/{name}/export", get(export_chat))
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on the configured address until interrupted.
pub async fn start_server(config: Config) -> std::io::Result<()> {
    std::fs::create_dir_all(config.upload_dir())?;
    std::fs::create_dir_all(config.chats_dir())?;

    let addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("demdesk listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

// ── Auth ──────────────────────────────────────────────────────────────

async fn require_auth(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if path == "/api/login" || path == "/health" {
        return next.run(req).await;
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if state.sessions.validate(token, Utc::now()) => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Unauthorized"})),
        )
            .into_response(),
    }
}

async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Response {
    if SessionStore::credentials_valid(&state.config, &payload.username, &payload.password) {
        let token = state.sessions.login(Utc::now());
        Json(json!({"token": token})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid username or password."})),
        )
            .into_response()
    }
}

async fn logout(State(state): State<SharedState>, req: Request) -> Json<serde_json::Value> {
    if let Some(token) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        state.sessions.logout(token);
    }
    Json(json!({"success": true}))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

// ── Chat & uploads ────────────────────────────────────────────────────

async fn chat(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let message = payload.message.trim().to_string();
    if message.is_empty() {
        return Err(AppError::Validation("Message is required.".into()));
    }

    let mut messages: Vec<WireMessage> = payload
        .history
        .into_iter()
        .filter(|m| m.role == "user" || m.role == "assistant")
        .collect();

    let mut user_content = message.clone();
    if !payload.file_summaries.is_empty() {
        user_content.push_str("\n\n[Attached files summary]\n");
        for fsum in &payload.file_summaries {
            user_content.push_str(&format!("- {}: {}\n", fsum.filename, fsum.summary));
        }
    }
    messages.push(WireMessage::user(user_content));

    if let Some(project) = &payload.project {
        state.chats.save_message(project, "user", &message)?;
    }

    let mut upstream = state.llm.chat_stream(payload.model, messages);

    // Forward deltas as plain text. An upstream error becomes a final
    // text line, matching what the chat page renders inline.
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<bytes::Bytes, std::convert::Infallible>>(32);
    let archive_project = payload.project.clone();
    let task_state = state.clone();

    tokio::spawn(async move {
        let mut full_reply = String::new();
        while let Some(item) = upstream.recv().await {
            let text = match item {
                Ok(delta) => {
                    full_reply.push_str(&delta);
                    delta
                }
                Err(e) => format!("Error: {}", e),
            };
            if tx.send(Ok(bytes::Bytes::from(text))).await.is_err() {
                return;
            }
        }
        if let Some(project) = archive_project {
            if !full_reply.is_empty() {
                if let Err(e) = task_state.chats.save_message(&project, "assistant", &full_reply) {
                    log::warn!("Failed to archive assistant reply: {}", e);
                }
            }
        }
    });

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response())
}

async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut results = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("files") && field.name() != Some("file") {
            continue;
        }
        let filename = sanitize_filename(field.file_name().unwrap_or("file"));
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let path = save_upload(&state.config, &filename, &data).await?;
        let text = extract_in_background(path).await?;

        let summary = if text.trim().is_empty() {
            "I could not read this file (unsupported or empty).".to_string()
        } else {
            state.llm.summarize_upload(&text).await
        };
        results.push(json!({"filename": filename, "summary": summary}));
    }

    if results.is_empty() {
        return Err(AppError::Validation("No files were sent.".into()));
    }
    Ok(Json(json!({"files": results})))
}

// ── Record CRUD ───────────────────────────────────────────────────────

fn filtered_enriched(state: &AppState, archived: bool) -> Result<Vec<EnrichedRecord>, AppError> {
    let now = Utc::now();
    let records = state.store.lock().load()?;
    Ok(records
        .iter()
        .filter(|r| r.archived == archived)
        .map(|r| enrich(r, now))
        .collect())
}

async fn list_dems(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let archived = matches!(
        query.archived.as_deref().map(str::to_lowercase).as_deref(),
        Some("1") | Some("true") | Some("yes")
    );
    let projects = filtered_enriched(&state, archived)?;
    Ok(Json(json!({"projects": projects})))
}

async fn create_dem(
    State(state): State<SharedState>,
    Json(payload): Json<NewDem>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = state.store.lock().create(&payload, Utc::now())?;
    Ok(Json(json!({"project": enrich(&record, Utc::now())})))
}

async fn add_note(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<NotePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = state.store.lock().add_note(&id, &payload.text, Utc::now())?;
    Ok(Json(json!({"project": enrich(&record, Utc::now())})))
}

async fn edit_note(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<NotePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let index = payload
        .index
        .ok_or_else(|| AppError::Validation("Invalid index or empty text.".into()))?;
    let record = state.store.lock().edit_note(&id, index, &payload.text, Utc::now())?;
    Ok(Json(json!({"project": enrich(&record, Utc::now())})))
}

async fn delete_note(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<NotePayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let index = payload
        .index
        .ok_or_else(|| AppError::Validation("Missing index".into()))?;
    let record = state.store.lock().delete_note(&id, index, Utc::now())?;
    Ok(Json(json!({"project": enrich(&record, Utc::now())})))
}

async fn update_dem(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<DemFieldPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = state.store.lock().update(&id, Utc::now(), |record| {
        patch.apply(record);
        Ok(())
    })?;
    Ok(Json(json!({"project": enrich(&record, Utc::now())})))
}

async fn archive_dem(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = state.store.lock().set_archived(&id, true, Utc::now())?;
    Ok(Json(json!({"project": enrich(&record, Utc::now())})))
}

async fn restore_dem(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = state.store.lock().set_archived(&id, false, Utc::now())?;
    Ok(Json(json!({"project": enrich(&record, Utc::now())})))
}

async fn delete_dem(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.lock().delete(&id)?;
    Ok(Json(json!({"success": true})))
}

async fn attach_document(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut attached = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = sanitize_filename(field.file_name().unwrap_or("document"));
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        attached = Some((filename, data));
        break;
    }

    let (filename, data) =
        attached.ok_or_else(|| AppError::Validation("No file was received.".into()))?;

    let path = save_upload(&state.config, &filename, &data).await?;
    let text = extract_in_background(path).await?;
    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "I could not read this file to generate an executive summary.".into(),
        ));
    }

    let summary = state.llm.executive_summary(&text).await;
    let document = crate::types::DocumentRef {
        filename,
        summary,
        date: Utc::now().format("%Y-%m-%d %H:%M").to_string(),
    };
    let record = state.store.lock().attach_document(&id, document, Utc::now())?;
    Ok(Json(json!({"project": enrich(&record, Utc::now())})))
}

async fn delete_summary(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = state.store.lock().clear_doc_summary(&id, Utc::now())?;
    Ok(Json(json!({"project": enrich(&record, Utc::now())})))
}

async fn solution_analysis(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = {
        let store = state.store.lock();
        store
            .load()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(AppError::NotFound)?
    };
    let analysis = state.llm.solution_analysis(&enrich(&record, Utc::now())).await?;
    Ok(Json(json!({"analysis": analysis})))
}

// ── Reports & exports ─────────────────────────────────────────────────

async fn report_panel(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let records = filtered_enriched(&state, false)?;

    let mut highlights = Vec::with_capacity(records.len());
    for record in &records {
        highlights.push(state.llm.record_highlight(record).await);
    }

    let html = export::html::build_portfolio_html(&records, &highlights, Utc::now());
    Ok(Json(json!({"report": html})))
}

async fn report_ai(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let records = filtered_enriched(&state, false)?;
    if records.is_empty() {
        return Err(AppError::Validation(
            "No projects provided for analysis.".into(),
        ));
    }
    let report = state.llm.portfolio_ai_report(&records).await?;
    Ok(Json(json!({"report": report})))
}

async fn export_active_xlsx(State(state): State<SharedState>) -> Result<Response, AppError> {
    let records = filtered_enriched(&state, false)?;
    let bytes = export::xlsx::build_xlsx(&records, "Active DEMs")
        .map_err(|e| AppError::Persistence(e.to_string()))?;
    Ok(attachment(
        bytes,
        "dems_active.xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ))
}

async fn export_archived_xlsx(State(state): State<SharedState>) -> Result<Response, AppError> {
    let records = filtered_enriched(&state, true)?;
    let bytes = export::xlsx::build_xlsx(&records, "Archived DEMs")
        .map_err(|e| AppError::Persistence(e.to_string()))?;
    Ok(attachment(
        bytes,
        "dems_archived.xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ))
}

async fn export_json(State(state): State<SharedState>) -> Result<Response, AppError> {
    let records = state.store.lock().load()?;
    let payload = serde_json::to_string_pretty(&records)
        .map_err(|e| AppError::Persistence(e.to_string()))?;
    Ok(attachment(
        payload.into_bytes(),
        "dems_backup.json",
        "application/json; charset=utf-8",
    ))
}

async fn import_dems(
    State(state): State<SharedState>,
    Json(payload): Json<ImportPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let projects = payload.projects.ok_or_else(|| {
        AppError::Validation("Invalid JSON structure: 'projects' must be a list.".into())
    })?;
    let now = Utc::now();
    let merged = state.store.lock().import(projects, now)?;
    let enriched: Vec<EnrichedRecord> = merged.iter().map(|r| enrich(r, now)).collect();
    Ok(Json(json!({"projects": enriched})))
}

async fn download_report(
    State(state): State<SharedState>,
    Path(fmt): Path<String>,
) -> Result<Response, AppError> {
    let records = filtered_enriched(&state, false)?;
    let now = Utc::now();

    match fmt.to_lowercase().as_str() {
        "txt" => {
            let text = build_portfolio_text(&records, now);
            Ok(attachment(
                text.into_bytes(),
                "dems_portfolio.txt",
                "text/plain; charset=utf-8",
            ))
        }
        "docx" => {
            let bytes = export::docx::build_docx(&records, now)
                .map_err(|e| AppError::Persistence(e.to_string()))?;
            Ok(attachment(
                bytes,
                "dems_portfolio.docx",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ))
        }
        "pdf" => {
            let bytes = export::pdf::build_pdf(&records, now)
                .map_err(|e| AppError::Persistence(e.to_string()))?;
            Ok(attachment(bytes, "dems_portfolio.pdf", "application/pdf"))
        }
        _ => Err(AppError::Validation("Unsupported format.".into())),
    }
}

// ── Uploaded files ────────────────────────────────────────────────────

async fn list_files(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, AppError> {
    let dir = state.config.upload_dir();
    let mut files = Vec::new();

    let entries = match std::fs::read_dir(&dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Json(json!({"files": files})))
        }
        Err(e) => return Err(AppError::Persistence(e.to_string())),
    };

    for entry in entries.flatten() {
        let meta = match entry.metadata() {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        let size_mb = meta.len() as f64 / (1024.0 * 1024.0);
        let date = meta
            .modified()
            .ok()
            .map(|t| {
                chrono::DateTime::<Utc>::from(t)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_default();
        files.push(json!({
            "name": entry.file_name().to_string_lossy(),
            "size": format!("{:.2} MB", size_mb),
            "date": date,
        }));
    }
    Ok(Json(json!({"files": files})))
}

async fn download_file(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let safe_name = sanitize_filename(&filename);
    let path = state.config.upload_dir().join(&safe_name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(AppError::Persistence(e.to_string())),
    };
    Ok(attachment(bytes, &safe_name, "application/octet-stream"))
}

async fn delete_file(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let path = state.config.upload_dir().join(sanitize_filename(&filename));
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(Json(json!({"success": true}))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
        Err(e) => Err(AppError::Persistence(e.to_string())),
    }
}

// ── Chat histories ────────────────────────────────────────────────────

async fn list_chats(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, AppError> {
    let projects = state.chats.list_projects()?;
    Ok(Json(json!({"projects": projects})))
}

async fn get_chat(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Json<serde_json::Value> {
    let history = state.chats.load(&name);
    Json(json!({"project": history.project, "messages": history.messages}))
}

async fn overwrite_chat(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(payload): Json<OverwriteChatPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.chats.overwrite(&name, payload.messages)?;
    Ok(Json(json!({"success": true})))
}

async fn delete_chat(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.chats.delete(&name)?;
    Ok(Json(json!({"success": true})))
}

async fn export_chat(State(state): State<SharedState>, Path(name): Path<String>) -> Response {
    let text = state.chats.export_text(&name);
    let filename = format!("{}_chat.txt", crate::util::sanitize_project_name(&name));
    attachment(text.into_bytes(), &filename, "text/plain; charset=utf-8")
}

// ── Helpers ───────────────────────────────────────────────────────────

fn attachment(bytes: Vec<u8>, filename: &str, content_type: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn save_upload(
    config: &Config,
    filename: &str,
    data: &[u8],
) -> Result<std::path::PathBuf, AppError> {
    let dir = config.upload_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Persistence(e.to_string()))?;
    let save_name = format!("{}_{}", Utc::now().timestamp(), filename);
    let path = dir.join(save_name);
    log::info!("Saving uploaded file at {}", path.display());
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| AppError::Persistence(e.to_string()))?;
    Ok(path)
}

/// Document parsing can be CPU-heavy (and pdf parsing panicky), so it
/// runs off the async runtime.
async fn extract_in_background(path: std::path::PathBuf) -> Result<String, AppError> {
    let result = tokio::task::spawn_blocking(move || crate::extract::extract_text(&path))
        .await
        .map_err(|e| AppError::Persistence(e.to_string()))?;
    match result {
        Ok(text) => Ok(text),
        Err(e) => {
            log::warn!("Extraction failed: {}", e);
            Ok(String::new())
        }
    }
}
