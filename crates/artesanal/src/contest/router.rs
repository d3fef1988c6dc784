use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use super::entry::EntryId;
use super::export::{EXPORT_CONTENT_TYPE, EXPORT_FILENAME};
use super::form::SubmissionForm;
use super::notify::NotificationDispatcher;
use super::render::{DOCUMENT_CONTENT_TYPE, DOCUMENT_FILENAME};
use super::service::{SubmissionError, SubmissionService};
use super::store::{EntryStore, StoreError};

/// Router builder exposing the submission pipeline over HTTP.
pub fn contest_router<S, N>(service: Arc<SubmissionService<S, N>>) -> Router
where
    S: EntryStore + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route("/api/v1/inscricoes", post(submit_handler::<S, N>))
        .route("/api/v1/inscricoes", get(list_handler::<S, N>))
        .route("/api/v1/inscricoes/export", get(export_handler::<S, N>))
        .route(
            "/api/v1/inscricoes/:id/documento",
            get(document_handler::<S, N>),
        )
        .route("/api/v1/inscricoes/:id", delete(delete_handler::<S, N>))
        .with_state(service)
}

pub(crate) async fn submit_handler<S, N>(
    State(service): State<Arc<SubmissionService<S, N>>>,
    Json(form): Json<SubmissionForm>,
) -> Response
where
    S: EntryStore + 'static,
    N: NotificationDispatcher + 'static,
{
    // Submission does blocking file and mail I/O.
    match tokio::task::spawn_blocking(move || service.submit(form)).await {
        Ok(Ok(receipt)) => {
            let payload = json!({
                "id": receipt.id,
                "codigo_unico": receipt.tracking_code,
                "status": receipt.status.label(),
                "documento": format!("/api/v1/inscricoes/{}/documento", receipt.id),
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Ok(Err(SubmissionError::Validation(error))) => {
            let payload = json!({
                "error": { "kind": "validation", "message": error.to_string() },
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Ok(Err(other)) => fatal_response(other),
        Err(error) => join_failure(error),
    }
}

pub(crate) async fn list_handler<S, N>(
    State(service): State<Arc<SubmissionService<S, N>>>,
) -> Response
where
    S: EntryStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.entries() {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => fatal_response(error),
    }
}

pub(crate) async fn document_handler<S, N>(
    State(service): State<Arc<SubmissionService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: EntryStore + 'static,
    N: NotificationDispatcher + 'static,
{
    // Rendering re-reads the branding asset from disk.
    match tokio::task::spawn_blocking(move || service.document(EntryId(id))).await {
        Err(error) => join_failure(error),
        Ok(Ok(bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, DOCUMENT_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{DOCUMENT_FILENAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(Err(SubmissionError::Storage(StoreError::NotFound))) => not_found_response(id),
        Ok(Err(other)) => fatal_response(other),
    }
}

pub(crate) async fn export_handler<S, N>(
    State(service): State<Arc<SubmissionService<S, N>>>,
) -> Response
where
    S: EntryStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match tokio::task::spawn_blocking(move || service.export()).await {
        Err(error) => join_failure(error),
        Ok(Ok(bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{EXPORT_FILENAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(Err(error)) => fatal_response(error),
    }
}

pub(crate) async fn delete_handler<S, N>(
    State(service): State<Arc<SubmissionService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: EntryStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.delete(EntryId(id)) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": "inscrição removida" })),
        )
            .into_response(),
        Err(SubmissionError::Storage(StoreError::NotFound)) => not_found_response(id),
        Err(other) => fatal_response(other),
    }
}

fn not_found_response(id: u64) -> Response {
    let payload = json!({
        "error": { "kind": "not_found", "message": format!("inscrição {id} não encontrada") },
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

fn fatal_response(error: SubmissionError) -> Response {
    let payload = json!({
        "error": { "kind": "internal", "message": error.to_string() },
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

fn join_failure(error: tokio::task::JoinError) -> Response {
    let payload = json!({
        "error": { "kind": "internal", "message": error.to_string() },
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
