//! Session endpoints: open, re-render, interact, receipt, export.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use checkout::{DeskResponse, OrderDesk};
use common::SessionId;
use domain::{Interaction, Presentation};
use serde::Serialize;
use sheet_store::{InventorySheet, OrderLogSheet, SessionStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, St> {
    pub desk: OrderDesk<S, St>,
}

// -- Response types --

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub version: i64,
    pub phase: String,
    pub cart_lines: usize,
    pub presentation: Presentation,
}

impl From<DeskResponse> for SessionResponse {
    fn from(response: DeskResponse) -> Self {
        Self {
            session_id: response.session_id.to_string(),
            version: response.version.as_i64(),
            phase: response.session.phase.to_string(),
            cart_lines: response.session.cart.len(),
            presentation: response.presentation,
        }
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    SessionId::from_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid session id: {e}")))
}

/// Replaces characters that cannot appear in a quoted header parameter.
fn header_safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

// -- Handlers --

/// POST /sessions: open an empty session.
#[tracing::instrument(skip(state))]
pub async fn create<S, St>(
    State(state): State<Arc<AppState<S, St>>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError>
where
    S: InventorySheet + OrderLogSheet + 'static,
    St: SessionStore + 'static,
{
    let response = state.desk.open_session().await?;
    Ok((StatusCode::CREATED, Json(response.into())))
}

/// GET /sessions/{id}: re-render the current state.
#[tracing::instrument(skip(state))]
pub async fn get<S, St>(
    State(state): State<Arc<AppState<S, St>>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError>
where
    S: InventorySheet + OrderLogSheet + 'static,
    St: SessionStore + 'static,
{
    let session_id = parse_session_id(&id)?;
    let response = state.desk.present(session_id).await?;
    Ok(Json(response.into()))
}

/// DELETE /sessions/{id}: close a session.
#[tracing::instrument(skip(state))]
pub async fn close<S, St>(
    State(state): State<Arc<AppState<S, St>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: InventorySheet + OrderLogSheet + 'static,
    St: SessionStore + 'static,
{
    let session_id = parse_session_id(&id)?;
    state.desk.close_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /sessions/{id}/interactions: apply one user action.
#[tracing::instrument(skip(state, interaction), fields(interaction = interaction.name()))]
pub async fn interact<S, St>(
    State(state): State<Arc<AppState<S, St>>>,
    Path(id): Path<String>,
    Json(interaction): Json<Interaction>,
) -> Result<Json<SessionResponse>, ApiError>
where
    S: InventorySheet + OrderLogSheet + 'static,
    St: SessionStore + 'static,
{
    let session_id = parse_session_id(&id)?;
    let response = state.desk.interact(session_id, interaction).await?;
    Ok(Json(response.into()))
}

/// GET /sessions/{id}/receipt: printable receipt of the committed order.
#[tracing::instrument(skip(state))]
pub async fn receipt<S, St>(
    State(state): State<Arc<AppState<S, St>>>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError>
where
    S: InventorySheet + OrderLogSheet + 'static,
    St: SessionStore + 'static,
{
    let session_id = parse_session_id(&id)?;
    let document = state.desk.receipt(session_id).await?;
    Ok(Html(document.html))
}

/// GET /sessions/{id}/export: spreadsheet download of the committed order.
#[tracing::instrument(skip(state))]
pub async fn export<S, St>(
    State(state): State<Arc<AppState<S, St>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: InventorySheet + OrderLogSheet + 'static,
    St: SessionStore + 'static,
{
    let session_id = parse_session_id(&id)?;
    let artifact = state.desk.export(session_id).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe_file_name(&artifact.file_name)
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    ))
}
