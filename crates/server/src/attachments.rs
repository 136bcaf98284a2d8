//! Attachment metadata API endpoints. File contents live elsewhere.

use api_types::attachment::{
    AttachmentListResponse, AttachmentNew, AttachmentUpdate, AttachmentView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::NewAttachmentCmd;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

fn map_attachment(attachment: engine::Attachment) -> AttachmentView {
    AttachmentView {
        id: attachment.id,
        transaction_id: attachment.transaction_id,
        file_name: attachment.file_name,
        file_path: attachment.file_path,
        file_type: attachment.file_type,
        file_size: attachment.file_size,
        description: attachment.description,
        uploaded_at: attachment.uploaded_at,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<AttachmentListResponse>, ServerError> {
    let attachments = state
        .engine
        .list_attachments(transaction_id, &user.username)
        .await?
        .into_iter()
        .map(map_attachment)
        .collect();
    Ok(Json(AttachmentListResponse { attachments }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<AttachmentNew>,
) -> Result<(StatusCode, Json<AttachmentView>), ServerError> {
    let cmd = NewAttachmentCmd {
        file_type: payload.file_type,
        file_size: payload.file_size,
        description: payload.description,
        ..NewAttachmentCmd::new(
            &user.username,
            transaction_id,
            payload.file_name,
            payload.file_path,
        )
    };
    let attachment = state.engine.add_attachment(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_attachment(attachment))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AttachmentView>, ServerError> {
    let attachment = state.engine.attachment(id, &user.username).await?;
    Ok(Json(map_attachment(attachment)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachmentUpdate>,
) -> Result<Json<AttachmentView>, ServerError> {
    let attachment = state
        .engine
        .update_attachment_description(id, &user.username, &payload.description)
        .await?;
    Ok(Json(map_attachment(attachment)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let attachment = state.engine.delete_attachment(id, &user.username).await?;
    tracing::info!(path = %attachment.file_path, "attachment metadata removed");
    Ok(StatusCode::NO_CONTENT)
}
