use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AppState, AuthUser};
use crate::core::workspace::{ensure_editable, sort_shoot_dates, validate_revenue_split, validate_roles};
use crate::error::ApiError;
use crate::models::{
    Collaboration, CollaborationSide, CollaborationStatus, CollaborationView,
    CreateCollaborationRequest, CollaborationWorkspace, UpdateCollaborationStatusRequest,
    WorkspaceUpdateRequest, WorkspaceView,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/collaborations")
            .route("", web::get().to(list_collaborations))
            .route("", web::post().to(request_collaboration))
            .route("/{id}/status", web::patch().to(update_status))
            .route("/{id}/acknowledge", web::post().to(acknowledge))
            .route("/{id}/workspace", web::get().to(get_workspace))
            .route("/{id}/workspace", web::put().to(update_workspace))
            .route("/{id}/workspace/boundaries", web::post().to(acknowledge_boundaries)),
    );
}

/// Load a collaboration and the caller's side of it
///
/// Non-participants get 404.
async fn load_for_participant(
    state: &AppState,
    id: i64,
    user_id: &str,
) -> Result<(Collaboration, CollaborationSide), ApiError> {
    let collaboration = state
        .postgres
        .get_collaboration(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Collaboration not found"))?;

    match collaboration.side_of(user_id) {
        Some(side) => Ok((collaboration, side)),
        None => Err(ApiError::not_found("Collaboration not found")),
    }
}

async fn workspace_view(
    state: &AppState,
    collaboration: Collaboration,
    workspace: CollaborationWorkspace,
) -> Result<WorkspaceView, ApiError> {
    let boundaries = |profile: Option<crate::models::Profile>| {
        profile
            .map(|p| p.boundaries)
            .unwrap_or_else(|| serde_json::json!({}))
    };

    let requester_boundaries = boundaries(state.postgres.get_profile(&collaboration.requester_id).await?);
    let receiver_boundaries = boundaries(state.postgres.get_profile(&collaboration.receiver_id).await?);

    Ok(WorkspaceView {
        workspace,
        can_edit: collaboration.status == CollaborationStatus::Accepted,
        collaboration,
        requester_boundaries,
        receiver_boundaries,
    })
}

/// GET /api/collaborations
async fn list_collaborations(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let collaborations = state.postgres.list_collaborations(auth.id()).await?;
    let users = state
        .summaries(
            collaborations
                .iter()
                .flat_map(|c| [c.requester_id.clone(), c.receiver_id.clone()]),
        )
        .await?;

    let views: Vec<CollaborationView> = collaborations
        .into_iter()
        .map(|collaboration| CollaborationView {
            requester: users.get(&collaboration.requester_id).cloned(),
            receiver: users.get(&collaboration.receiver_id).cloned(),
            collaboration,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// POST /api/collaborations
async fn request_collaboration(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateCollaborationRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let receiver_id = req.receiver_id.trim();

    if receiver_id == auth.id() {
        return Err(ApiError::bad_request("Cannot collaborate with yourself"));
    }
    state.postgres.require_user(receiver_id).await?;

    if state.postgres.is_blocked_either_way(auth.id(), receiver_id).await? {
        return Err(ApiError::bad_request("Cannot send a collaboration request to this user"));
    }
    if state.postgres.restrictions_on(receiver_id, auth.id()).await?.no_collaborations {
        return Err(ApiError::bad_request("This user is not accepting collaboration requests from you"));
    }

    let collaboration = state
        .postgres
        .create_collaboration(auth.id(), receiver_id, req.message.trim())
        .await?;
    Ok(HttpResponse::Created().json(collaboration))
}

/// PATCH /api/collaborations/{id}/status
///
/// Only the receiver resolves a request, and only while it is pending.
async fn update_status(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
    req: web::Json<UpdateCollaborationStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    if req.status == CollaborationStatus::Pending {
        return Err(ApiError::bad_request("Status must be accepted or rejected"));
    }

    let (collaboration, side) = load_for_participant(&state, path.into_inner(), auth.id()).await?;
    if side != CollaborationSide::Receiver {
        return Err(ApiError::forbidden("Only the receiver can respond to this request"));
    }

    let updated = state
        .postgres
        .resolve_collaboration(collaboration.id, req.status)
        .await?;

    tracing::info!("Collaboration {} {:?} by {}", updated.id, updated.status, auth.id());
    Ok(HttpResponse::Ok().json(updated))
}

/// POST /api/collaborations/{id}/acknowledge
async fn acknowledge(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let (collaboration, side) = load_for_participant(&state, path.into_inner(), auth.id()).await?;
    let updated = state
        .postgres
        .acknowledge_collaboration(collaboration.id, side)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// GET /api/collaborations/{id}/workspace
async fn get_workspace(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let (collaboration, _) = load_for_participant(&state, path.into_inner(), auth.id()).await?;
    let workspace = state.postgres.get_or_create_workspace(collaboration.id).await?;

    Ok(HttpResponse::Ok().json(workspace_view(&state, collaboration, workspace).await?))
}

/// PUT /api/collaborations/{id}/workspace
async fn update_workspace(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
    req: web::Json<WorkspaceUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let mut update = req.into_inner();

    let (collaboration, _) = load_for_participant(&state, path.into_inner(), auth.id()).await?;
    ensure_editable(&collaboration)?;

    if let Some(split) = &update.revenue_split {
        validate_revenue_split(split, &collaboration)?;
    }
    if let Some(roles) = &update.roles {
        validate_roles(roles, &collaboration)?;
    }
    update.shoot_dates = update.shoot_dates.take().map(sort_shoot_dates);

    let workspace = state.postgres.update_workspace(collaboration.id, &update).await?;
    tracing::info!("Workspace for collaboration {} updated by {}", collaboration.id, auth.id());

    Ok(HttpResponse::Ok().json(workspace_view(&state, collaboration, workspace).await?))
}

/// POST /api/collaborations/{id}/workspace/boundaries
async fn acknowledge_boundaries(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let (collaboration, side) = load_for_participant(&state, path.into_inner(), auth.id()).await?;
    ensure_editable(&collaboration)?;
    let workspace = state
        .postgres
        .acknowledge_boundaries(collaboration.id, side)
        .await?;

    Ok(HttpResponse::Ok().json(workspace_view(&state, collaboration, workspace).await?))
}
