use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use crate::core::service::GroupService;
use crate::domain::model::{Attendee, GroupSet};
use crate::utils::error::{ErrorCategory, GroupsError};

pub type AppState = Arc<GroupService>;

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for GroupsError {
    fn into_response(self) -> Response {
        let status = match self.category() {
            ErrorCategory::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::SourceUnavailable => StatusCode::BAD_GATEWAY,
            ErrorCategory::Storage | ErrorCategory::Config => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("request failed: {} ({})", self, self.recovery_suggestion());
        } else {
            warn!("request rejected: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, GroupsError>;

#[derive(Deserialize, Debug)]
pub struct ShuffleParams {
    #[serde(alias = "sim_amount")]
    pub group_count: usize,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SwapRequest {
    pub name_one: String,
    pub name_two: String,
}

pub async fn index() -> &'static str {
    "sim-groups api is running"
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn get_attendees(State(service): State<AppState>) -> ApiResult<Json<Vec<Attendee>>> {
    Ok(Json(service.attendees().await?))
}

pub async fn put_attendees(
    State(service): State<AppState>,
    Json(attendees): Json<Vec<Attendee>>,
) -> ApiResult<Json<Vec<Attendee>>> {
    service.replace_attendees(attendees.clone()).await?;
    Ok(Json(attendees))
}

pub async fn refresh_attendees(
    State(service): State<AppState>,
) -> ApiResult<Json<Vec<Attendee>>> {
    Ok(Json(service.refresh_attendees().await?))
}

pub async fn get_groups(State(service): State<AppState>) -> ApiResult<impl IntoResponse> {
    let groups = service.groups().await?;
    Ok((
        [(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")],
        Json(groups),
    ))
}

pub async fn put_groups(
    State(service): State<AppState>,
    Json(groups): Json<GroupSet>,
) -> ApiResult<Json<GroupSet>> {
    service.replace_groups(groups.clone()).await?;
    Ok(Json(groups))
}

pub async fn shuffle_groups(
    State(service): State<AppState>,
    Query(params): Query<ShuffleParams>,
) -> ApiResult<Json<GroupSet>> {
    let groups = service
        .shuffle_groups(params.group_count, params.refresh)
        .await?;
    Ok(Json(groups))
}

pub async fn swap_members(
    State(service): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> ApiResult<Json<GroupSet>> {
    let groups = service
        .swap_members(&request.name_one, &request.name_two)
        .await?;
    Ok(Json(groups))
}
