use crate::error::{ApiError, Result};
use crate::handlers::bounded;
use crate::model::{CreateLinkRequest, LinkStatsResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

pub async fn create_link_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LinkStatsResponse>)> {
    let Json(request) = payload.map_err(json_rejection)?;

    let stats = bounded(state.request_timeout(), state.engine().create(&request.url)).await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkStatsResponse::from_stats(stats, state.base_url())),
    ))
}

pub async fn list_links_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<LinkStatsResponse>>> {
    let listed = bounded(state.request_timeout(), state.engine().list()).await?;

    Ok(Json(
        listed
            .into_iter()
            .map(|stats| LinkStatsResponse::from_stats(stats, state.base_url()))
            .collect(),
    ))
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => ApiError::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Content-Type must be application/json",
        ),
        other => ApiError::new(StatusCode::BAD_REQUEST, other.body_text()),
    }
}
