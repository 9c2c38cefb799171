use crate::error::Result;
use crate::handlers::bounded;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let url = bounded(state.request_timeout(), state.engine().resolve(&code)).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}
