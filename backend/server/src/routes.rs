use std::{collections::HashMap, sync::Arc};

use axum::{
    Form, Json,
    body::Bytes,
    extract::{State as AxumState, rejection::FormRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};

use crate::{
    error::AppError,
    state::State,
    utils::{get_json_from_body, get_json_from_form},
    validation::{validate_body, validate_form},
};

pub const OBSERVATIONS_PATH: &str = "/api/observations";
pub const LEADERBOARD_PATH: &str = "/leaderboard";

pub async fn list_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<impl IntoResponse, AppError> {
    let observations = state.observations.list().await?;

    Ok(Json(observations))
}

pub async fn create_handler(
    AxumState(state): AxumState<Arc<State>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload = get_json_from_body(&headers, &body)?;
    let record = validate_body(&payload)?;

    let created = state.observations.create(record).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn leaderboard_handler(AxumState(state): AxumState<Arc<State>>) -> impl IntoResponse {
    Json(state.observations.leaderboard().await)
}

pub async fn submit_handler(
    AxumState(state): AxumState<Arc<State>>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Form(fields) = form.map_err(|_| AppError::InvalidForm)?;
    let record = validate_form(&get_json_from_form(fields))?;

    state.observations.create(record).await?;

    Ok(Redirect::to(LEADERBOARD_PATH))
}
