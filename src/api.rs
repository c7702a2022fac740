//! HTTP routes for weather records, search and export

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;

use crate::export::{CSV_CONTENT_TYPE, CSV_FILENAME};
use crate::models::{LocationSuggestion, MessageResponse, WeatherRecord, WeatherRequest};
use crate::service::WeatherRecordService;

type ApiResult<T> = Result<T, crate::WeatherRecordError>;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

pub fn router(service: WeatherRecordService) -> Router {
    Router::new()
        .route("/weather", get(list_records).post(create_record))
        .route("/weather/{id}", put(update_record).delete(delete_record))
        .route("/search", get(search_locations))
        .route("/export/json", get(export_json))
        .route("/export/csv", get(export_csv))
        .with_state(service)
}

async fn create_record(
    State(service): State<WeatherRecordService>,
    Json(request): Json<WeatherRequest>,
) -> ApiResult<Json<WeatherRecord>> {
    Ok(Json(service.create(request).await?))
}

async fn list_records(
    State(service): State<WeatherRecordService>,
) -> ApiResult<Json<Vec<WeatherRecord>>> {
    Ok(Json(service.list().await?))
}

async fn update_record(
    State(service): State<WeatherRecordService>,
    Path(id): Path<String>,
    Json(request): Json<WeatherRequest>,
) -> ApiResult<Json<WeatherRecord>> {
    Ok(Json(service.update(&id, request).await?))
}

async fn delete_record(
    State(service): State<WeatherRecordService>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    service.delete(&id).await?;
    Ok(Json(MessageResponse::new("Record deleted")))
}

async fn search_locations(
    State(service): State<WeatherRecordService>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<LocationSuggestion>>> {
    Ok(Json(service.search(&params.query).await?))
}

async fn export_json(
    State(service): State<WeatherRecordService>,
) -> ApiResult<Json<Vec<WeatherRecord>>> {
    Ok(Json(service.export_json().await?))
}

async fn export_csv(State(service): State<WeatherRecordService>) -> ApiResult<impl IntoResponse> {
    let body = service.export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={CSV_FILENAME}"),
            ),
        ],
        body,
    ))
}
