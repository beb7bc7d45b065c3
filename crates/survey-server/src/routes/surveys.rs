//! Survey API routes
//!
//! Thin translation layer: parse parameters, validate shape, delegate to
//! the survey service, map failures to status codes via `SurveyError`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::SurveyError;
use crate::models::{
    AppendVersionsRequest, CreateSurveyRequest, DeleteAllResponse, MessageResponse,
    StorageStatsResponse, Survey, SurveyResponse, SurveysListResponse, VersionResponse,
};
use crate::services::SurveyService;
use crate::state::AppState;

pub fn survey_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/surveys/",
            get(list_surveys).post(create_survey).delete(clear_surveys),
        )
        .route("/api/surveys/search/{query}", get(search_surveys))
        .route("/api/surveys/stats/storage", get(storage_stats))
        .route(
            "/api/surveys/{survey_id}",
            get(get_survey).put(append_versions).delete(delete_survey),
        )
        .route(
            "/api/surveys/{survey_id}/versions/{version}",
            get(get_survey_version),
        )
        .route("/api/surveys/{survey_id}/export", get(export_survey))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    skip: Option<i64>,
    limit: Option<i64>,
}

/// Validate pagination parameters, applying the defaults
fn pagination(skip: Option<i64>, limit: Option<i64>) -> Result<(u64, i64), SurveyError> {
    let skip = skip.unwrap_or(0);
    if skip < 0 {
        return Err(SurveyError::InvalidInput(
            "skip must be >= 0".to_string(),
        ));
    }
    let limit = limit.unwrap_or(100);
    if limit <= 0 {
        return Err(SurveyError::InvalidInput("limit must be > 0".to_string()));
    }
    Ok((skip as u64, limit))
}

async fn create_survey(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSurveyRequest>,
) -> Result<impl IntoResponse, SurveyError> {
    let service = SurveyService::new((*state.db).clone());
    let survey = service.create(req.survey_id, req.versions).await?;
    let message = format!("Survey {} saved successfully", survey.survey_id);

    Ok((
        StatusCode::CREATED,
        Json(SurveyResponse {
            success: true,
            survey: survey.into(),
            message: Some(message),
        }),
    ))
}

async fn append_versions(
    State(state): State<Arc<AppState>>,
    Path(survey_id): Path<String>,
    Json(req): Json<AppendVersionsRequest>,
) -> Result<Json<SurveyResponse>, SurveyError> {
    let service = SurveyService::new((*state.db).clone());
    let survey = service.append_versions(&survey_id, req.versions).await?;

    Ok(Json(SurveyResponse {
        success: true,
        survey: survey.into(),
        message: Some(format!("Survey {} updated successfully", survey_id)),
    }))
}

async fn get_survey(
    State(state): State<Arc<AppState>>,
    Path(survey_id): Path<String>,
) -> Result<Json<SurveyResponse>, SurveyError> {
    let service = SurveyService::new((*state.db).clone());
    let survey = service.get(&survey_id).await?;

    Ok(Json(SurveyResponse {
        success: true,
        survey: survey.into(),
        message: None,
    }))
}

async fn get_survey_version(
    State(state): State<Arc<AppState>>,
    Path((survey_id, version)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, SurveyError> {
    let version: i32 = version
        .parse()
        .map_err(|_| SurveyError::InvalidInput(format!("Invalid version number: {}", version)))?;

    let service = SurveyService::new((*state.db).clone());
    let version = service.get_version(&survey_id, version).await?;

    Ok(Json(VersionResponse {
        success: true,
        version: version.into(),
    }))
}

async fn delete_survey(
    State(state): State<Arc<AppState>>,
    Path(survey_id): Path<String>,
) -> Result<Json<MessageResponse>, SurveyError> {
    let service = SurveyService::new((*state.db).clone());
    service.delete(&survey_id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: format!("Survey {} deleted successfully", survey_id),
    }))
}

async fn search_surveys(
    State(state): State<Arc<AppState>>,
    Path(query): Path<String>,
) -> Result<Json<SurveysListResponse>, SurveyError> {
    let service = SurveyService::new((*state.db).clone());
    let surveys: Vec<Survey> = service
        .search(&query)
        .await?
        .into_iter()
        .map(Survey::from)
        .collect();
    let total = surveys.len() as u64;

    Ok(Json(SurveysListResponse {
        success: true,
        surveys,
        total,
    }))
}

async fn list_surveys(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> Result<Json<SurveysListResponse>, SurveyError> {
    let (skip, limit) = pagination(q.skip, q.limit)?;

    let service = SurveyService::new((*state.db).clone());
    let (surveys, total) = service.list(skip, limit).await?;

    Ok(Json(SurveysListResponse {
        success: true,
        surveys: surveys.into_iter().map(Survey::from).collect(),
        total,
    }))
}

async fn clear_surveys(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeleteAllResponse>, SurveyError> {
    let service = SurveyService::new((*state.db).clone());
    let deleted_count = service.delete_all().await?;

    Ok(Json(DeleteAllResponse {
        success: true,
        deleted_count,
        message: format!("Deleted {} surveys", deleted_count),
    }))
}

async fn storage_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StorageStatsResponse>, SurveyError> {
    let service = SurveyService::new((*state.db).clone());
    Ok(Json(service.storage_stats().await?))
}

async fn export_survey(
    State(state): State<Arc<AppState>>,
    Path(survey_id): Path<String>,
) -> Result<impl IntoResponse, SurveyError> {
    let service = SurveyService::new((*state.db).clone());
    let survey = Survey::from(service.get(&survey_id).await?);
    let json = serde_json::to_string_pretty(&survey)?;

    let headers = [
        ("content-type", "application/json".to_string()),
        (
            "content-disposition",
            format!("attachment; filename=survey_{}.json", survey.survey_id),
        ),
    ];
    Ok((headers, json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(pagination(None, None).unwrap(), (0, 100));
        assert_eq!(pagination(Some(2), Some(2)).unwrap(), (2, 2));
    }

    #[test]
    fn test_pagination_rejects_bad_params() {
        assert!(pagination(Some(-1), None).is_err());
        assert!(pagination(None, Some(0)).is_err());
        assert!(pagination(None, Some(-5)).is_err());
    }
}
