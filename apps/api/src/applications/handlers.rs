use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::applications::phases::{
    attach_resume, get_application, list_applications, save_candidate_details, submit_responses,
};
use crate::applications::upload::{read_resume_form, store_resume};
use crate::applications::validation::{parse_application_id, validate_details, validate_responses};
use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, ApplicationSummary};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Every field is optional so that presence checks produce our own 400
/// instead of a deserializer rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDetailsRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub application_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralResponsesRequest {
    pub application_id: Option<String>,
    pub responses: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub success: bool,
    pub data: ApplicationRecord,
}

impl From<ApplicationRecord> for ApplicationResponse {
    fn from(data: ApplicationRecord) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicationListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<ApplicationSummary>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e.body_text())))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /candidate-details
pub async fn handle_candidate_details(
    State(state): State<AppState>,
    payload: Result<Json<CandidateDetailsRequest>, JsonRejection>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let request = json_body(payload)?;
    let details = validate_details(
        request.name.as_deref(),
        request.email.as_deref(),
        request.phone.as_deref(),
    )?;

    // A blank id means "create"; anything else must name an existing record.
    let target = match request.application_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            parse_application_id(Some(raw)).ok_or_else(AppError::application_not_found)?,
        ),
    };

    let record = save_candidate_details(state.store.as_ref(), target, details).await?;
    Ok(Json(record.into()))
}

/// POST /resume-upload
pub async fn handle_resume_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApplicationResponse>, AppError> {
    let form = read_resume_form(multipart).await?;
    let part = form
        .file
        .ok_or_else(|| AppError::Validation("Please upload a resume file".to_string()))?;

    let upload = store_resume(state.files.as_ref(), part).await?;
    let record = attach_resume(
        state.store.as_ref(),
        state.files.as_ref(),
        parse_application_id(form.application_id.as_deref()),
        upload,
    )
    .await?;
    Ok(Json(record.into()))
}

/// POST /behavioral-responses
pub async fn handle_behavioral_responses(
    State(state): State<AppState>,
    payload: Result<Json<BehavioralResponsesRequest>, JsonRejection>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let request = json_body(payload)?;
    let responses = validate_responses(
        request.application_id.as_deref(),
        request.responses.as_ref(),
    )?;

    let record = submit_responses(
        state.store.as_ref(),
        parse_application_id(request.application_id.as_deref()),
        responses,
    )
    .await?;
    Ok(Json(record.into()))
}

/// GET /:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let record = get_application(state.store.as_ref(), parse_application_id(Some(&id))).await?;
    Ok(Json(record.into()))
}

/// GET /
pub async fn handle_list_applications(
    State(state): State<AppState>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let data = list_applications(state.store.as_ref()).await?;
    Ok(Json(ApplicationListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}
