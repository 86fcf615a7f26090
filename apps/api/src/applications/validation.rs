use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{BehavioralResponse, CandidateDetails};

/// Largest resume accepted by the upload endpoint (10 MiB).
pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_RESUME_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx", ".txt"];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern compiles")
});

/// Phase-1 presence and format checks. Trims every field and lowercases the
/// email before it reaches the store.
pub fn validate_details(
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<CandidateDetails, AppError> {
    let (Some(name), Some(email), Some(phone)) = (required(name), required(email), required(phone))
    else {
        return Err(AppError::Validation(
            "Please provide all required fields".to_string(),
        ));
    };

    let email = email.to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::Validation(
            "Please provide a valid email".to_string(),
        ));
    }

    Ok(CandidateDetails {
        name: name.to_string(),
        email,
        phone: phone.to_string(),
    })
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Phase-3 payload checks. `responses` arrives untyped so that a missing or
/// non-array value can be told apart from a malformed entry.
pub fn validate_responses(
    application_id: Option<&str>,
    responses: Option<&Value>,
) -> Result<Vec<BehavioralResponse>, AppError> {
    let invalid = || AppError::Validation("Invalid request data".to_string());

    if application_id.map_or(true, |id| id.trim().is_empty()) {
        return Err(invalid());
    }
    let entries = responses.and_then(Value::as_array).ok_or_else(invalid)?;

    let has_answer = entries.iter().any(|entry| {
        let question = entry.get("question").and_then(Value::as_str).unwrap_or("");
        let text = entry
            .get("textResponse")
            .and_then(Value::as_str)
            .unwrap_or("");
        !question.is_empty() && !text.trim().is_empty()
    });
    if !has_answer {
        return Err(AppError::Validation(
            "Please provide at least one response".to_string(),
        ));
    }

    entries
        .iter()
        .map(|entry| {
            serde_json::from_value::<BehavioralResponse>(entry.clone())
                .ok()
                .filter(|r| !r.question.is_empty() && !r.text_response.is_empty())
                .ok_or_else(|| {
                    AppError::Validation(
                        "Each response needs a question and a textResponse".to_string(),
                    )
                })
        })
        .collect()
}

/// Extension allow-list and size cap for uploaded resumes.
pub fn check_resume_file(original_name: &str, size: usize) -> Result<(), AppError> {
    let ext = resume_extension(original_name);
    if !ALLOWED_RESUME_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::Validation(
            "Only PDF, DOC, DOCX, and TXT files are allowed".to_string(),
        ));
    }
    if size > MAX_RESUME_BYTES {
        return Err(AppError::Validation(
            "File size should be less than 10MB".to_string(),
        ));
    }
    Ok(())
}

/// Lowercased extension including the dot, or an empty string.
pub fn resume_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// Absent, blank, and unparseable ids all mean "no such record".
pub fn parse_application_id(raw: Option<&str>) -> Option<Uuid> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Uuid::parse_str(s).ok())
}
