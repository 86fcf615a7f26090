use once_cell::sync::Lazy;
use regex::Regex;

use crate::state::{FormData, FormErrors, FormField, ResumeAttachment};

pub const MAX_RESUME_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_RESUME_TYPES: [&str; 4] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email regex is valid"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d+\-()\s]{8,20}$").expect("phone regex is valid"));

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Checks the candidate details step. An empty map means the step may proceed.
pub fn validate_details(form: &FormData) -> FormErrors {
    let mut errors = FormErrors::new();

    if is_blank(&form.name) {
        errors.insert(FormField::Name, "Name is required".to_string());
    }

    if is_blank(&form.email) {
        errors.insert(FormField::Email, "Email is required".to_string());
    } else if !EMAIL_RE.is_match(&form.email) {
        errors.insert(FormField::Email, "Please enter a valid email".to_string());
    }

    if is_blank(&form.phone) {
        errors.insert(FormField::Phone, "Phone number is required".to_string());
    } else if !PHONE_RE.is_match(&form.phone) {
        errors.insert(FormField::Phone, "Please enter a valid phone number".to_string());
    }

    errors
}

/// Checks a picked file before it is accepted into the form.
pub fn check_resume(file: &ResumeAttachment) -> Result<(), String> {
    if !ALLOWED_RESUME_TYPES.contains(&file.mime_type.as_str()) {
        return Err("Please upload a PDF, DOC, DOCX, or TXT file".to_string());
    }
    if file.size > MAX_RESUME_BYTES {
        return Err("File size should be less than 10MB".to_string());
    }
    Ok(())
}

/// Only the first response is mandatory.
pub fn validate_responses(form: &FormData) -> FormErrors {
    let mut errors = FormErrors::new();
    let answered = form
        .behavioral_responses
        .first()
        .map(|r| !is_blank(&r.text_response))
        .unwrap_or(false);
    if !answered {
        errors.insert(FormField::TextResponse, "Please provide an answer".to_string());
    }
    errors
}
