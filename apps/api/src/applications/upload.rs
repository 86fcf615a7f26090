use axum::extract::Multipart;
use bytes::Bytes;

use crate::applications::phases::UploadedResume;
use crate::applications::storage::ResumeStorage;
use crate::applications::validation::check_resume_file;
use crate::errors::AppError;

pub const RESUME_FIELD: &str = "resume";
pub const APPLICATION_ID_FIELD: &str = "applicationId";

/// Parsed phase-2 form. Fields may arrive in any order.
#[derive(Debug, Default)]
pub struct ResumeForm {
    pub application_id: Option<String>,
    pub file: Option<ResumeFilePart>,
}

#[derive(Debug)]
pub struct ResumeFilePart {
    pub original_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Reads the multipart body, validating the file against the extension
/// allow-list and size cap as soon as it has been read.
pub async fn read_resume_form(mut multipart: Multipart) -> Result<ResumeForm, AppError> {
    let mut form = ResumeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        match field.name().unwrap_or("") {
            RESUME_FIELD => {
                let original_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                // Check the name before buffering the body.
                check_resume_file(&original_name, 0)?;
                let data = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read uploaded file: {e}"))
                })?;
                check_resume_file(&original_name, data.len())?;
                form.file = Some(ResumeFilePart {
                    original_name,
                    content_type,
                    data,
                });
            }
            APPLICATION_ID_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
                form.application_id = Some(text);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Writes the validated file to storage.
pub async fn store_resume(
    files: &dyn ResumeStorage,
    part: ResumeFilePart,
) -> Result<UploadedResume, AppError> {
    let stored = files
        .put(&part.original_name, &part.content_type, part.data)
        .await?;
    Ok(UploadedResume {
        original_name: part.original_name,
        mime_type: part.content_type,
        stored,
    })
}
