//! The three submission phases. Each takes the record ticket obtained from
//! phase 1 and advances the same application.
//!
//! Phase 1: create or update contact details.
//! Phase 2: attach a resume, replacing (and deleting) any previous file.
//! Phase 3: store behavioral answers and move the record to `submitted`.

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::applications::storage::{ResumeStorage, StoredFile};
use crate::applications::store::ApplicationStore;
use crate::errors::AppError;
use crate::models::application::{
    ApplicationRecord, ApplicationSummary, BehavioralResponse, CandidateDetails, ResumeFile,
};

/// Phase 1. `application_id = None` creates a draft, otherwise the contact
/// fields of the existing record are overwritten.
pub async fn save_candidate_details(
    store: &dyn ApplicationStore,
    application_id: Option<Uuid>,
    details: CandidateDetails,
) -> Result<ApplicationRecord, AppError> {
    let now = Utc::now();

    match application_id {
        None => {
            let record = ApplicationRecord::new_draft(details, now);
            store.insert(&record).await?;
            info!("Created application {}", record.id);
            Ok(record)
        }
        Some(id) => {
            let mut record = store
                .get(id)
                .await?
                .ok_or_else(AppError::application_not_found)?;
            record.apply_details(details, now);
            store.save(&record).await?;
            info!("Updated candidate details on application {id}");
            Ok(record)
        }
    }
}

/// A resume that has already been written to storage and is waiting to be
/// attached to a record.
#[derive(Debug, Clone)]
pub struct UploadedResume {
    pub original_name: String,
    pub mime_type: String,
    pub stored: StoredFile,
}

/// Phase 2. The file is already in storage; if the record does not exist it
/// is removed again so nothing is orphaned.
pub async fn attach_resume(
    store: &dyn ApplicationStore,
    files: &dyn ResumeStorage,
    application_id: Option<Uuid>,
    upload: UploadedResume,
) -> Result<ApplicationRecord, AppError> {
    let lookup = match application_id {
        Some(id) => store.get(id).await,
        None => Ok(None),
    };

    let mut record = match lookup {
        Ok(Some(record)) => record,
        Ok(None) => {
            discard_upload(files, &upload.stored.storage_path, "no matching application").await;
            return Err(AppError::application_not_found());
        }
        Err(e) => {
            discard_upload(files, &upload.stored.storage_path, "record lookup failed").await;
            return Err(e);
        }
    };

    let now = Utc::now();
    let previous = record.replace_resume(
        ResumeFile {
            filename: upload.original_name,
            storage_path: upload.stored.storage_path,
            mime_type: upload.mime_type,
            uploaded_at: now,
        },
        now,
    );

    // The superseded file goes before the new reference is recorded. If the
    // save below fails, the stored record keeps pointing at the deleted file.
    if let Some(previous) = previous {
        // Failure is surfaced in the log but never blocks the new upload.
        if let Err(e) = files.delete(&previous.storage_path).await {
            error!(
                "Failed to delete superseded resume {} for application {}: {e}",
                previous.storage_path, record.id
            );
        }
    }

    if let Err(e) = store.save(&record).await {
        if let Some(resume) = &record.resume {
            discard_upload(files, &resume.storage_path, "record update failed").await;
        }
        return Err(e);
    }

    info!("Attached resume to application {}", record.id);
    Ok(record)
}

async fn discard_upload(files: &dyn ResumeStorage, storage_path: &str, reason: &str) {
    match files.delete(storage_path).await {
        Ok(()) => warn!("Discarded upload {storage_path}: {reason}"),
        Err(e) => error!("Failed to discard orphaned upload {storage_path}: {e}"),
    }
}

/// Phase 3. Responses replace the stored ones wholesale.
pub async fn submit_responses(
    store: &dyn ApplicationStore,
    application_id: Option<Uuid>,
    responses: Vec<BehavioralResponse>,
) -> Result<ApplicationRecord, AppError> {
    let id = application_id.ok_or_else(AppError::application_not_found)?;
    let mut record = store
        .get(id)
        .await?
        .ok_or_else(AppError::application_not_found)?;

    record.submit(responses, Utc::now());
    store.save(&record).await?;

    info!("Application {id} submitted");
    Ok(record)
}

pub async fn get_application(
    store: &dyn ApplicationStore,
    application_id: Option<Uuid>,
) -> Result<ApplicationRecord, AppError> {
    let id = application_id.ok_or_else(AppError::application_not_found)?;
    store
        .get(id)
        .await?
        .ok_or_else(AppError::application_not_found)
}

pub async fn list_applications(
    store: &dyn ApplicationStore,
) -> Result<Vec<ApplicationSummary>, AppError> {
    store.list_summaries().await
}
