use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use sqlx::FromRow;
use uuid::Uuid;

/// Question every new application starts with.
pub const DEFAULT_QUESTION: &str = "Why are you interested in joining this organisation?";

/// Placeholder answer stored at creation. Stored entries must never carry an
/// empty `textResponse`, so the seed is a single space.
const PLACEHOLDER_RESPONSE: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Draft,
    Submitted,
    UnderReview,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApplicationStatus::Draft),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "under_review" => Ok(ApplicationStatus::UnderReview),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "accepted" => Ok(ApplicationStatus::Accepted),
            other => Err(anyhow::anyhow!("unknown application status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralResponse {
    pub question: String,
    pub text_response: String,
}

impl BehavioralResponse {
    /// True when both the question and the trimmed answer carry text.
    pub fn is_answered(&self) -> bool {
        !self.question.is_empty() && !self.text_response.trim().is_empty()
    }
}

/// Metadata for the resume file attached in phase 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeFile {
    pub filename: String,
    pub storage_path: String,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// The persisted application. One record per candidate submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume: Option<ResumeFile>,
    pub behavioral_responses: Vec<BehavioralResponse>,
    pub status: ApplicationStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ApplicationRecord {
    /// Builds a fresh draft with the seeded placeholder response.
    pub fn new_draft(details: CandidateDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: details.name,
            email: details.email,
            phone: details.phone,
            resume: None,
            behavioral_responses: seeded_responses(),
            status: ApplicationStatus::Draft,
            submitted_at: None,
            last_updated: now,
            created_at: now,
        }
    }

    /// Overwrites the contact fields only.
    pub fn apply_details(&mut self, details: CandidateDetails, now: DateTime<Utc>) {
        self.name = details.name;
        self.email = details.email;
        self.phone = details.phone;
        self.last_updated = now;
    }

    /// Swaps in a new resume and hands back the one it replaced.
    pub fn replace_resume(&mut self, resume: ResumeFile, now: DateTime<Utc>) -> Option<ResumeFile> {
        self.last_updated = now;
        self.resume.replace(resume)
    }

    /// `draft -> submitted`. `submitted_at` is only stamped the first time;
    /// responses and status are overwritten on every call.
    pub fn submit(&mut self, responses: Vec<BehavioralResponse>, now: DateTime<Utc>) {
        self.behavioral_responses = responses;
        self.status = ApplicationStatus::Submitted;
        if self.submitted_at.is_none() {
            self.submitted_at = Some(now);
        }
        self.last_updated = now;
    }

    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            status: self.status,
            submitted_at: self.submitted_at,
        }
    }
}

/// Normalized phase-1 input.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Projection returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: ApplicationStatus,
    pub submitted_at: Option<DateTime<Utc>>,
}

pub fn seeded_responses() -> Vec<BehavioralResponse> {
    vec![BehavioralResponse {
        question: DEFAULT_QUESTION.to_string(),
        text_response: PLACEHOLDER_RESPONSE.to_string(),
    }]
}

/// Sorts most-recently-submitted first; never-submitted records go last.
pub fn sort_by_submission(summaries: &mut [ApplicationSummary]) {
    summaries.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
}

/// Row shape of the `applications` table.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume_filename: Option<String>,
    pub resume_storage_path: Option<String>,
    pub resume_mime_type: Option<String>,
    pub resume_uploaded_at: Option<DateTime<Utc>>,
    pub behavioral_responses: SqlJson<Vec<BehavioralResponse>>,
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for ApplicationRecord {
    type Error = anyhow::Error;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let resume = match (
            row.resume_filename,
            row.resume_storage_path,
            row.resume_mime_type,
            row.resume_uploaded_at,
        ) {
            (Some(filename), Some(storage_path), Some(mime_type), Some(uploaded_at)) => {
                Some(ResumeFile {
                    filename,
                    storage_path,
                    mime_type,
                    uploaded_at,
                })
            }
            _ => None,
        };

        Ok(ApplicationRecord {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            resume,
            behavioral_responses: row.behavioral_responses.0,
            status: row.status.parse()?,
            submitted_at: row.submitted_at,
            last_updated: row.last_updated,
            created_at: row.created_at,
        })
    }
}

/// Row shape of the list projection.
#[derive(Debug, Clone, FromRow)]
pub struct SummaryRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl TryFrom<SummaryRow> for ApplicationSummary {
    type Error = anyhow::Error;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(ApplicationSummary {
            id: row.id,
            name: row.name,
            email: row.email,
            status: row.status.parse()?,
            submitted_at: row.submitted_at,
        })
    }
}
