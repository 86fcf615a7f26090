//! Wizard state and the reducer that drives it.
//!
//! The state is a plain value; every change goes through `reduce`, which
//! never performs I/O. Snapshot persistence happens in the controller.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub const FIRST_STEP: u8 = 1;
pub const SUCCESS_STEP: u8 = 4;

pub const DEFAULT_QUESTION: &str = "Why are you interested in joining this organisation?";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralAnswer {
    pub question: String,
    pub text_response: String,
}

/// A resume picked from the local filesystem, waiting to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeAttachment {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

impl ResumeAttachment {
    /// Builds an attachment from a path on disk, inferring the mime type from
    /// the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resume")
            .to_string();
        let mime_type = mime_for_extension(&file_name).to_string();
        Ok(Self {
            path,
            file_name,
            mime_type,
            size,
        })
    }
}

fn mime_for_extension(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Everything the candidate has typed or picked so far.
///
/// The attachment itself is never written to a snapshot; only its file name
/// survives a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(skip)]
    pub resume: Option<ResumeAttachment>,
    #[serde(default)]
    pub resume_file_name: String,
    #[serde(default = "initial_responses")]
    pub behavioral_responses: Vec<BehavioralAnswer>,
}

impl Default for FormData {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            resume: None,
            resume_file_name: String::new(),
            behavioral_responses: initial_responses(),
        }
    }
}

pub fn initial_responses() -> Vec<BehavioralAnswer> {
    vec![BehavioralAnswer {
        question: DEFAULT_QUESTION.to_string(),
        text_response: String::new(),
    }]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Name,
    Email,
    Phone,
    Resume,
    ResumeFileName,
    TextResponse,
    /// Request-level failures reported by the service.
    Submit,
}

pub type FormErrors = BTreeMap<FormField, String>;

/// One typed form edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Name(String),
    Email(String),
    Phone(String),
    Resume(Option<ResumeAttachment>),
    ResumeFileName(String),
}

impl FieldUpdate {
    pub fn field(&self) -> FormField {
        match self {
            FieldUpdate::Name(_) => FormField::Name,
            FieldUpdate::Email(_) => FormField::Email,
            FieldUpdate::Phone(_) => FormField::Phone,
            FieldUpdate::Resume(_) => FormField::Resume,
            FieldUpdate::ResumeFileName(_) => FormField::ResumeFileName,
        }
    }

    fn apply(self, form: &mut FormData) {
        match self {
            FieldUpdate::Name(v) => form.name = v,
            FieldUpdate::Email(v) => form.email = v,
            FieldUpdate::Phone(v) => form.phone = v,
            FieldUpdate::Resume(v) => form.resume = v,
            FieldUpdate::ResumeFileName(v) => form.resume_file_name = v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseField {
    Question,
    TextResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub step: u8,
    pub application_id: Option<Uuid>,
    pub form_data: FormData,
    pub form_errors: FormErrors,
    pub loading: bool,
    pub submitting: bool,
    pub submitted: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: FIRST_STEP,
            application_id: None,
            form_data: FormData::default(),
            form_errors: FormErrors::new(),
            loading: false,
            submitting: false,
            submitted: false,
        }
    }
}

impl WizardState {
    /// The part of the state that a snapshot captures. Used to decide whether
    /// an action needs a write.
    pub fn tracked(&self) -> (Option<Uuid>, &FormData, u8, bool) {
        (self.application_id, &self.form_data, self.step, self.submitted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    UpdateField(FieldUpdate),
    UpdateBehavioralResponse {
        index: usize,
        field: ResponseField,
        value: String,
    },
    NextStep,
    PrevStep,
    GoToStep(u8),
    Reset,
    SetApplicationId(Option<Uuid>),
    SetFormErrors(FormErrors),
    SetLoading(bool),
    SetSubmitting(bool),
    SetSubmitted(bool),
}

pub fn reduce(mut state: WizardState, action: WizardAction) -> WizardState {
    match action {
        WizardAction::UpdateField(update) => {
            let field = update.field();
            debug!("Updating form field {field:?}");
            update.apply(&mut state.form_data);
            state.form_errors.remove(&field);
        }
        WizardAction::UpdateBehavioralResponse {
            index,
            field,
            value,
        } => {
            debug!("Updating behavioral response {index}.{field:?}");
            let mut responses = state.form_data.behavioral_responses.clone();
            if let Some(entry) = responses.get_mut(index) {
                match field {
                    ResponseField::Question => entry.question = value,
                    ResponseField::TextResponse => entry.text_response = value,
                }
                state.form_data.behavioral_responses = responses;
            }
        }
        WizardAction::NextStep => {
            let next = state.step.saturating_add(1).min(SUCCESS_STEP);
            debug!("Moving from step {} to {next}", state.step);
            state.step = next;
        }
        WizardAction::PrevStep => {
            let prev = state.step.saturating_sub(1).max(FIRST_STEP);
            debug!("Moving from step {} to {prev}", state.step);
            state.step = prev;
        }
        WizardAction::GoToStep(step) => {
            debug!("Directly going to step {step}");
            state.step = step;
        }
        WizardAction::Reset => {
            debug!("Resetting form");
            state = WizardState::default();
        }
        WizardAction::SetApplicationId(id) => state.application_id = id,
        WizardAction::SetFormErrors(errors) => state.form_errors = errors,
        WizardAction::SetLoading(loading) => state.loading = loading,
        WizardAction::SetSubmitting(submitting) => state.submitting = submitting,
        WizardAction::SetSubmitted(submitted) => state.submitted = submitted,
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_errors(fields: &[FormField]) -> WizardState {
        let errors = fields
            .iter()
            .map(|f| (*f, "bad".to_string()))
            .collect::<FormErrors>();
        reduce(WizardState::default(), WizardAction::SetFormErrors(errors))
    }

    #[test]
    fn test_default_state() {
        let state = WizardState::default();
        assert_eq!(state.step, 1);
        assert!(state.application_id.is_none());
        assert_eq!(state.form_data.behavioral_responses.len(), 1);
        assert_eq!(state.form_data.behavioral_responses[0].question, DEFAULT_QUESTION);
        assert!(state.form_data.behavioral_responses[0].text_response.is_empty());
    }

    #[test]
    fn test_update_field_clears_only_its_error() {
        let state = with_errors(&[FormField::Name, FormField::Email]);
        let state = reduce(
            state,
            WizardAction::UpdateField(FieldUpdate::Name("Ada".to_string())),
        );
        assert_eq!(state.form_data.name, "Ada");
        assert!(!state.form_errors.contains_key(&FormField::Name));
        assert!(state.form_errors.contains_key(&FormField::Email));
    }

    #[test]
    fn test_update_behavioral_response_preserves_others() {
        let mut state = WizardState::default();
        state.form_data.behavioral_responses.push(BehavioralAnswer {
            question: "Second".to_string(),
            text_response: "kept".to_string(),
        });
        let before = state.form_data.behavioral_responses.clone();

        let state = reduce(
            state,
            WizardAction::UpdateBehavioralResponse {
                index: 0,
                field: ResponseField::TextResponse,
                value: "Because".to_string(),
            },
        );
        let after = &state.form_data.behavioral_responses;
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].question, before[0].question);
        assert_eq!(after[0].text_response, "Because");
        assert_eq!(after[1], before[1]);
    }

    #[test]
    fn test_update_behavioral_response_out_of_range() {
        let state = WizardState::default();
        let before = state.clone();
        let state = reduce(
            state,
            WizardAction::UpdateBehavioralResponse {
                index: 7,
                field: ResponseField::Question,
                value: "?".to_string(),
            },
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_step_navigation_clamps() {
        let mut state = WizardState::default();
        state = reduce(state, WizardAction::PrevStep);
        assert_eq!(state.step, 1);
        for _ in 0..10 {
            state = reduce(state, WizardAction::NextStep);
        }
        assert_eq!(state.step, 4);
        state = reduce(state, WizardAction::PrevStep);
        assert_eq!(state.step, 3);
    }

    #[test]
    fn test_go_to_step_is_unconditional() {
        let state = reduce(WizardState::default(), WizardAction::GoToStep(3));
        assert_eq!(state.step, 3);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut state = WizardState::default();
        for action in [
            WizardAction::UpdateField(FieldUpdate::Email("a@b.io".to_string())),
            WizardAction::SetApplicationId(Some(Uuid::new_v4())),
            WizardAction::NextStep,
            WizardAction::SetSubmitted(true),
            WizardAction::SetFormErrors(FormErrors::from([(FormField::Submit, "x".to_string())])),
            WizardAction::Reset,
        ] {
            state = reduce(state, action);
        }
        assert_eq!(state, WizardState::default());
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_for_extension("cv.PDF"), "application/pdf");
        assert_eq!(mime_for_extension("notes.txt"), "text/plain");
        assert_eq!(mime_for_extension("archive"), "application/octet-stream");
    }

    #[test]
    fn test_attachment_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.docx");
        std::fs::write(&path, b"PK").unwrap();
        let attachment = ResumeAttachment::from_path(&path).unwrap();
        assert_eq!(attachment.file_name, "cv.docx");
        assert_eq!(attachment.size, 2);
        assert!(attachment.mime_type.contains("wordprocessingml"));
    }
}
