//! The wizard controller.
//!
//! Owns the current `WizardState`, applies actions through the reducer, writes
//! the snapshot after every tracked change and runs the three step operations
//! against the service.

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::{
    ApplicationApi, CandidateDetailsPayload, ClientError, HttpApplicationClient, RemoteApplication,
};
use crate::config::WizardConfig;
use crate::snapshot::{clear_snapshot, load_snapshot, save_snapshot, FileSnapshotStore, SnapshotStore, WizardSnapshot};
use crate::state::{
    reduce, FieldUpdate, FormErrors, FormField, ResponseField, ResumeAttachment, WizardAction,
    WizardState, SUCCESS_STEP,
};
use crate::validation::{check_resume, validate_details, validate_responses};

pub const SAVE_DETAILS_FALLBACK: &str = "Failed to save data. Please try again.";
pub const UPLOAD_RESUME_FALLBACK: &str = "Failed to upload resume. Please try again.";
pub const SAVE_RESPONSES_FALLBACK: &str = "Failed to save responses. Please try again.";

fn single_error(field: FormField, message: impl Into<String>) -> FormErrors {
    FormErrors::from([(field, message.into())])
}

pub struct WizardController<A, S> {
    api: A,
    snapshots: S,
    state: WizardState,
}

impl WizardController<HttpApplicationClient, FileSnapshotStore> {
    /// A controller talking HTTP and keeping its snapshot on disk.
    pub fn from_config(config: &WizardConfig) -> Result<Self> {
        let api = HttpApplicationClient::new(config.api_base_url.clone())?;
        let snapshots = FileSnapshotStore::new(&config.snapshot_dir)?;
        Ok(Self::new(api, snapshots))
    }
}

impl<A: ApplicationApi, S: SnapshotStore> WizardController<A, S> {
    /// Starts from the stored snapshot when one is readable, otherwise from
    /// the initial state.
    pub fn new(api: A, snapshots: S) -> Self {
        let state = load_snapshot(&snapshots)
            .map(WizardSnapshot::into_state)
            .unwrap_or_default();
        Self {
            api,
            snapshots,
            state,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn dispatch(&mut self, action: WizardAction) {
        let reset = matches!(action, WizardAction::Reset);
        let next = reduce(self.state.clone(), action);
        let changed = next.tracked() != self.state.tracked();
        self.state = next;

        if reset {
            if let Err(e) = clear_snapshot(&self.snapshots) {
                warn!("Failed to clear saved application: {e}");
            }
        } else if changed {
            self.persist();
        }
    }

    fn persist(&self) {
        if self.state.application_id.is_none() {
            return;
        }
        if let Err(e) = save_snapshot(&self.snapshots, &WizardSnapshot::capture(&self.state)) {
            warn!("Failed to save application snapshot: {e}");
        }
    }

    pub fn update_field(&mut self, update: FieldUpdate) {
        self.dispatch(WizardAction::UpdateField(update));
    }

    pub fn update_behavioral_response(
        &mut self,
        index: usize,
        field: ResponseField,
        value: impl Into<String>,
    ) {
        self.dispatch(WizardAction::UpdateBehavioralResponse {
            index,
            field,
            value: value.into(),
        });
    }

    pub fn next_step(&mut self) {
        self.dispatch(WizardAction::NextStep);
    }

    pub fn prev_step(&mut self) {
        self.dispatch(WizardAction::PrevStep);
    }

    pub fn go_to_step(&mut self, step: u8) {
        self.dispatch(WizardAction::GoToStep(step));
    }

    pub fn reset_form(&mut self) {
        self.dispatch(WizardAction::Reset);
    }

    fn set_busy(&mut self, busy: bool) {
        self.dispatch(WizardAction::SetSubmitting(busy));
        self.dispatch(WizardAction::SetLoading(busy));
    }

    fn report_failure(&mut self, err: ClientError, fallback: &str) {
        warn!("Application request failed: {err}");
        let message = err.user_message().unwrap_or_else(|| fallback.to_string());
        self.dispatch(WizardAction::SetFormErrors(single_error(FormField::Submit, message)));
    }

    /// Step 1. Returns true when the details were saved and the wizard moved on.
    pub async fn submit_details(&mut self) -> bool {
        let errors = validate_details(&self.state.form_data);
        let valid = errors.is_empty();
        self.dispatch(WizardAction::SetFormErrors(errors));
        if !valid {
            return false;
        }

        let payload = CandidateDetailsPayload {
            name: self.state.form_data.name.clone(),
            email: self.state.form_data.email.clone(),
            phone: self.state.form_data.phone.clone(),
            application_id: self.state.application_id,
        };

        self.set_busy(true);
        let result = self.api.save_candidate_details(&payload).await;
        self.set_busy(false);

        match result {
            Ok(record) => {
                if self.state.application_id.is_none() {
                    info!("Started application {}", record.id);
                }
                self.dispatch(WizardAction::SetApplicationId(Some(record.id)));
                self.dispatch(WizardAction::NextStep);
                true
            }
            Err(e) => {
                self.report_failure(e, SAVE_DETAILS_FALLBACK);
                false
            }
        }
    }

    /// Accepts a picked file into the form if it passes the type and size
    /// checks.
    pub fn select_resume(&mut self, file: ResumeAttachment) -> bool {
        if let Err(message) = check_resume(&file) {
            self.dispatch(WizardAction::SetFormErrors(single_error(FormField::Resume, message)));
            return false;
        }
        let file_name = file.file_name.clone();
        self.update_field(FieldUpdate::Resume(Some(file)));
        self.update_field(FieldUpdate::ResumeFileName(file_name));
        self.dispatch(WizardAction::SetFormErrors(FormErrors::new()));
        true
    }

    pub fn clear_resume(&mut self) {
        self.update_field(FieldUpdate::Resume(None));
        self.update_field(FieldUpdate::ResumeFileName(String::new()));
    }

    /// Step 2. The file must have been picked in this session; a restored
    /// snapshot only remembers its name.
    pub async fn upload_resume(&mut self) -> bool {
        let Some(resume) = self.state.form_data.resume.clone() else {
            self.dispatch(WizardAction::SetFormErrors(single_error(
                FormField::Resume,
                "Please upload your resume",
            )));
            return false;
        };
        let Some(application_id) = self.state.application_id else {
            self.dispatch(WizardAction::SetFormErrors(single_error(
                FormField::Submit,
                "Please complete the previous step first",
            )));
            return false;
        };

        self.set_busy(true);
        let result = self.api.upload_resume(application_id, &resume).await;
        self.set_busy(false);

        match result {
            Ok(_) => {
                self.dispatch(WizardAction::SetFormErrors(FormErrors::new()));
                self.dispatch(WizardAction::NextStep);
                true
            }
            Err(e) => {
                self.report_failure(e, UPLOAD_RESUME_FALLBACK);
                false
            }
        }
    }

    /// Step 3. Submits every response and lands on the success step.
    pub async fn submit_responses(&mut self) -> bool {
        let errors = validate_responses(&self.state.form_data);
        let valid = errors.is_empty();
        self.dispatch(WizardAction::SetFormErrors(errors));
        if !valid {
            return false;
        }
        let Some(application_id) = self.state.application_id else {
            self.dispatch(WizardAction::SetFormErrors(single_error(
                FormField::Submit,
                "Please complete the previous steps first",
            )));
            return false;
        };

        let responses = self.state.form_data.behavioral_responses.clone();
        self.set_busy(true);
        let result = self
            .api
            .save_behavioral_responses(application_id, &responses)
            .await;
        self.set_busy(false);

        match result {
            Ok(_) => {
                info!("Submitted application {application_id}");
                self.dispatch(WizardAction::SetSubmitted(true));
                self.dispatch(WizardAction::GoToStep(SUCCESS_STEP));
                true
            }
            Err(e) => {
                self.report_failure(e, SAVE_RESPONSES_FALLBACK);
                false
            }
        }
    }

    /// The server's view of the current application, if one has been started.
    pub async fn fetch_application(&self) -> Result<Option<RemoteApplication>, ClientError> {
        match self.state.application_id {
            Some(id) => self.api.get_application(id).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn application_id(&self) -> Option<Uuid> {
        self.state.application_id
    }
}
