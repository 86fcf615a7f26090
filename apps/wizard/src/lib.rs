//! Client side of the job application wizard.
//!
//! `WizardController` walks a candidate through details, resume upload and
//! behavioral questions, keeping a snapshot so an interrupted session resumes
//! where it stopped.

pub mod client;
pub mod config;
pub mod controller;
pub mod snapshot;
pub mod state;
pub mod validation;

pub use client::{ApplicationApi, ClientError, HttpApplicationClient};
pub use config::WizardConfig;
pub use controller::WizardController;
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore, WizardSnapshot};
pub use state::{reduce, FieldUpdate, FormField, ResponseField, ResumeAttachment, WizardAction, WizardState};
