// Meeting room booking client: draft validation, debounced availability
// probing, and gated submission against the booking authority

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod form;
pub mod listing;
pub mod master_data;
pub mod models;
pub mod presenter;
pub mod probe;
pub mod state;
pub mod submission;
pub mod validator;

// Re-export key types for convenience
pub use api::{BookingApi, HttpBookingApi};
pub use config::{ClientConfig, ClientError, RetryConfig};
pub use draft::{BookingDraft, DraftChange, DraftField, ProbeKey};
pub use error::{ApiError, BookingFailure, ErrorCode, ValidationError};
pub use form::BookingForm;
pub use master_data::{MasterData, MasterDataLoader};
pub use presenter::{ErrorPresenter, PresentedError, Severity};
pub use state::{AvailabilityResult, AvailabilityVerdict, FormState, SubmissionState};
pub use submission::SubmitOutcome;
pub use validator::{DraftValidator, FieldErrors, StructuralError};
