// Form state and the pure reducer that drives it
//
// Every mutation goes through `reduce`; the store commits each result as one
// atomic replace so observers never see a half-applied event.

use std::sync::Arc;
use tokio::sync::watch;

use crate::draft::{BookingDraft, DraftChange, ProbeKey};
use crate::error::{ErrorCode, ValidationError};
use crate::models::{AvailabilityResponse, Booking, BookingId};
use crate::validator::{DraftValidator, FieldErrors};

// Resolved availability verdict from the authority.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityVerdict {
    pub available: bool,
    pub validations_passed: bool,
    pub errors: Vec<ValidationError>,
    pub conflicts: Vec<Booking>,
}

impl AvailabilityVerdict {
    pub fn is_bookable(&self) -> bool {
        self.available && self.validations_passed
    }

    // Errors that explain a non-bookable verdict; never empty when not bookable
    pub fn blocking_errors(&self) -> Vec<ValidationError> {
        if self.is_bookable() {
            return vec![];
        }
        if !self.errors.is_empty() {
            return self.errors.clone();
        }
        if !self.available {
            vec![ValidationError::new(
                ErrorCode::TimeConflict,
                "The room is not available for the selected time",
            )]
        } else {
            vec![ValidationError::new(
                ErrorCode::Other("VALIDATION_FAILED".to_string()),
                "The booking does not satisfy the room's booking rules",
            )]
        }
    }
}

impl From<AvailabilityResponse> for AvailabilityVerdict {
    fn from(response: AvailabilityResponse) -> Self {
        Self {
            available: response.available,
            validations_passed: response.validations_passed,
            errors: response.errors,
            conflicts: response.conflicts,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AvailabilityResult {
    #[default]
    NotChecked,
    Checking,
    Resolved(AvailabilityVerdict),
}

// Issue order of availability requests. Only the outstanding request may resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeTracker {
    last_issued: u64,
    pending: Option<u64>,
}

impl ProbeTracker {
    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }

    pub fn pending(&self) -> Option<u64> {
        self.pending
    }

    fn issue(&mut self) -> u64 {
        self.last_issued += 1;
        self.pending = Some(self.last_issued);
        self.last_issued
    }

    // True for the most recently issued request that hasn't been superseded
    pub fn accepts(&self, seq: u64) -> bool {
        self.pending == Some(seq) && seq == self.last_issued
    }

    fn invalidate(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded(BookingId),
    Failed(Vec<ValidationError>),
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub draft: BookingDraft,
    pub field_errors: FieldErrors,
    pub availability: AvailabilityResult,
    pub probe: ProbeTracker,
    pub submission: SubmissionState,
}

impl FormState {
    // Whether the submit control should be enabled
    pub fn can_submit(&self) -> bool {
        if self.submission.is_submitting() {
            return false;
        }
        match &self.availability {
            AvailabilityResult::Resolved(verdict) => verdict.is_bookable(),
            AvailabilityResult::NotChecked | AvailabilityResult::Checking => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    FieldChanged(DraftChange),
    ProbeIssued(ProbeKey),
    // None means the request failed and the slot is unknown again
    ProbeResolved {
        seq: u64,
        verdict: Option<AvailabilityVerdict>,
    },
    SubmitStarted,
    SubmitRefused(Vec<ValidationError>),
    SubmitResolved(Result<BookingId, Vec<ValidationError>>),
}

pub fn reduce(mut state: FormState, event: FormEvent, validator: &DraftValidator) -> FormState {
    match event {
        FormEvent::FieldChanged(change) => {
            let field = change.field();
            let mut draft = state.draft.clone();
            draft.apply(change);
            if draft == state.draft {
                return state;
            }
            state.field_errors = validator.validate(&draft).err().unwrap_or_default();
            state.draft = draft;
            if field.is_probe_trigger() {
                state.availability = AvailabilityResult::NotChecked;
                state.probe.invalidate();
            }
            if matches!(state.submission, SubmissionState::Succeeded(_)) {
                state.submission = SubmissionState::Idle;
            }
        }
        FormEvent::ProbeIssued(key) => {
            // The timer fired for values the user has since changed
            if state.draft.probe_key().as_ref() != Some(&key) {
                return state;
            }
            state.probe.issue();
            state.availability = AvailabilityResult::Checking;
        }
        FormEvent::ProbeResolved { seq, verdict } => {
            if !state.probe.accepts(seq) {
                return state;
            }
            state.probe.invalidate();
            state.availability = match verdict {
                Some(verdict) => AvailabilityResult::Resolved(verdict),
                None => AvailabilityResult::NotChecked,
            };
        }
        FormEvent::SubmitStarted => {
            if !state.submission.is_submitting() {
                state.submission = SubmissionState::Submitting;
            }
        }
        FormEvent::SubmitRefused(errors) => {
            if !state.submission.is_submitting() {
                state.submission = SubmissionState::Failed(errors);
            }
        }
        FormEvent::SubmitResolved(result) => {
            if !state.submission.is_submitting() {
                return state;
            }
            match result {
                Ok(booking_id) => {
                    state.draft = BookingDraft::default();
                    state.field_errors = FieldErrors::default();
                    state.availability = AvailabilityResult::NotChecked;
                    state.probe.invalidate();
                    state.submission = SubmissionState::Succeeded(booking_id);
                }
                Err(errors) => state.submission = SubmissionState::Failed(errors),
            }
        }
    }
    state
}

struct StoreInner {
    sender: watch::Sender<FormState>,
    validator: DraftValidator,
}

// Shared owner of the form state. Cheap to clone.
#[derive(Clone)]
pub struct FormStore {
    inner: Arc<StoreInner>,
}

impl FormStore {
    pub fn new(validator: DraftValidator) -> Self {
        let (sender, _) = watch::channel(FormState::default());
        Self {
            inner: Arc::new(StoreInner { sender, validator }),
        }
    }

    pub fn validator(&self) -> &DraftValidator {
        &self.inner.validator
    }

    pub fn snapshot(&self) -> FormState {
        self.inner.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.inner.sender.subscribe()
    }

    // Applies `event` atomically. Returns the committed state, or None when the
    // event left the state unchanged (stale probe, ignored submit, no-op edit).
    pub fn dispatch(&self, event: FormEvent) -> Option<FormState> {
        let validator = &self.inner.validator;
        let mut committed = None;
        self.inner.sender.send_if_modified(|state| {
            let next = reduce(state.clone(), event, validator);
            if next == *state {
                return false;
            }
            *state = next.clone();
            committed = Some(next);
            true
        });
        committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DraftField;

    fn verdict(available: bool, validations_passed: bool) -> AvailabilityVerdict {
        AvailabilityVerdict {
            available,
            validations_passed,
            errors: vec![],
            conflicts: vec![],
        }
    }

    fn armed_state(validator: &DraftValidator) -> FormState {
        [
            DraftChange::Unit(Some(1)),
            DraftChange::MeetingRoom(Some(12)),
            DraftChange::MeetingDate("2025-03-10".to_string()),
            DraftChange::StartTime("09:00".to_string()),
            DraftChange::EndTime("10:00".to_string()),
            DraftChange::Participants(Some(4)),
        ]
        .into_iter()
        .fold(FormState::default(), |state, change| {
            reduce(state, FormEvent::FieldChanged(change), validator)
        })
    }

    fn issue(state: FormState, validator: &DraftValidator) -> (FormState, u64) {
        let key = state.draft.probe_key().unwrap();
        let state = reduce(state, FormEvent::ProbeIssued(key), validator);
        let seq = state.probe.pending().unwrap();
        (state, seq)
    }

    #[test]
    fn test_out_of_order_resolution_keeps_latest() {
        let validator = DraftValidator::new();
        let state = armed_state(&validator);
        let (state, first) = issue(state, &validator);
        let (state, second) = issue(state, &validator);
        assert!(second > first);
        assert_eq!(state.probe.last_issued(), second);

        let state = reduce(
            state,
            FormEvent::ProbeResolved {
                seq: second,
                verdict: Some(verdict(true, true)),
            },
            &validator,
        );
        let state = reduce(
            state,
            FormEvent::ProbeResolved {
                seq: first,
                verdict: Some(verdict(false, true)),
            },
            &validator,
        );

        assert_eq!(
            state.availability,
            AvailabilityResult::Resolved(verdict(true, true))
        );
    }

    #[test]
    fn test_trigger_change_discards_in_flight_result() {
        let validator = DraftValidator::new();
        let (state, seq) = issue(armed_state(&validator), &validator);
        assert_eq!(state.availability, AvailabilityResult::Checking);

        let state = reduce(
            state,
            FormEvent::FieldChanged(DraftChange::EndTime("11:00".to_string())),
            &validator,
        );
        assert_eq!(state.availability, AvailabilityResult::NotChecked);

        let state = reduce(
            state,
            FormEvent::ProbeResolved {
                seq,
                verdict: Some(verdict(true, true)),
            },
            &validator,
        );
        assert_eq!(state.availability, AvailabilityResult::NotChecked);
    }

    #[test]
    fn test_non_trigger_change_keeps_result() {
        let validator = DraftValidator::new();
        let (state, seq) = issue(armed_state(&validator), &validator);
        let state = reduce(
            state,
            FormEvent::ProbeResolved {
                seq,
                verdict: Some(verdict(true, true)),
            },
            &validator,
        );
        let state = reduce(
            state,
            FormEvent::FieldChanged(DraftChange::Notes("Board meeting".to_string())),
            &validator,
        );
        assert!(matches!(state.availability, AvailabilityResult::Resolved(_)));
    }

    #[test]
    fn test_failed_probe_reverts_to_not_checked() {
        let validator = DraftValidator::new();
        let (state, seq) = issue(armed_state(&validator), &validator);
        let state = reduce(
            state,
            FormEvent::ProbeResolved { seq, verdict: None },
            &validator,
        );
        assert_eq!(state.availability, AvailabilityResult::NotChecked);
        assert!(state.can_submit());
    }

    #[test]
    fn test_probe_issue_for_superseded_values_is_ignored() {
        let validator = DraftValidator::new();
        let state = armed_state(&validator);
        let old_key = state.draft.probe_key().unwrap();
        let state = reduce(
            state,
            FormEvent::FieldChanged(DraftChange::Participants(Some(8))),
            &validator,
        );
        let next = reduce(state.clone(), FormEvent::ProbeIssued(old_key), &validator);
        assert_eq!(next, state);
    }

    #[test]
    fn test_field_errors_follow_every_edit() {
        let validator = DraftValidator::new();
        let state = reduce(
            FormState::default(),
            FormEvent::FieldChanged(DraftChange::StartTime("09:00".to_string())),
            &validator,
        );
        assert!(state.field_errors.for_field(DraftField::Unit).count() > 0);

        let state = armed_state(&validator);
        assert!(state.field_errors.is_empty());
    }

    #[test]
    fn test_submission_transitions_are_guarded() {
        let validator = DraftValidator::new();
        let state = reduce(armed_state(&validator), FormEvent::SubmitStarted, &validator);
        assert!(state.submission.is_submitting());
        assert!(!state.can_submit());

        // A second start and a late refusal change nothing while submitting
        let same = reduce(state.clone(), FormEvent::SubmitStarted, &validator);
        assert_eq!(same, state);
        let same = reduce(state.clone(), FormEvent::SubmitRefused(vec![]), &validator);
        assert_eq!(same, state);

        let done = reduce(state, FormEvent::SubmitResolved(Ok(77)), &validator);
        assert_eq!(done.submission, SubmissionState::Succeeded(77));
        assert_eq!(done.draft, BookingDraft::default());

        // Resolution without a submission in flight is ignored
        let again = reduce(done.clone(), FormEvent::SubmitResolved(Ok(78)), &validator);
        assert_eq!(again, done);

        let edited = reduce(
            done,
            FormEvent::FieldChanged(DraftChange::Unit(Some(2))),
            &validator,
        );
        assert_eq!(edited.submission, SubmissionState::Idle);
    }

    #[test]
    fn test_blocking_errors_synthesized_when_authority_sends_none() {
        assert!(verdict(true, true).blocking_errors().is_empty());
        assert_eq!(
            verdict(false, true).blocking_errors()[0].code,
            ErrorCode::TimeConflict
        );
        assert_eq!(
            verdict(true, false).blocking_errors()[0].code,
            ErrorCode::Other("VALIDATION_FAILED".to_string())
        );
    }

    #[tokio::test]
    async fn test_store_notifies_observers_once_per_commit() {
        let store = FormStore::new(DraftValidator::new());
        let mut observer = store.subscribe();

        assert!(store
            .dispatch(FormEvent::FieldChanged(DraftChange::Unit(Some(1))))
            .is_some());
        assert!(observer.has_changed().unwrap());
        assert_eq!(observer.borrow_and_update().draft.unit_id, Some(1));

        // Same value again is a no-op and doesn't wake observers
        assert!(store
            .dispatch(FormEvent::FieldChanged(DraftChange::Unit(Some(1))))
            .is_none());
        assert!(!observer.has_changed().unwrap());
    }
}
