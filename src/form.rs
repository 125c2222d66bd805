// Booking form: the entry point a UI layer drives

use std::sync::Arc;
use tokio::sync::watch;

use crate::api::BookingApi;
use crate::config::ClientConfig;
use crate::draft::DraftChange;
use crate::presenter::{ErrorPresenter, PresentedError};
use crate::probe::AvailabilityProbe;
use crate::state::{AvailabilityResult, FormEvent, FormState, FormStore, SubmissionState};
use crate::submission::{SubmissionController, SubmitOutcome};
use crate::validator::DraftValidator;

pub struct BookingForm {
    store: FormStore,
    probe: AvailabilityProbe,
    submission: SubmissionController,
}

impl BookingForm {
    pub fn new(api: Arc<dyn BookingApi>, config: &ClientConfig, validator: DraftValidator) -> Self {
        let store = FormStore::new(validator);
        Self {
            probe: AvailabilityProbe::new(Arc::clone(&api), store.clone(), config.quiet_period()),
            submission: SubmissionController::new(api, store.clone()),
            store,
        }
    }

    // Applies one edit, revalidates, and restarts the availability probe when
    // a trigger field actually changed. Must be called within a Tokio runtime.
    pub fn update(&self, change: DraftChange) {
        let trigger = change.field().is_probe_trigger();
        let Some(state) = self.store.dispatch(FormEvent::FieldChanged(change)) else {
            return;
        };
        if trigger {
            self.probe.reschedule(state.draft.probe_key());
        }
    }

    pub fn state(&self) -> FormState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.store.subscribe()
    }

    pub fn can_submit(&self) -> bool {
        self.store.snapshot().can_submit()
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let outcome = self.submission.submit().await;
        if matches!(outcome, SubmitOutcome::Succeeded(_)) {
            // The draft is gone; nothing left to probe
            self.probe.cancel();
        }
        outcome
    }

    pub fn availability_errors(&self) -> Vec<PresentedError> {
        match &self.store.snapshot().availability {
            AvailabilityResult::Resolved(verdict) => {
                ErrorPresenter::present_all(&verdict.blocking_errors())
            }
            AvailabilityResult::NotChecked | AvailabilityResult::Checking => vec![],
        }
    }

    pub fn submission_errors(&self) -> Vec<PresentedError> {
        match &self.store.snapshot().submission {
            SubmissionState::Failed(errors) => ErrorPresenter::present_all(errors),
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_server::{available, MockBookingApi, ScriptedReply};
    use crate::error::{BookingFailure, ErrorCode, ValidationError};
    use crate::models::AvailabilityResponse;
    use std::time::Duration;
    use tokio::time::sleep;

    fn form() -> (Arc<MockBookingApi>, BookingForm) {
        let api = Arc::new(MockBookingApi::new());
        let form = BookingForm::new(api.clone(), &ClientConfig::default(), DraftValidator::new());
        (api, form)
    }

    fn fill(form: &BookingForm) {
        for change in [
            DraftChange::Unit(Some(1)),
            DraftChange::MeetingRoom(Some(12)),
            DraftChange::MeetingDate("2025-03-10".to_string()),
            DraftChange::StartTime("09:00".to_string()),
            DraftChange::EndTime("10:00".to_string()),
            DraftChange::Participants(Some(6)),
        ] {
            form.update(change);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_available_slot_submits_booking() {
        let (api, form) = form();
        api.push_availability(ScriptedReply::ok(20, available()));

        fill(&form);
        sleep(Duration::from_millis(1_000)).await;
        assert!(matches!(
            form.state().availability,
            AvailabilityResult::Resolved(_)
        ));
        assert!(form.can_submit());
        assert!(form.availability_errors().is_empty());

        let outcome = form.submit().await;
        assert!(matches!(outcome, SubmitOutcome::Succeeded(_)));
        assert_eq!(api.booking_calls().len(), 1);
        assert_eq!(api.booking_calls()[0].1.total_participants, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_disables_submit_and_presents_title() {
        let (api, form) = form();
        api.push_availability(ScriptedReply::ok(
            20,
            AvailabilityResponse {
                available: false,
                validations_passed: true,
                errors: vec![ValidationError::new(
                    ErrorCode::TimeConflict,
                    "Ruang Prambanan is booked 09:00-10:00",
                )],
                conflicts: vec![],
            },
        ));

        fill(&form);
        sleep(Duration::from_millis(1_000)).await;

        assert!(!form.can_submit());
        let presented = form.availability_errors();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].title, "Time Conflict");

        assert!(matches!(
            form.submit().await,
            SubmitOutcome::Failed(BookingFailure::Domain(_))
        ));
        assert!(api.booking_calls().is_empty());
        assert_eq!(form.submission_errors()[0].title, "Time Conflict");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_while_probe_in_flight_goes_through() {
        let (api, form) = form();
        api.push_availability(ScriptedReply::ok(5_000, available()));

        fill(&form);
        sleep(Duration::from_millis(900)).await;
        assert_eq!(form.state().availability, AvailabilityResult::Checking);
        assert!(form.can_submit());

        assert!(matches!(form.submit().await, SubmitOutcome::Succeeded(_)));
        assert_eq!(api.booking_calls().len(), 1);

        // The late probe result belongs to the discarded draft
        sleep(Duration::from_millis(6_000)).await;
        assert_eq!(form.state().availability, AvailabilityResult::NotChecked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_presented() {
        let (api, form) = form();
        api.push_booking(ScriptedReply::err(
            0,
            crate::error::ApiError::Timeout(10_000),
        ));

        fill(&form);
        let outcome = form.submit().await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Failed(BookingFailure::Transport(_))
        ));
        let presented = form.submission_errors();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].code, ErrorCode::NetworkError);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_cancels_pending_probe() {
        let (api, form) = form();
        fill(&form);
        // Submit before the quiet period ends
        assert!(matches!(form.submit().await, SubmitOutcome::Succeeded(_)));
        sleep(Duration::from_millis(2_000)).await;
        assert!(api.availability_calls().is_empty());
    }
}
