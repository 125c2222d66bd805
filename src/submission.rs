// Final gate and create request for a booking draft

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::BookingApi;
use crate::error::BookingFailure;
use crate::models::Booking;
use crate::state::{AvailabilityResult, FormEvent, FormStore};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Succeeded(Booking),
    Failed(BookingFailure),
    // Another submission was already in flight
    Ignored,
}

pub struct SubmissionController {
    api: Arc<dyn BookingApi>,
    store: FormStore,
}

impl SubmissionController {
    pub fn new(api: Arc<dyn BookingApi>, store: FormStore) -> Self {
        Self { api, store }
    }

    // Checks, in order: no submission in flight, structural validity, and the
    // last resolved availability verdict. A probe that is still running or was
    // never issued doesn't block; the authority re-checks on create.
    pub async fn submit(&self) -> SubmitOutcome {
        let snapshot = self.store.snapshot();
        if snapshot.submission.is_submitting() {
            debug!("submit ignored, a submission is already in flight");
            return SubmitOutcome::Ignored;
        }

        let request = match self.store.validator().validate(&snapshot.draft) {
            Ok(request) => request,
            Err(errors) => {
                debug!(invalid_fields = errors.len(), "submit blocked by draft errors");
                return SubmitOutcome::Failed(BookingFailure::Structural(errors));
            }
        };

        if let AvailabilityResult::Resolved(verdict) = &snapshot.availability {
            if !verdict.is_bookable() {
                let errors = verdict.blocking_errors();
                info!(
                    available = verdict.available,
                    validations_passed = verdict.validations_passed,
                    "submit refused by last availability result"
                );
                self.store.dispatch(FormEvent::SubmitRefused(errors.clone()));
                return SubmitOutcome::Failed(BookingFailure::Domain(errors));
            }
        }

        // Guarded transition; loses to any submit that started since the snapshot
        if self.store.dispatch(FormEvent::SubmitStarted).is_none() {
            return SubmitOutcome::Ignored;
        }

        match self.api.create_booking(&request).await {
            Ok(booking) => {
                info!(booking_id = booking.id, "booking created");
                self.store
                    .dispatch(FormEvent::SubmitResolved(Ok(booking.id)));
                SubmitOutcome::Succeeded(booking)
            }
            Err(error) => {
                warn!(%error, "booking request failed");
                let failure = BookingFailure::from(error);
                self.store.dispatch(FormEvent::SubmitResolved(Err(
                    failure.presentable().to_vec(),
                )));
                SubmitOutcome::Failed(failure)
            }
        }
    }
}
