// Structural validation of a booking draft. Never touches the network.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::draft::{parse_date, parse_time, BookingDraft, DraftField};
use crate::master_data::MasterData;
use crate::models::{ConsumptionId, CreateBookingRequest};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Unit must be selected")]
    MissingUnit,

    #[error("Meeting room must be selected")]
    MissingRoom,

    #[error("Meeting date is required")]
    MissingDate,

    #[error("Meeting date must be a valid date (YYYY-MM-DD)")]
    InvalidDate,

    #[error("Start time is required")]
    MissingStartTime,

    #[error("End time is required")]
    MissingEndTime,

    #[error("Time must use the 24-hour HH:MM format")]
    InvalidTimeFormat,

    #[error("End time must be after start time")]
    EndNotAfterStart,

    #[error("Number of participants is required")]
    MissingParticipants,

    #[error("At least one participant is required")]
    TooFewParticipants,

    #[error("Number of participants is too large")]
    TooManyParticipants,

    #[error("Consumption amount cannot be negative")]
    NegativeConsumptionAmount,

    #[error("Unknown consumption option {0}")]
    UnknownConsumption(ConsumptionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: DraftField,
    pub error: StructuralError,
}

// Every structural violation of a draft, each attached to its field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn for_field(&self, field: DraftField) -> impl Iterator<Item = &StructuralError> {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| &e.error)
    }

    pub fn has(&self, field: DraftField, error: &StructuralError) -> bool {
        self.for_field(field).any(|e| e == error)
    }

    fn push(&mut self, field: DraftField, error: StructuralError) {
        self.0.push(FieldError { field, error });
    }
}

#[derive(Debug, Clone, Default)]
pub struct DraftValidator {
    // None until master data is loaded; membership isn't checked before that
    known_consumptions: Option<BTreeSet<ConsumptionId>>,
}

impl DraftValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_master_data(master: &MasterData) -> Self {
        Self {
            known_consumptions: Some(master.consumption_ids()),
        }
    }

    // Runs every rule independently so all violations surface together.
    // On success the draft is converted into the create request body.
    pub fn validate(&self, draft: &BookingDraft) -> Result<CreateBookingRequest, FieldErrors> {
        let mut errors = FieldErrors::default();

        if draft.unit_id.is_none() {
            errors.push(DraftField::Unit, StructuralError::MissingUnit);
        }
        if draft.meeting_room_id.is_none() {
            errors.push(DraftField::MeetingRoom, StructuralError::MissingRoom);
        }

        let meeting_date = match draft.meeting_date.as_deref() {
            None => {
                errors.push(DraftField::MeetingDate, StructuralError::MissingDate);
                None
            }
            Some(value) => {
                let parsed = parse_date(value);
                if parsed.is_none() {
                    errors.push(DraftField::MeetingDate, StructuralError::InvalidDate);
                }
                parsed
            }
        };

        let start_time = draft.start_time.as_deref();
        let end_time = draft.end_time.as_deref();
        for (field, value, missing) in [
            (DraftField::StartTime, start_time, StructuralError::MissingStartTime),
            (DraftField::EndTime, end_time, StructuralError::MissingEndTime),
        ] {
            match value {
                None => errors.push(field, missing),
                Some(value) if parse_time(value).is_none() => {
                    errors.push(field, StructuralError::InvalidTimeFormat)
                }
                Some(_) => {}
            }
        }
        // Same-day times, so plain string ordering is enough
        if let (Some(start), Some(end)) = (start_time, end_time) {
            if start >= end {
                errors.push(DraftField::EndTime, StructuralError::EndNotAfterStart);
            }
        }

        let participants = match draft.participant_count {
            None => {
                errors.push(DraftField::Participants, StructuralError::MissingParticipants);
                None
            }
            Some(count) if count < 1 => {
                errors.push(DraftField::Participants, StructuralError::TooFewParticipants);
                None
            }
            Some(count) => match u32::try_from(count) {
                Ok(count) => Some(count),
                Err(_) => {
                    errors.push(DraftField::Participants, StructuralError::TooManyParticipants);
                    None
                }
            },
        };

        let consumption_amount = draft.consumption_amount.unwrap_or(0);
        if consumption_amount < 0 {
            errors.push(
                DraftField::ConsumptionAmount,
                StructuralError::NegativeConsumptionAmount,
            );
        }

        if let Some(known) = &self.known_consumptions {
            for id in draft.consumption_ids.iter().filter(|id| !known.contains(id)) {
                errors.push(
                    DraftField::Consumptions,
                    StructuralError::UnknownConsumption(*id),
                );
            }
        }

        // Every None below has pushed an error above
        let (
            Some(unit_id),
            Some(meeting_room_id),
            Some(meeting_date),
            Some(start),
            Some(end),
            Some(total_participants),
        ) = (
            draft.unit_id,
            draft.meeting_room_id,
            meeting_date,
            start_time,
            end_time,
            participants,
        )
        else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CreateBookingRequest {
            unit_id,
            meeting_room_id,
            meeting_date,
            start_time: start.to_string(),
            end_time: end.to_string(),
            total_participants,
            total_consumption: consumption_amount,
            consumption_ids: draft.consumption_ids.iter().copied().collect(),
            notes: draft.notes.clone(),
        })
    }
}
