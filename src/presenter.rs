// Maps error codes to what the UI shows for them. Stateless.

use crate::error::{ErrorCode, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    // The request can't go through as is
    Error,
    // The slot or rules need adjusting, the draft itself is fine
    Warning,
}

impl Severity {
    pub fn icon_class(self) -> &'static str {
        match self {
            Severity::Error => "icon-x-circle text-red-600",
            Severity::Warning => "icon-alert-triangle text-amber-500",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub title: &'static str,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedError {
    pub code: ErrorCode,
    pub title: &'static str,
    pub icon_class: &'static str,
    pub message: String,
}

pub const GENERIC_TITLE: &str = "Error";

pub struct ErrorPresenter;

impl ErrorPresenter {
    // Codes not listed here fall back to the generic title
    pub fn present(code: &ErrorCode) -> Presentation {
        let (title, severity) = match code {
            ErrorCode::TimeConflict => ("Time Conflict", Severity::Warning),
            ErrorCode::CapacityExceeded => ("Capacity Exceeded", Severity::Warning),
            ErrorCode::InvalidDatePast => ("Invalid Date", Severity::Error),
            ErrorCode::InvalidWorkingDay => ("Invalid Day", Severity::Warning),
            ErrorCode::OutsideWorkingHours => ("Outside Working Hours", Severity::Warning),
            ErrorCode::InvalidTimeFormat => ("Bad Time Format", Severity::Error),
            ErrorCode::InvalidTimeOrder => ("Bad Time Order", Severity::Error),
            ErrorCode::InvalidDurationTooShort | ErrorCode::InvalidDurationTooLong => {
                ("Invalid Duration", Severity::Warning)
            }
            ErrorCode::RoomNotFound => ("Room Not Found", Severity::Error),
            ErrorCode::RoomInactive => ("Room Inactive", Severity::Error),
            ErrorCode::InvalidParticipantsCount => ("Invalid Participant Count", Severity::Error),
            ErrorCode::NetworkError => ("Connection Problem", Severity::Error),
            ErrorCode::Other(_) => (GENERIC_TITLE, Severity::Error),
        };
        Presentation { title, severity }
    }

    pub fn present_all(errors: &[ValidationError]) -> Vec<PresentedError> {
        errors
            .iter()
            .map(|error| {
                let presentation = Self::present(&error.code);
                PresentedError {
                    code: error.code.clone(),
                    title: presentation.title,
                    icon_class: presentation.severity.icon_class(),
                    message: error.message.clone(),
                }
            })
            .collect()
    }
}
