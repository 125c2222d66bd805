// Error taxonomy for the booking workflow
//
// Structural errors never leave the draft (see validator), domain errors come
// from the authority, transport errors mean no usable response was received.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::validator::FieldErrors;

// Domain codes reported by the booking authority, plus the local transport code.
// Codes the client doesn't know are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    TimeConflict,
    CapacityExceeded,
    InvalidDatePast,
    InvalidWorkingDay,
    OutsideWorkingHours,
    InvalidTimeFormat,
    InvalidTimeOrder,
    InvalidDurationTooShort,
    InvalidDurationTooLong,
    RoomNotFound,
    RoomInactive,
    InvalidParticipantsCount,
    NetworkError,
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::TimeConflict => "TIME_CONFLICT",
            ErrorCode::CapacityExceeded => "CAPACITY_EXCEEDED",
            ErrorCode::InvalidDatePast => "INVALID_DATE_PAST",
            ErrorCode::InvalidWorkingDay => "INVALID_WORKING_DAY",
            ErrorCode::OutsideWorkingHours => "OUTSIDE_WORKING_HOURS",
            ErrorCode::InvalidTimeFormat => "INVALID_TIME_FORMAT",
            ErrorCode::InvalidTimeOrder => "INVALID_TIME_ORDER",
            ErrorCode::InvalidDurationTooShort => "INVALID_DURATION_TOO_SHORT",
            ErrorCode::InvalidDurationTooLong => "INVALID_DURATION_TOO_LONG",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::RoomInactive => "ROOM_INACTIVE",
            ErrorCode::InvalidParticipantsCount => "INVALID_PARTICIPANTS_COUNT",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::Other(code) => code,
        }
    }
}

impl ErrorCode {
    // Item-level errors may carry only {field, message}; the code is filled in later
    pub fn unspecified() -> Self {
        ErrorCode::Other(String::new())
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, ErrorCode::Other(code) if code.is_empty())
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "TIME_CONFLICT" => ErrorCode::TimeConflict,
            "CAPACITY_EXCEEDED" => ErrorCode::CapacityExceeded,
            "INVALID_DATE_PAST" => ErrorCode::InvalidDatePast,
            "INVALID_WORKING_DAY" => ErrorCode::InvalidWorkingDay,
            "OUTSIDE_WORKING_HOURS" => ErrorCode::OutsideWorkingHours,
            "INVALID_TIME_FORMAT" => ErrorCode::InvalidTimeFormat,
            "INVALID_TIME_ORDER" => ErrorCode::InvalidTimeOrder,
            "INVALID_DURATION_TOO_SHORT" => ErrorCode::InvalidDurationTooShort,
            "INVALID_DURATION_TOO_LONG" => ErrorCode::InvalidDurationTooLong,
            "ROOM_NOT_FOUND" => ErrorCode::RoomNotFound,
            "ROOM_INACTIVE" => ErrorCode::RoomInactive,
            "INVALID_PARTICIPANTS_COUNT" => ErrorCode::InvalidParticipantsCount,
            "NETWORK_ERROR" => ErrorCode::NetworkError,
            other => ErrorCode::Other(other.to_string()),
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        ErrorCode::from(code.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// A single domain or transport error. Identity is the code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(default = "ErrorCode::unspecified")]
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, message)
    }
}

// Failures talking to the authority
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError {
        status_code: u16,
        message: String,
        code: Option<String>,
        validation_errors: Vec<ValidationError>,
    },

    #[error("Malformed response ({status_code}): {detail}")]
    MalformedResponse { status_code: u16, detail: String },
}

impl ApiError {
    // Only failures where no verdict was received are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::NetworkError(_) | ApiError::Timeout(_) => true,
            ApiError::ApiResponseError { status_code, .. } => *status_code >= 500,
            ApiError::MalformedResponse { .. } => false,
        }
    }
}

// Why a submission did not produce a booking.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingFailure {
    #[error("draft has {} invalid field(s)", .0.len())]
    Structural(FieldErrors),

    #[error("booking rejected with {} error(s)", .0.len())]
    Domain(Vec<ValidationError>),

    #[error("booking request failed: {}", .0.message)]
    Transport(ValidationError),
}

impl BookingFailure {
    // Errors meant for the presenter. Structural errors stay on their fields.
    pub fn presentable(&self) -> &[ValidationError] {
        match self {
            BookingFailure::Structural(_) => &[],
            BookingFailure::Domain(errors) => errors,
            BookingFailure::Transport(error) => std::slice::from_ref(error),
        }
    }
}

// Extraction precedence: structured list, then top-level code/message, then transport.
impl From<ApiError> for BookingFailure {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::ApiResponseError {
                validation_errors, ..
            } if !validation_errors.is_empty() => BookingFailure::Domain(validation_errors),
            ApiError::ApiResponseError {
                status_code,
                message,
                code,
                ..
            } => {
                let code = code
                    .filter(|c| !c.is_empty())
                    .map(ErrorCode::from)
                    .unwrap_or_else(|| ErrorCode::Other(format!("HTTP_{}", status_code)));
                BookingFailure::Domain(vec![ValidationError::new(code, message)])
            }
            ApiError::NetworkError(message) => {
                BookingFailure::Transport(ValidationError::network(message))
            }
            ApiError::Timeout(ms) => BookingFailure::Transport(ValidationError::network(format!(
                "no response from the booking service after {}ms",
                ms
            ))),
            ApiError::MalformedResponse {
                status_code,
                detail,
            } => BookingFailure::Transport(ValidationError::network(format!(
                "unreadable response from the booking service ({}): {}",
                status_code, detail
            ))),
        }
    }
}
