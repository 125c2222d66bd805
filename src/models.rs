use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub type UnitId = u64;
pub type RoomId = u64;
pub type ConsumptionId = u64;
pub type BookingId = u64;

// Envelope every authority response is wrapped in.
// Success: {success, data, message}; failure: {success: false, message, code, errors?}
// `data` stays raw until the response is known to be a success.
#[derive(Debug, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "validationErrors", alias = "errors")]
    pub validation_errors: Option<Vec<ValidationError>>,
}

// Master data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    #[serde(default = "active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRoom {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    #[serde(default = "active")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    pub id: ConsumptionId,
    pub name: String,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

// Bookings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub unit_id: UnitId,
    pub meeting_room_id: RoomId,
    pub meeting_date: NaiveDate,
    pub start_time: String, // HH:MM or HH:MM:SS as sent by the authority
    pub end_time: String,
    pub total_participants: u32,
    #[serde(default)]
    pub total_consumption: i64,
    #[serde(default)]
    pub notes: Option<String>,
    // Passed through as sent; the authority's timestamp format isn't fixed
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub meeting_room: Option<MeetingRoom>,
    #[serde(default)]
    pub consumptions: Vec<Consumption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
    pub pagination: Pagination,
}

// Query string for GET /bookings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingListQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<UnitId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
}

impl Default for BookingListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            unit_id: None,
            room_id: None,
            date_from: None,
            date_to: None,
        }
    }
}

// Data of GET /bookings/availability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available: bool,
    #[serde(default = "active")]
    pub validations_passed: bool,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    #[serde(default)]
    pub conflicts: Vec<Booking>,
}

// Body of POST /bookings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub unit_id: UnitId,
    pub meeting_room_id: RoomId,
    pub meeting_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub total_participants: u32,
    pub total_consumption: i64,
    pub consumption_ids: Vec<ConsumptionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
