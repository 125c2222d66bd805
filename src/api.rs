// Client for the booking authority's REST endpoints

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::{ClientConfig, ClientError};
use crate::draft::ProbeKey;
use crate::error::{ApiError, ErrorCode};
use crate::models::{
    ApiEnvelope, AvailabilityResponse, Booking, BookingListQuery, BookingListResponse,
    Consumption, CreateBookingRequest, MeetingRoom, Unit,
};

// One method per consumed endpoint
#[async_trait]
pub trait BookingApi: Send + Sync + 'static {
    // GET /units
    async fn fetch_units(&self) -> Result<Vec<Unit>, ApiError>;

    // GET /rooms
    async fn fetch_rooms(&self) -> Result<Vec<MeetingRoom>, ApiError>;

    // GET /consumptions
    async fn fetch_consumptions(&self) -> Result<Vec<Consumption>, ApiError>;

    // GET /bookings?page&limit
    async fn fetch_bookings(&self, query: &BookingListQuery)
        -> Result<BookingListResponse, ApiError>;

    // GET /bookings/availability?room_id&date&start_time&end_time&participants
    async fn check_availability(&self, key: &ProbeKey) -> Result<AvailabilityResponse, ApiError>;

    // POST /bookings
    async fn create_booking(&self, request: &CreateBookingRequest) -> Result<Booking, ApiError>;
}

pub struct HttpBookingApi {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpBookingApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_ms,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        decode_envelope(status, &body)
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.timeout_ms)
        } else {
            ApiError::NetworkError(error.to_string())
        }
    }
}

// Unwraps {success, data, message}. Only a body that isn't JSON, or a success
// whose data can't be read, is malformed; any other failure body is a rejection.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse {
            status_code: status,
            detail: e.to_string(),
        })?;
    // An unexpected JSON shape still means the authority answered
    let envelope: ApiEnvelope = serde_json::from_value(value).unwrap_or_default();

    let succeeded = (200..300).contains(&status) && envelope.success.unwrap_or(true);
    if succeeded {
        let data = envelope
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| ApiError::MalformedResponse {
                status_code: status,
                detail: "success envelope without data".to_string(),
            })?;
        return serde_json::from_value(data).map_err(|e| ApiError::MalformedResponse {
            status_code: status,
            detail: e.to_string(),
        });
    }

    let code = envelope.code.filter(|code| !code.is_empty());
    let validation_errors = envelope
        .validation_errors
        .unwrap_or_default()
        .into_iter()
        .map(|mut error| {
            // {field, message} items inherit the envelope's code
            if let (true, Some(code)) = (error.code.is_unspecified(), &code) {
                error.code = ErrorCode::from(code.as_str());
            }
            error
        })
        .collect();

    Err(ApiError::ApiResponseError {
        status_code: status,
        message: envelope.message.unwrap_or_default(),
        code,
        validation_errors,
    })
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn fetch_units(&self) -> Result<Vec<Unit>, ApiError> {
        debug!("fetching units");
        self.send(self.client.get(self.url("/units"))).await
    }

    async fn fetch_rooms(&self) -> Result<Vec<MeetingRoom>, ApiError> {
        debug!("fetching rooms");
        self.send(self.client.get(self.url("/rooms"))).await
    }

    async fn fetch_consumptions(&self) -> Result<Vec<Consumption>, ApiError> {
        debug!("fetching consumptions");
        self.send(self.client.get(self.url("/consumptions"))).await
    }

    async fn fetch_bookings(
        &self,
        query: &BookingListQuery,
    ) -> Result<BookingListResponse, ApiError> {
        debug!(page = query.page, limit = query.limit, "fetching bookings");
        self.send(self.client.get(self.url("/bookings")).query(query))
            .await
    }

    async fn check_availability(&self, key: &ProbeKey) -> Result<AvailabilityResponse, ApiError> {
        info!(
            room_id = key.room_id,
            date = %key.date,
            start = %key.start_time,
            end = %key.end_time,
            participants = key.participants,
            "checking availability"
        );
        self.send(
            self.client
                .get(self.url("/bookings/availability"))
                .query(key),
        )
        .await
    }

    async fn create_booking(&self, request: &CreateBookingRequest) -> Result<Booking, ApiError> {
        info!(
            room_id = request.meeting_room_id,
            date = %request.meeting_date,
            "creating booking"
        );
        self.send(self.client.post(self.url("/bookings")).json(request))
            .await
    }
}
