// The in-progress booking a user is editing

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{ConsumptionId, RoomId, UnitId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingDraft {
    pub unit_id: Option<UnitId>,
    pub meeting_room_id: Option<RoomId>,
    pub meeting_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub participant_count: Option<i64>,
    // Absent means the form default of zero
    pub consumption_amount: Option<i64>,
    pub consumption_ids: BTreeSet<ConsumptionId>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DraftField {
    Unit,
    MeetingRoom,
    MeetingDate,
    StartTime,
    EndTime,
    Participants,
    ConsumptionAmount,
    Consumptions,
    Notes,
}

impl DraftField {
    // Fields whose change invalidates the availability result
    pub fn is_probe_trigger(self) -> bool {
        matches!(
            self,
            DraftField::MeetingRoom
                | DraftField::MeetingDate
                | DraftField::StartTime
                | DraftField::EndTime
                | DraftField::Participants
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DraftField::Unit => "unit_id",
            DraftField::MeetingRoom => "meeting_room_id",
            DraftField::MeetingDate => "meeting_date",
            DraftField::StartTime => "start_time",
            DraftField::EndTime => "end_time",
            DraftField::Participants => "total_participants",
            DraftField::ConsumptionAmount => "total_consumption",
            DraftField::Consumptions => "consumption_ids",
            DraftField::Notes => "notes",
        }
    }
}

// A single user edit. Text inputs that are blank after trimming clear the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftChange {
    Unit(Option<UnitId>),
    MeetingRoom(Option<RoomId>),
    MeetingDate(String),
    StartTime(String),
    EndTime(String),
    Participants(Option<i64>),
    ConsumptionAmount(Option<i64>),
    Consumption { id: ConsumptionId, selected: bool },
    Notes(String),
}

impl DraftChange {
    pub fn field(&self) -> DraftField {
        match self {
            DraftChange::Unit(_) => DraftField::Unit,
            DraftChange::MeetingRoom(_) => DraftField::MeetingRoom,
            DraftChange::MeetingDate(_) => DraftField::MeetingDate,
            DraftChange::StartTime(_) => DraftField::StartTime,
            DraftChange::EndTime(_) => DraftField::EndTime,
            DraftChange::Participants(_) => DraftField::Participants,
            DraftChange::ConsumptionAmount(_) => DraftField::ConsumptionAmount,
            DraftChange::Consumption { .. } => DraftField::Consumptions,
            DraftChange::Notes(_) => DraftField::Notes,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// The exact trigger-field values an availability request is issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeKey {
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub participants: u32,
}

impl BookingDraft {
    pub fn apply(&mut self, change: DraftChange) {
        match change {
            DraftChange::Unit(id) => self.unit_id = id,
            DraftChange::MeetingRoom(id) => self.meeting_room_id = id,
            DraftChange::MeetingDate(value) => self.meeting_date = non_blank(value),
            DraftChange::StartTime(value) => self.start_time = non_blank(value),
            DraftChange::EndTime(value) => self.end_time = non_blank(value),
            DraftChange::Participants(count) => self.participant_count = count,
            DraftChange::ConsumptionAmount(amount) => self.consumption_amount = amount,
            DraftChange::Consumption { id, selected } => {
                if selected {
                    self.consumption_ids.insert(id);
                } else {
                    self.consumption_ids.remove(&id);
                }
            }
            DraftChange::Notes(value) => self.notes = non_blank(value),
        }
    }

    // Some(key) only when every trigger field is present and structurally valid
    pub fn probe_key(&self) -> Option<ProbeKey> {
        let room_id = self.meeting_room_id?;
        let date = parse_date(self.meeting_date.as_deref()?)?;
        let start_time = self.start_time.as_deref()?;
        let end_time = self.end_time.as_deref()?;
        parse_time(start_time)?;
        parse_time(end_time)?;
        if start_time >= end_time {
            return None;
        }
        let participants = u32::try_from(self.participant_count?).ok()?;
        if participants < 1 {
            return None;
        }

        Some(ProbeKey {
            room_id,
            date,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            participants,
        })
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

// 24h HH:MM, optionally with trailing seconds
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    if value.len() == 5 {
        NaiveTime::parse_from_str(value, "%H:%M").ok()
    } else if value.len() == 8 {
        NaiveTime::parse_from_str(value, "%H:%M:%S").ok()
    } else {
        None
    }
}
