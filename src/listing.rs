// Booking list display: pagination window and row formatting

use chrono::NaiveDate;

use crate::master_data::MasterData;
use crate::models::{Booking, BookingId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Gap,
}

// Pages to render for the pager: a window of two pages either side of
// `current`, plus the first and last page with gaps where pages are skipped.
pub fn page_numbers(current: u32, total_pages: u32) -> Vec<PageItem> {
    let mut items = Vec::new();
    if total_pages == 0 {
        return items;
    }
    let current = current.clamp(1, total_pages);

    if current > 3 {
        items.push(PageItem::Page(1));
        if current > 4 {
            items.push(PageItem::Gap);
        }
    }

    let first = current.saturating_sub(2).max(1);
    let last = (current + 2).min(total_pages);
    items.extend((first..=last).map(PageItem::Page));

    if current + 2 < total_pages {
        if current + 3 < total_pages {
            items.push(PageItem::Gap);
        }
        items.push(PageItem::Page(total_pages));
    }
    items
}

// The authority may append seconds; only HH:MM is shown
pub fn display_time(value: &str) -> &str {
    value.get(..5).unwrap_or(value)
}

pub fn display_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRow {
    pub id: BookingId,
    pub unit: String,
    pub room: String,
    pub date: String,
    pub time: String,
    pub participants: u32,
}

impl BookingRow {
    // Embedded unit/room objects win; otherwise names come from master data
    pub fn new(booking: &Booking, master: &MasterData) -> Self {
        let unit = booking
            .unit
            .as_ref()
            .map(|u| u.name.clone())
            .or_else(|| master.unit(booking.unit_id).map(|u| u.name.clone()))
            .unwrap_or_else(|| format!("Unit #{}", booking.unit_id));
        let room = booking
            .meeting_room
            .as_ref()
            .map(|r| r.name.clone())
            .or_else(|| master.room(booking.meeting_room_id).map(|r| r.name.clone()))
            .unwrap_or_else(|| format!("Room #{}", booking.meeting_room_id));

        Self {
            id: booking.id,
            unit,
            room,
            date: display_date(booking.meeting_date),
            time: format!(
                "{} - {}",
                display_time(&booking.start_time),
                display_time(&booking.end_time)
            ),
            participants: booking.total_participants,
        }
    }
}
