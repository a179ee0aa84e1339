use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clock::ClockTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub duration_minutes: u16,
    pub is_available: bool,
    pub bound_booking_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Slot as handed to a store for insertion; stores assign nothing but the timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub duration_minutes: u16,
}

/// Validated replacement times for an unbound slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTimes {
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub duration_minutes: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub duration_minutes: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGridRequest {
    pub date: NaiveDate,
    pub range_start: Option<ClockTime>,
    pub range_end: Option<ClockTime>,
    pub duration_minutes: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleSlotRequest {
    pub date: Option<NaiveDate>,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    pub duration_minutes: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGridResponse {
    pub created: usize,
    pub slots: Vec<Slot>,
}
