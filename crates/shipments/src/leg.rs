use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freightnet_core::{DomainError, DomainResult, WarehouseId};

/// Leg lifecycle. Legs only move forward; re-entering the current status is
/// an accepted no-op handled by the owning shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegStatus {
    Pending,
    InTransit,
    Arrived,
    Unloaded,
    Completed,
}

impl LegStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegStatus::Pending => "pending",
            LegStatus::InTransit => "in_transit",
            LegStatus::Arrived => "arrived",
            LegStatus::Unloaded => "unloaded",
            LegStatus::Completed => "completed",
        }
    }

    /// Legal forward transitions. Unloading may be skipped when a leg hands
    /// straight over to the next one.
    pub fn can_transition(self, to: LegStatus) -> bool {
        matches!(
            (self, to),
            (LegStatus::Pending, LegStatus::InTransit)
                | (LegStatus::InTransit, LegStatus::Arrived)
                | (LegStatus::Arrived, LegStatus::Unloaded)
                | (LegStatus::Arrived, LegStatus::Completed)
                | (LegStatus::Unloaded, LegStatus::Completed)
        )
    }
}

impl core::fmt::Display for LegStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied leg description at shipment creation.
///
/// Sequences are persisted as given; the engine does not renumber or require
/// them to be contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLeg {
    pub sequence: u32,
    pub from_warehouse_id: WarehouseId,
    pub to_warehouse_id: WarehouseId,
    pub scheduled_departure_date: Option<DateTime<Utc>>,
    pub scheduled_arrival_date: Option<DateTime<Utc>>,
    pub distance_km: Option<f64>,
}

/// One point-to-point segment of a multi-warehouse route, ordered by
/// `sequence` (1-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentLeg {
    pub sequence: u32,
    pub from_warehouse_id: WarehouseId,
    pub to_warehouse_id: WarehouseId,
    status: LegStatus,
    pub scheduled_departure_date: Option<DateTime<Utc>>,
    actual_departure_date: Option<DateTime<Utc>>,
    pub scheduled_arrival_date: Option<DateTime<Utc>>,
    actual_arrival_date: Option<DateTime<Utc>>,
    unloaded_date: Option<DateTime<Utc>>,
    pub distance_km: Option<f64>,
}

impl ShipmentLeg {
    pub fn from_request(req: NewLeg) -> Self {
        Self {
            sequence: req.sequence,
            from_warehouse_id: req.from_warehouse_id,
            to_warehouse_id: req.to_warehouse_id,
            status: LegStatus::Pending,
            scheduled_departure_date: req.scheduled_departure_date,
            actual_departure_date: None,
            scheduled_arrival_date: req.scheduled_arrival_date,
            actual_arrival_date: None,
            unloaded_date: None,
            distance_km: req.distance_km,
        }
    }

    pub fn status(&self) -> LegStatus {
        self.status
    }

    pub fn actual_departure_date(&self) -> Option<DateTime<Utc>> {
        self.actual_departure_date
    }

    pub fn actual_arrival_date(&self) -> Option<DateTime<Utc>> {
        self.actual_arrival_date
    }

    pub fn unloaded_date(&self) -> Option<DateTime<Utc>> {
        self.unloaded_date
    }

    /// Move the leg through its machine, stamping each actual date the first
    /// time the matching state is entered. Re-entering the current status is
    /// a no-op and never restamps.
    pub fn set_status(&mut self, to: LegStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if to == self.status {
            return Ok(());
        }
        if !self.status.can_transition(to) {
            return Err(DomainError::invalid_state(format!(
                "leg {}: cannot move from {} to {}",
                self.sequence, self.status, to
            )));
        }
        self.status = to;
        match to {
            LegStatus::InTransit => {
                self.actual_departure_date.get_or_insert(now);
            }
            LegStatus::Arrived => {
                self.actual_arrival_date.get_or_insert(now);
            }
            LegStatus::Unloaded => {
                self.unloaded_date.get_or_insert(now);
            }
            LegStatus::Pending | LegStatus::Completed => {}
        }
        Ok(())
    }
}
