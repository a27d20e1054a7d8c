use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freightnet_core::{DomainError, DomainResult, DriverId, Entity, QueueEntryId, ShipmentId, WarehouseId};

/// Queue entry lifecycle. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    Loading,
    Completed,
    Cancelled,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::Loading => "loading",
            QueueStatus::Completed => "completed",
            QueueStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Cancelled)
    }
}

impl core::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One shipment's claim on one warehouse's loading dock.
///
/// Entries are never deleted; they end in a terminal status. At most one
/// `Waiting` entry may exist per (warehouse, shipment) pair; the store-level
/// duplicate check enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: QueueEntryId,
    pub warehouse_id: WarehouseId,
    pub shipment_id: ShipmentId,
    pub driver_id: DriverId,
    status: QueueStatus,
    /// Higher is served first.
    pub priority: i32,
    pub arrival_time: DateTime<Utc>,
    start_loading_time: Option<DateTime<Utc>>,
    finish_loading_time: Option<DateTime<Utc>>,
    pub estimated_loading_minutes: i64,
}

impl QueueEntry {
    pub fn new(
        id: QueueEntryId,
        warehouse_id: WarehouseId,
        shipment_id: ShipmentId,
        driver_id: DriverId,
        priority: i32,
        estimated_loading_minutes: i64,
        arrival_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            warehouse_id,
            shipment_id,
            driver_id,
            status: QueueStatus::Waiting,
            priority,
            arrival_time,
            start_loading_time: None,
            finish_loading_time: None,
            estimated_loading_minutes,
        }
    }

    pub fn status(&self) -> QueueStatus {
        self.status
    }

    pub fn start_loading_time(&self) -> Option<DateTime<Utc>> {
        self.start_loading_time
    }

    pub fn finish_loading_time(&self) -> Option<DateTime<Utc>> {
        self.finish_loading_time
    }

    /// Admit the entry to the dock. Legal only while waiting.
    pub fn start_loading(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != QueueStatus::Waiting {
            return Err(DomainError::invalid_state(format!(
                "queue entry {}: start_loading requires waiting status, current {}",
                self.id, self.status
            )));
        }
        self.status = QueueStatus::Loading;
        self.start_loading_time = Some(now);
        Ok(())
    }

    /// Close out a loading slot. Legal only while loading.
    pub fn finish_loading(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != QueueStatus::Loading {
            return Err(DomainError::invalid_state(format!(
                "queue entry {}: finish_loading requires loading status, current {}",
                self.id, self.status
            )));
        }
        self.status = QueueStatus::Completed;
        self.finish_loading_time = Some(now);
        Ok(())
    }

    /// Withdraw the entry. Illegal once terminal.
    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_state(format!(
                "queue entry {}: cannot cancel from {}",
                self.id, self.status
            )));
        }
        self.status = QueueStatus::Cancelled;
        Ok(())
    }
}

impl Entity for QueueEntry {
    type Id = QueueEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Dock service order: priority descending, then arrival ascending (strict
/// FIFO within a priority band).
pub fn queue_order(a: &QueueEntry, b: &QueueEntry) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.arrival_time.cmp(&b.arrival_time))
}

/// The single entry the dock should serve next: the best-ordered `Waiting`
/// entry. Read-only; callers start loading explicitly.
pub fn select_next<'a, I>(entries: I) -> Option<&'a QueueEntry>
where
    I: IntoIterator<Item = &'a QueueEntry>,
{
    entries
        .into_iter()
        .filter(|e| e.status() == QueueStatus::Waiting)
        .min_by(|a, b| queue_order(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(priority: i32, arrival: DateTime<Utc>) -> QueueEntry {
        QueueEntry::new(
            QueueEntryId::new(),
            WarehouseId::new(),
            ShipmentId::new(),
            DriverId::new(),
            priority,
            60,
            arrival,
        )
    }

    #[test]
    fn lifecycle_waiting_loading_completed() {
        let now = Utc::now();
        let mut e = entry(0, now);
        e.start_loading(now).unwrap();
        assert_eq!(e.status(), QueueStatus::Loading);
        assert_eq!(e.start_loading_time(), Some(now));
        e.finish_loading(now).unwrap();
        assert_eq!(e.status(), QueueStatus::Completed);
        assert_eq!(e.finish_loading_time(), Some(now));
    }

    #[test]
    fn start_loading_twice_is_invalid_state() {
        let now = Utc::now();
        let mut e = entry(0, now);
        e.start_loading(now).unwrap();
        assert!(matches!(
            e.start_loading(now),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn finish_loading_requires_loading() {
        let now = Utc::now();
        let mut e = entry(0, now);
        let err = e.finish_loading(now).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(e.status(), QueueStatus::Waiting);
        assert_eq!(e.finish_loading_time(), None);
    }

    #[test]
    fn cancel_is_legal_from_waiting_and_loading_only() {
        let now = Utc::now();
        let mut waiting = entry(0, now);
        waiting.cancel().unwrap();
        assert_eq!(waiting.status(), QueueStatus::Cancelled);
        assert!(matches!(
            waiting.cancel(),
            Err(DomainError::InvalidState(_))
        ));

        let mut done = entry(0, now);
        done.start_loading(now).unwrap();
        done.finish_loading(now).unwrap();
        assert!(matches!(done.cancel(), Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn higher_priority_is_served_first() {
        let t0 = Utc::now();
        let low = entry(1, t0);
        let high = entry(10, t0 + chrono::Duration::minutes(5));
        let next = select_next([&low, &high]).unwrap();
        assert_eq!(next.id, high.id);
    }

    #[test]
    fn equal_priority_is_fifo_by_arrival() {
        let t0 = Utc::now();
        let first = entry(5, t0);
        let second = entry(5, t0 + chrono::Duration::seconds(1));
        let next = select_next([&second, &first]).unwrap();
        assert_eq!(next.id, first.id);
    }

    #[test]
    fn select_next_skips_non_waiting_entries() {
        let t0 = Utc::now();
        let mut loading = entry(10, t0);
        loading.start_loading(t0).unwrap();
        let mut done = entry(10, t0);
        done.start_loading(t0).unwrap();
        done.finish_loading(t0).unwrap();
        let mut cancelled = entry(10, t0);
        cancelled.cancel().unwrap();
        let waiting = entry(1, t0 + chrono::Duration::seconds(3));

        let next = select_next([&loading, &done, &cancelled, &waiting]).unwrap();
        assert_eq!(next.id, waiting.id);
        assert!(select_next([&loading, &done, &cancelled]).is_none());
    }
}
