use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use freightnet_core::{DomainError, DomainResult, DriverId, QueueEntryId, ShipmentId, WarehouseId};
use freightnet_dockqueue::{QueueEntry, QueueStatistics, QueueStatus};
use freightnet_registry::DriverStatus;
use freightnet_shipments::ShipmentStatus;

use crate::record_store::RecordStore;

fn default_estimated_loading_minutes() -> i64 {
    60
}

/// Validated enqueue request. Priority defaults to 0, the loading estimate
/// to 60 minutes.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueRequest {
    pub warehouse_id: WarehouseId,
    pub shipment_id: ShipmentId,
    pub driver_id: DriverId,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_estimated_loading_minutes")]
    pub estimated_loading_minutes: i64,
}

impl EnqueueRequest {
    pub fn new(warehouse_id: WarehouseId, shipment_id: ShipmentId, driver_id: DriverId) -> Self {
        Self {
            warehouse_id,
            shipment_id,
            driver_id,
            priority: 0,
            estimated_loading_minutes: default_estimated_loading_minutes(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Loading-dock queue scheduler for a warehouse's dock.
pub struct QueueService<S> {
    store: S,
}

impl<S: RecordStore> QueueService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Claim a dock slot for a shipment. Rejects a second `Waiting` entry
    /// for the same (warehouse, shipment) pair and flips the shipment to
    /// `Queued` in the same transaction.
    pub fn enqueue(&self, req: EnqueueRequest) -> DomainResult<QueueEntry> {
        let entry = self.store.write(|t| {
            t.warehouse(req.warehouse_id)?;
            t.shipment(req.shipment_id)?;
            t.driver(req.driver_id)?;

            let already_waiting = t.queue.values().any(|e| {
                e.warehouse_id == req.warehouse_id
                    && e.shipment_id == req.shipment_id
                    && e.status() == QueueStatus::Waiting
            });
            if already_waiting {
                return Err(DomainError::duplicate_entry(format!(
                    "shipment {} is already waiting in the queue for warehouse {}",
                    req.shipment_id, req.warehouse_id
                )));
            }

            let now = Utc::now();
            t.shipment_mut(req.shipment_id)?
                .set_status(ShipmentStatus::Queued, now)?;

            let entry = QueueEntry::new(
                QueueEntryId::new(),
                req.warehouse_id,
                req.shipment_id,
                req.driver_id,
                req.priority,
                req.estimated_loading_minutes,
                now,
            );
            let out = entry.clone();
            t.queue.insert(entry.id, entry);
            Ok(out)
        })?;
        info!(
            entry_id = %entry.id,
            warehouse_id = %entry.warehouse_id,
            shipment_id = %entry.shipment_id,
            priority = entry.priority,
            "shipment enqueued at dock"
        );
        Ok(entry)
    }

    /// Entries for one warehouse in service order, optionally filtered by
    /// status.
    pub fn queue_for_warehouse(
        &self,
        warehouse_id: WarehouseId,
        status: Option<QueueStatus>,
    ) -> DomainResult<Vec<QueueEntry>> {
        self.store.read(|t| {
            t.warehouse(warehouse_id)?;
            Ok(t
                .queue_for_warehouse(warehouse_id)
                .into_iter()
                .filter(|e| status.is_none_or(|wanted| e.status() == wanted))
                .cloned()
                .collect())
        })
    }

    /// The entry the dock should serve next: highest priority, FIFO within a
    /// band. Read-only; loading starts explicitly.
    pub fn select_next(&self, warehouse_id: WarehouseId) -> DomainResult<Option<QueueEntry>> {
        self.store.read(|t| {
            Ok(freightnet_dockqueue::select_next(
                t.queue.values().filter(|e| e.warehouse_id == warehouse_id),
            )
            .cloned())
        })
    }

    /// Admit a waiting entry to the dock; the shipment starts loading in the
    /// same transaction.
    pub fn start_loading(&self, entry_id: QueueEntryId) -> DomainResult<QueueEntry> {
        let entry = self.store.write(|t| {
            let now = Utc::now();
            let entry = t.queue_entry_mut(entry_id)?;
            entry.start_loading(now)?;
            let shipment_id = entry.shipment_id;
            let out = entry.clone();
            t.shipment_mut(shipment_id)?
                .set_status(ShipmentStatus::Loading, now)?;
            Ok(out)
        })?;
        info!(%entry_id, shipment_id = %entry.shipment_id, "loading started");
        Ok(entry)
    }

    /// Close out a loading slot: the entry completes, the shipment goes in
    /// transit with its pickup stamped, and the driver goes on-route, all in
    /// one transaction.
    pub fn finish_loading(&self, entry_id: QueueEntryId) -> DomainResult<QueueEntry> {
        let entry = self.store.write(|t| {
            let now = Utc::now();
            let entry = t.queue_entry_mut(entry_id)?;
            entry.finish_loading(now)?;
            let shipment_id = entry.shipment_id;
            let driver_id = entry.driver_id;
            let out = entry.clone();
            t.shipment_mut(shipment_id)?
                .set_status(ShipmentStatus::InTransit, now)?;
            t.driver_mut(driver_id)?.set_status(DriverStatus::OnRoute);
            Ok(out)
        })?;
        info!(
            %entry_id,
            shipment_id = %entry.shipment_id,
            driver_id = %entry.driver_id,
            "loading finished, shipment in transit"
        );
        Ok(entry)
    }

    /// Withdraw an entry. A shipment still merely queued falls back to
    /// pending; one already loading keeps its status for the operator to
    /// resolve.
    pub fn cancel(&self, entry_id: QueueEntryId) -> DomainResult<QueueEntry> {
        let entry = self.store.write(|t| {
            let entry = t.queue_entry_mut(entry_id)?;
            entry.cancel()?;
            let shipment_id = entry.shipment_id;
            let out = entry.clone();
            let shipment = t.shipment_mut(shipment_id)?;
            if shipment.status() == ShipmentStatus::Queued {
                shipment.set_status(ShipmentStatus::Pending, Utc::now())?;
            }
            Ok(out)
        })?;
        info!(%entry_id, shipment_id = %entry.shipment_id, "queue entry cancelled");
        Ok(entry)
    }

    /// Unconditional priority overwrite; the dock order changes immediately.
    pub fn reprioritize(&self, entry_id: QueueEntryId, priority: i32) -> DomainResult<QueueEntry> {
        let entry = self.store.write(|t| {
            let entry = t.queue_entry_mut(entry_id)?;
            entry.priority = priority;
            Ok(entry.clone())
        })?;
        info!(%entry_id, priority, "queue entry reprioritized");
        Ok(entry)
    }

    pub fn statistics(&self, warehouse_id: WarehouseId) -> DomainResult<QueueStatistics> {
        self.store.read(|t| {
            Ok(QueueStatistics::compute(
                t.queue.values().filter(|e| e.warehouse_id == warehouse_id),
            ))
        })
    }
}
