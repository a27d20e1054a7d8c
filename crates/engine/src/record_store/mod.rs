//! The transactional record store the engine runs against.
//!
//! The engine does not implement storage itself; it requires a collaborator
//! offering point lookups and atomic multi-record read-modify-write. The
//! in-memory implementation here serves tests and development; a SQL-backed
//! implementation would satisfy the same contract with database transactions
//! (at least read-committed isolation with row locking on the records being
//! touched).

pub mod in_memory;

use std::collections::HashMap;
use std::sync::Arc;

use freightnet_core::{DomainError, DomainResult, DriverId, ProductId, QueueEntryId, ShipmentId, WarehouseId};
use freightnet_dockqueue::{queue_order, QueueEntry};
use freightnet_ledger::LedgerEntry;
use freightnet_registry::{Driver, Product, Warehouse};
use freightnet_shipments::Shipment;
use freightnet_stock::StockRecord;

pub use in_memory::InMemoryStore;

/// Every record collection the engine touches.
///
/// Shipments own their items and legs inline; stock, queue entries, and
/// ledger entries reference other records by id only. The ledger is
/// append-only, so it is a vector in posting order.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub products: HashMap<ProductId, Product>,
    pub warehouses: HashMap<WarehouseId, Warehouse>,
    pub drivers: HashMap<DriverId, Driver>,
    pub stock: HashMap<(ProductId, WarehouseId), StockRecord>,
    pub shipments: HashMap<ShipmentId, Shipment>,
    pub queue: HashMap<QueueEntryId, QueueEntry>,
    pub ledger: Vec<LedgerEntry>,
}

impl Tables {
    pub fn product(&self, id: ProductId) -> DomainResult<&Product> {
        self.products
            .get(&id)
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    pub fn warehouse(&self, id: WarehouseId) -> DomainResult<&Warehouse> {
        self.warehouses
            .get(&id)
            .ok_or_else(|| DomainError::not_found("warehouse", id))
    }

    pub fn driver(&self, id: DriverId) -> DomainResult<&Driver> {
        self.drivers
            .get(&id)
            .ok_or_else(|| DomainError::not_found("driver", id))
    }

    pub fn driver_mut(&mut self, id: DriverId) -> DomainResult<&mut Driver> {
        self.drivers
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("driver", id))
    }

    pub fn shipment(&self, id: ShipmentId) -> DomainResult<&Shipment> {
        self.shipments
            .get(&id)
            .ok_or_else(|| DomainError::not_found("shipment", id))
    }

    pub fn shipment_mut(&mut self, id: ShipmentId) -> DomainResult<&mut Shipment> {
        self.shipments
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("shipment", id))
    }

    pub fn shipment_by_tracking(&self, tracking_number: &str) -> DomainResult<&Shipment> {
        self.shipments
            .values()
            .find(|s| s.tracking_number() == tracking_number)
            .ok_or_else(|| DomainError::not_found("shipment with tracking number", tracking_number))
    }

    /// Insert a new shipment, enforcing tracking-number uniqueness.
    pub fn insert_shipment(&mut self, shipment: Shipment) -> DomainResult<()> {
        if self
            .shipments
            .values()
            .any(|s| s.tracking_number() == shipment.tracking_number())
        {
            return Err(DomainError::duplicate_entry(format!(
                "tracking number {}",
                shipment.tracking_number()
            )));
        }
        self.shipments.insert(shipment.id_typed(), shipment);
        Ok(())
    }

    pub fn queue_entry(&self, id: QueueEntryId) -> DomainResult<&QueueEntry> {
        self.queue
            .get(&id)
            .ok_or_else(|| DomainError::not_found("queue entry", id))
    }

    pub fn queue_entry_mut(&mut self, id: QueueEntryId) -> DomainResult<&mut QueueEntry> {
        self.queue
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("queue entry", id))
    }

    /// Queue entries for one warehouse in dock service order.
    pub fn queue_for_warehouse(&self, warehouse_id: WarehouseId) -> Vec<&QueueEntry> {
        let mut entries: Vec<&QueueEntry> = self
            .queue
            .values()
            .filter(|e| e.warehouse_id == warehouse_id)
            .collect();
        entries.sort_by(|a, b| queue_order(a, b));
        entries
    }

    pub fn stock(&self, product_id: ProductId, warehouse_id: WarehouseId) -> Option<&StockRecord> {
        self.stock.get(&(product_id, warehouse_id))
    }

    pub fn stock_mut(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> DomainResult<&mut StockRecord> {
        self.stock.get_mut(&(product_id, warehouse_id)).ok_or_else(|| {
            DomainError::not_found(
                "stock record for product",
                format!("{product_id} at warehouse {warehouse_id}"),
            )
        })
    }

    /// The lazily-created record for arriving goods.
    pub fn stock_entry(
        &mut self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> &mut StockRecord {
        self.stock
            .entry((product_id, warehouse_id))
            .or_insert_with(|| StockRecord::new(product_id, warehouse_id))
    }

    /// Completed-and-pending ledger history for one driver, in posting order.
    pub fn ledger_for_driver(
        &self,
        driver_id: DriverId,
    ) -> impl Iterator<Item = &LedgerEntry> {
        self.ledger.iter().filter(move |e| e.driver_id() == driver_id)
    }
}

/// Atomic access to the record tables.
///
/// `write` must be all-or-nothing: when the closure fails, no mutation it
/// made may become visible. Implementations decide how (copy-swap here,
/// database transactions in a persistent store).
pub trait RecordStore {
    fn read<T>(&self, f: impl FnOnce(&Tables) -> DomainResult<T>) -> DomainResult<T>;

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> DomainResult<T>) -> DomainResult<T>;
}

impl<S: RecordStore> RecordStore for &S {
    fn read<T>(&self, f: impl FnOnce(&Tables) -> DomainResult<T>) -> DomainResult<T> {
        (**self).read(f)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> DomainResult<T>) -> DomainResult<T> {
        (**self).write(f)
    }
}

impl<S: RecordStore> RecordStore for Arc<S> {
    fn read<T>(&self, f: impl FnOnce(&Tables) -> DomainResult<T>) -> DomainResult<T> {
        (**self).read(f)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> DomainResult<T>) -> DomainResult<T> {
        (**self).write(f)
    }
}
