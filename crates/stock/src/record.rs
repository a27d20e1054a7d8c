use serde::{Deserialize, Serialize};

use freightnet_core::{DomainError, DomainResult, ProductId, WarehouseId};

/// Stock bookkeeping for one product at one warehouse.
///
/// Invariant: `available == quantity - reserved` after every mutation, and
/// both counters stay non-negative. `available` is always recomputed from the
/// other two, never set directly.
///
/// Records are created lazily the first time stock arrives at a warehouse and
/// are never deleted, only zeroed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    product_id: ProductId,
    warehouse_id: WarehouseId,
    quantity: i64,
    reserved: i64,
    available: i64,
}

impl StockRecord {
    /// Fresh record with all counters at zero.
    pub fn new(product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            product_id,
            warehouse_id,
            quantity: 0,
            reserved: 0,
            available: 0,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    /// Physical on-hand quantity.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Quantity committed to open shipments but not yet removed.
    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    /// Free-to-promise quantity.
    pub fn available(&self) -> i64 {
        self.available
    }

    /// Goods arriving at the warehouse, not yet reserved.
    pub fn receive(&mut self, qty: i64) -> DomainResult<()> {
        check_positive(qty)?;
        self.quantity += qty;
        self.recompute();
        Ok(())
    }

    /// Commit available stock to a shipment.
    pub fn reserve(&mut self, qty: i64) -> DomainResult<()> {
        check_positive(qty)?;
        if self.available < qty {
            return Err(DomainError::insufficient_stock(format!(
                "product {} at warehouse {}: available {}, requested {}",
                self.product_id, self.warehouse_id, self.available, qty
            )));
        }
        self.reserved += qty;
        self.recompute();
        Ok(())
    }

    /// Undo a reservation without touching on-hand stock.
    ///
    /// Releasing more than is reserved fails rather than clamping at zero.
    pub fn release(&mut self, qty: i64) -> DomainResult<()> {
        check_positive(qty)?;
        if self.reserved < qty {
            return Err(DomainError::insufficient_stock(format!(
                "product {} at warehouse {}: reserved {}, release of {} requested",
                self.product_id, self.warehouse_id, self.reserved, qty
            )));
        }
        self.reserved -= qty;
        self.recompute();
        Ok(())
    }

    /// Physically remove previously reserved stock.
    pub fn consume(&mut self, qty: i64) -> DomainResult<()> {
        check_positive(qty)?;
        if self.reserved < qty {
            return Err(DomainError::insufficient_stock(format!(
                "product {} at warehouse {}: reserved {}, consume of {} requested",
                self.product_id, self.warehouse_id, self.reserved, qty
            )));
        }
        self.quantity -= qty;
        self.reserved -= qty;
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        self.available = self.quantity - self.reserved;
    }
}

fn check_positive(qty: i64) -> DomainResult<()> {
    if qty <= 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}
