use serde::Serialize;
use tracing::info;

use freightnet_core::{DomainResult, ProductId, WarehouseId};
use freightnet_stock::StockRecord;

use crate::record_store::RecordStore;

/// A product sitting at or below its low-stock threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockAlert {
    pub product_id: ProductId,
    pub sku: String,
    /// The warehouse the check was scoped to, if any.
    pub warehouse_id: Option<WarehouseId>,
    pub available: i64,
    pub threshold: i64,
}

/// Stock ledger operations.
///
/// All four mutations go through the lazily-created record for the
/// (product, warehouse) pair; when an operation fails, the transaction
/// rollback also discards any record the lookup created.
pub struct StockService<S> {
    store: S,
}

impl<S: RecordStore> StockService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Goods arriving at a warehouse. Creates the stock record on first use.
    pub fn receive(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i64,
    ) -> DomainResult<StockRecord> {
        let record = self.store.write(|t| {
            t.product(product_id)?;
            t.warehouse(warehouse_id)?;
            let record = t.stock_entry(product_id, warehouse_id);
            record.receive(quantity)?;
            Ok(record.clone())
        })?;
        info!(
            %product_id,
            %warehouse_id,
            quantity,
            available = record.available(),
            "stock received"
        );
        Ok(record)
    }

    /// Commit available stock to a shipment.
    pub fn reserve(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i64,
    ) -> DomainResult<StockRecord> {
        let record = self.store.write(|t| {
            t.product(product_id)?;
            t.warehouse(warehouse_id)?;
            let record = t.stock_entry(product_id, warehouse_id);
            record.reserve(quantity)?;
            Ok(record.clone())
        })?;
        info!(%product_id, %warehouse_id, quantity, "stock reserved");
        Ok(record)
    }

    /// Return previously reserved stock to the available pool.
    pub fn release(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i64,
    ) -> DomainResult<StockRecord> {
        let record = self.store.write(|t| {
            t.product(product_id)?;
            t.warehouse(warehouse_id)?;
            let record = t.stock_entry(product_id, warehouse_id);
            record.release(quantity)?;
            Ok(record.clone())
        })?;
        info!(%product_id, %warehouse_id, quantity, "reserved stock released");
        Ok(record)
    }

    /// Physically remove previously reserved stock.
    pub fn consume(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i64,
    ) -> DomainResult<StockRecord> {
        let record = self.store.write(|t| {
            t.product(product_id)?;
            t.warehouse(warehouse_id)?;
            let record = t.stock_entry(product_id, warehouse_id);
            record.consume(quantity)?;
            Ok(record.clone())
        })?;
        info!(%product_id, %warehouse_id, quantity, "stock consumed");
        Ok(record)
    }

    pub fn stock_by_warehouse(&self, warehouse_id: WarehouseId) -> DomainResult<Vec<StockRecord>> {
        self.store.read(|t| {
            t.warehouse(warehouse_id)?;
            let mut records: Vec<StockRecord> = t
                .stock
                .values()
                .filter(|r| r.warehouse_id() == warehouse_id)
                .cloned()
                .collect();
            records.sort_by_key(|r| r.product_id());
            Ok(records)
        })
    }

    pub fn stock_by_product(&self, product_id: ProductId) -> DomainResult<Vec<StockRecord>> {
        self.store.read(|t| {
            t.product(product_id)?;
            let mut records: Vec<StockRecord> = t
                .stock
                .values()
                .filter(|r| r.product_id() == product_id)
                .cloned()
                .collect();
            records.sort_by_key(|r| r.warehouse_id());
            Ok(records)
        })
    }

    /// Active products whose available quantity (at one warehouse, or summed
    /// across all warehouses) is at or below their low-stock threshold.
    pub fn low_stock(&self, warehouse_id: Option<WarehouseId>) -> DomainResult<Vec<LowStockAlert>> {
        self.store.read(|t| {
            if let Some(w) = warehouse_id {
                t.warehouse(w)?;
            }
            let mut products: Vec<_> = t
                .products
                .values()
                .filter(|p| p.is_active && p.low_stock_threshold > 0)
                .collect();
            products.sort_by_key(|p| p.id);

            let mut alerts = Vec::new();
            for product in products {
                let available: i64 = t
                    .stock
                    .values()
                    .filter(|r| r.product_id() == product.id)
                    .filter(|r| warehouse_id.is_none_or(|w| r.warehouse_id() == w))
                    .map(|r| r.available())
                    .sum();
                if available <= product.low_stock_threshold {
                    alerts.push(LowStockAlert {
                        product_id: product.id,
                        sku: product.sku.clone(),
                        warehouse_id,
                        available,
                        threshold: product.low_stock_threshold,
                    });
                }
            }
            Ok(alerts)
        })
    }
}
