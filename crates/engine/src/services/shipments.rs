use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use freightnet_core::{DomainError, DomainResult, DriverId, ProductId, ShipmentId, WarehouseId};
use freightnet_registry::DriverStatus;
use freightnet_shipments::{
    generate_tracking_number, LegCascade, LegStatus, NewLeg, Shipment, ShipmentDetails,
    ShipmentItem, ShipmentLeg, ShipmentStatus,
};

use crate::record_store::RecordStore;

/// One requested shipment line. Price is snapshotted from the catalog at
/// creation, not taken from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct NewShipmentItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Validated creation request handed over by the API layer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewShipment {
    pub origin_warehouse_id: WarehouseId,
    pub destination_warehouse_id: Option<WarehouseId>,
    pub driver_id: Option<DriverId>,
    #[serde(default)]
    pub details: ShipmentDetails,
    pub items: Vec<NewShipmentItem>,
    #[serde(default)]
    pub legs: Vec<NewLeg>,
    #[serde(default)]
    pub is_multi_leg: bool,
}

/// Shipment lifecycle operations.
pub struct ShipmentService<S> {
    store: S,
}

impl<S: RecordStore> ShipmentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a shipment in `Pending`, snapshotting unit prices and
    /// reserving origin stock for every item, atomically: a failure on any
    /// item leaves no reservation and no shipment behind.
    pub fn create(&self, req: NewShipment) -> DomainResult<Shipment> {
        let shipment = self.store.write(|t| {
            t.warehouse(req.origin_warehouse_id)?;
            if let Some(dest) = req.destination_warehouse_id {
                t.warehouse(dest)?;
            }
            if let Some(driver_id) = req.driver_id {
                t.driver(driver_id)?;
            }

            let mut items = Vec::with_capacity(req.items.len());
            for line in &req.items {
                let product = t.product(line.product_id)?;
                let available = t
                    .stock(line.product_id, req.origin_warehouse_id)
                    .map(|s| s.available())
                    .unwrap_or(0);
                if available < line.quantity {
                    return Err(DomainError::insufficient_stock(format!(
                        "product {} at warehouse {}: available {}, requested {}",
                        product.sku, req.origin_warehouse_id, available, line.quantity
                    )));
                }
                items.push(ShipmentItem::new(
                    line.product_id,
                    line.quantity,
                    product.unit_price,
                )?);
            }

            let now = Utc::now();
            let shipment = Shipment::new(
                ShipmentId::new(),
                generate_tracking_number(now),
                req.origin_warehouse_id,
                req.destination_warehouse_id,
                req.driver_id,
                req.details.clone(),
                items,
                req.legs.clone(),
                req.is_multi_leg,
                now,
            )?;

            for item in shipment.items() {
                t.stock_mut(item.product_id, req.origin_warehouse_id)?
                    .reserve(item.quantity)?;
            }

            let out = shipment.clone();
            t.insert_shipment(shipment)?;
            Ok(out)
        })?;
        info!(
            shipment_id = %shipment.id_typed(),
            tracking = shipment.tracking_number(),
            total_value = shipment.total_value(),
            items = shipment.items().len(),
            "shipment created"
        );
        Ok(shipment)
    }

    /// List shipments, optionally filtered by status and driver, newest
    /// first.
    pub fn shipments(
        &self,
        status: Option<ShipmentStatus>,
        driver_id: Option<DriverId>,
    ) -> DomainResult<Vec<Shipment>> {
        self.store.read(|t| {
            let mut out: Vec<Shipment> = t
                .shipments
                .values()
                .filter(|s| status.is_none_or(|wanted| s.status() == wanted))
                .filter(|s| driver_id.is_none_or(|d| s.driver_id() == Some(d)))
                .cloned()
                .collect();
            out.sort_by(|a, b| {
                b.created_at()
                    .cmp(&a.created_at())
                    .then_with(|| b.id_typed().cmp(&a.id_typed()))
            });
            Ok(out)
        })
    }

    pub fn shipment(&self, id: ShipmentId) -> DomainResult<Shipment> {
        self.store.read(|t| Ok(t.shipment(id)?.clone()))
    }

    pub fn by_tracking_number(&self, tracking_number: &str) -> DomainResult<Shipment> {
        self.store
            .read(|t| Ok(t.shipment_by_tracking(tracking_number)?.clone()))
    }

    /// Checked status transition (stamps pickup/delivery dates on entry).
    pub fn update_status(
        &self,
        id: ShipmentId,
        status: ShipmentStatus,
    ) -> DomainResult<Shipment> {
        let shipment = self.store.write(|t| {
            let shipment = t.shipment_mut(id)?;
            shipment.set_status(status, Utc::now())?;
            Ok(shipment.clone())
        })?;
        info!(shipment_id = %id, status = %shipment.status(), "shipment status updated");
        Ok(shipment)
    }

    /// Unchecked override. Deliberate escape hatch for operators correcting
    /// reality; the transition table is bypassed, stamping still applies.
    pub fn force_status(&self, id: ShipmentId, status: ShipmentStatus) -> DomainResult<Shipment> {
        let shipment = self.store.write(|t| {
            let shipment = t.shipment_mut(id)?;
            shipment.force_status(status, Utc::now());
            Ok(shipment.clone())
        })?;
        warn!(shipment_id = %id, status = %shipment.status(), "shipment status forced");
        Ok(shipment)
    }

    /// Drive one leg through its machine. Completing a leg advances the next
    /// one, or delivers the shipment when it was the last, in the same
    /// transaction.
    pub fn update_leg_status(
        &self,
        shipment_id: ShipmentId,
        sequence: u32,
        status: LegStatus,
    ) -> DomainResult<(ShipmentLeg, LegCascade)> {
        let (leg, cascade) = self.store.write(|t| {
            let shipment = t.shipment_mut(shipment_id)?;
            let cascade = shipment.transition_leg(sequence, status, Utc::now())?;
            let leg = shipment.leg(sequence).cloned().ok_or_else(|| {
                DomainError::not_found("leg", format!("{sequence} of shipment {shipment_id}"))
            })?;
            Ok((leg, cascade))
        })?;
        match cascade {
            LegCascade::NextLegStarted(next) => {
                info!(%shipment_id, sequence, next, "leg completed, next leg in transit");
            }
            LegCascade::ShipmentDelivered => {
                info!(%shipment_id, sequence, "final leg completed, shipment delivered");
            }
            LegCascade::None => {
                info!(%shipment_id, sequence, status = %leg.status(), "leg status updated");
            }
        }
        Ok((leg, cascade))
    }

    /// Put an available driver on the shipment; the driver goes on-route in
    /// the same transaction.
    pub fn assign_driver(
        &self,
        shipment_id: ShipmentId,
        driver_id: DriverId,
    ) -> DomainResult<Shipment> {
        let shipment = self.store.write(|t| {
            t.shipment(shipment_id)?;
            let driver = t.driver(driver_id)?;
            if !driver.is_available() {
                return Err(DomainError::driver_unavailable(format!(
                    "driver {} is {}",
                    driver.full_name(),
                    driver.status()
                )));
            }
            t.driver_mut(driver_id)?.set_status(DriverStatus::OnRoute);
            let shipment = t.shipment_mut(shipment_id)?;
            shipment.assign_driver(driver_id);
            Ok(shipment.clone())
        })?;
        info!(%shipment_id, %driver_id, "driver assigned");
        Ok(shipment)
    }

    /// Physically move the shipment's goods into a warehouse mid-route:
    /// consume the reserved quantities at the origin and credit the same
    /// quantities to the destination, creating its stock records as needed.
    /// Atomic across all items and both warehouses.
    pub fn unload_at_warehouse(
        &self,
        shipment_id: ShipmentId,
        warehouse_id: WarehouseId,
    ) -> DomainResult<()> {
        self.store.write(|t| {
            t.warehouse(warehouse_id)?;
            let (origin, items) = {
                let shipment = t.shipment(shipment_id)?;
                (shipment.origin_warehouse_id, shipment.items().to_vec())
            };
            for item in &items {
                t.stock_mut(item.product_id, origin)?.consume(item.quantity)?;
                t.stock_entry(item.product_id, warehouse_id)
                    .receive(item.quantity)?;
            }
            Ok(())
        })?;
        info!(%shipment_id, %warehouse_id, "shipment unloaded at warehouse");
        Ok(())
    }
}
