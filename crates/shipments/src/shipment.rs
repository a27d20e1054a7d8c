use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freightnet_core::{DomainError, DomainResult, DriverId, Entity, ProductId, ShipmentId, WarehouseId};

use crate::leg::{LegStatus, NewLeg, ShipmentLeg};

/// Shipment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    Queued,
    Loading,
    InTransit,
    AtWarehouse,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::Queued => "queued",
            ShipmentStatus::Loading => "loading",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::AtWarehouse => "at_warehouse",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    /// Legal transitions. The chain is driven by the queue scheduler and leg
    /// completion, not by direct user choice; cancellation is open from any
    /// non-terminal state, and a queued shipment may fall back to pending
    /// when its queue entry is cancelled.
    pub fn can_transition(self, to: ShipmentStatus) -> bool {
        if to == ShipmentStatus::Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, to),
            (ShipmentStatus::Pending, ShipmentStatus::Queued)
                | (ShipmentStatus::Queued, ShipmentStatus::Loading)
                | (ShipmentStatus::Queued, ShipmentStatus::Pending)
                | (ShipmentStatus::Loading, ShipmentStatus::InTransit)
                | (ShipmentStatus::InTransit, ShipmentStatus::AtWarehouse)
                | (ShipmentStatus::InTransit, ShipmentStatus::Delivered)
                | (ShipmentStatus::AtWarehouse, ShipmentStatus::InTransit)
                | (ShipmentStatus::AtWarehouse, ShipmentStatus::Delivered)
        )
    }
}

impl core::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One shipment line: product, quantity, and the unit price snapshotted at
/// creation time (immune to later catalog price changes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
}

impl ShipmentItem {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: i64) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("item quantity must be positive"));
        }
        Ok(Self {
            product_id,
            quantity,
            unit_price,
            total_price: unit_price * quantity,
        })
    }
}

/// Optional delivery metadata supplied at creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDetails {
    pub destination_address: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub scheduled_pickup_date: Option<DateTime<Utc>>,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
}

/// Outcome of a leg transition, for the caller to act on (logging, follow-up
/// queries). The cascade itself already happened inside the shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegCascade {
    /// Nothing beyond the leg itself changed.
    None,
    /// The completed leg advanced the next leg (by sequence) into transit.
    NextLegStarted(u32),
    /// The last leg completed and the shipment is now delivered.
    ShipmentDelivered,
}

/// A warehouse-to-warehouse (or warehouse-to-address) shipment.
///
/// Owns its items and legs; every other relation is by id. Cancellation is a
/// status, never a deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    id: ShipmentId,
    tracking_number: String,
    pub origin_warehouse_id: WarehouseId,
    pub destination_warehouse_id: Option<WarehouseId>,
    driver_id: Option<DriverId>,
    status: ShipmentStatus,
    pub details: ShipmentDetails,
    total_weight: i64,
    total_value: i64,
    driver_payment: Option<i64>,
    fuel_cost: Option<i64>,
    other_expenses: Option<i64>,
    company_profit: Option<i64>,
    actual_pickup_date: Option<DateTime<Utc>>,
    actual_delivery_date: Option<DateTime<Utc>>,
    is_multi_leg: bool,
    items: Vec<ShipmentItem>,
    legs: Vec<ShipmentLeg>,
    created_at: DateTime<Utc>,
}

impl Shipment {
    /// Assemble a new shipment in `Pending` with its items and legs.
    ///
    /// Totals are computed here: value from the snapshotted line totals,
    /// weight as the summed quantity (one unit weighs one unit; no
    /// per-product weight exists).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ShipmentId,
        tracking_number: String,
        origin_warehouse_id: WarehouseId,
        destination_warehouse_id: Option<WarehouseId>,
        driver_id: Option<DriverId>,
        details: ShipmentDetails,
        items: Vec<ShipmentItem>,
        legs: Vec<NewLeg>,
        multi_leg: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation(
                "shipment must carry at least one item",
            ));
        }
        let total_value = items.iter().map(|i| i.total_price).sum();
        let total_weight = items.iter().map(|i| i.quantity).sum();
        let is_multi_leg = multi_leg || !legs.is_empty();
        Ok(Self {
            id,
            tracking_number,
            origin_warehouse_id,
            destination_warehouse_id,
            driver_id,
            status: ShipmentStatus::Pending,
            details,
            total_weight,
            total_value,
            driver_payment: None,
            fuel_cost: None,
            other_expenses: None,
            company_profit: None,
            actual_pickup_date: None,
            actual_delivery_date: None,
            is_multi_leg,
            items,
            legs: legs.into_iter().map(ShipmentLeg::from_request).collect(),
            created_at: now,
        })
    }

    pub fn id_typed(&self) -> ShipmentId {
        self.id
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn driver_id(&self) -> Option<DriverId> {
        self.driver_id
    }

    pub fn total_value(&self) -> i64 {
        self.total_value
    }

    pub fn total_weight(&self) -> i64 {
        self.total_weight
    }

    pub fn driver_payment(&self) -> Option<i64> {
        self.driver_payment
    }

    pub fn fuel_cost(&self) -> Option<i64> {
        self.fuel_cost
    }

    pub fn other_expenses(&self) -> Option<i64> {
        self.other_expenses
    }

    pub fn company_profit(&self) -> Option<i64> {
        self.company_profit
    }

    pub fn actual_pickup_date(&self) -> Option<DateTime<Utc>> {
        self.actual_pickup_date
    }

    pub fn actual_delivery_date(&self) -> Option<DateTime<Utc>> {
        self.actual_delivery_date
    }

    pub fn is_multi_leg(&self) -> bool {
        self.is_multi_leg
    }

    pub fn items(&self) -> &[ShipmentItem] {
        &self.items
    }

    pub fn legs(&self) -> &[ShipmentLeg] {
        &self.legs
    }

    pub fn leg(&self, sequence: u32) -> Option<&ShipmentLeg> {
        self.legs.iter().find(|l| l.sequence == sequence)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_settled(&self) -> bool {
        self.driver_payment.is_some()
    }

    /// Record the driver on the shipment. Availability checks happen in the
    /// engine, which sees the driver record.
    pub fn assign_driver(&mut self, driver_id: DriverId) {
        self.driver_id = Some(driver_id);
    }

    /// Checked status transition with timestamp stamping. Re-entering the
    /// current status is a no-op and never restamps.
    pub fn set_status(&mut self, to: ShipmentStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if to == self.status {
            return Ok(());
        }
        if !self.status.can_transition(to) {
            return Err(DomainError::invalid_state(format!(
                "shipment {}: cannot move from {} to {}",
                self.id, self.status, to
            )));
        }
        self.enter(to, now);
        Ok(())
    }

    /// Unchecked status overwrite: the operator escape hatch behind the
    /// status-override endpoint. Stamps the same timestamps as the checked
    /// path so forced corrections still leave a coherent record.
    pub fn force_status(&mut self, to: ShipmentStatus, now: DateTime<Utc>) {
        if to != self.status {
            self.enter(to, now);
        }
    }

    fn enter(&mut self, to: ShipmentStatus, now: DateTime<Utc>) {
        self.status = to;
        match to {
            ShipmentStatus::Loading => {
                self.actual_pickup_date.get_or_insert(now);
            }
            ShipmentStatus::InTransit => {
                self.actual_pickup_date.get_or_insert(now);
                if self.is_multi_leg {
                    if let Some(first) = self.legs.iter_mut().find(|l| l.sequence == 1) {
                        if first.status() == LegStatus::Pending {
                            // Pending -> InTransit is always legal for a leg.
                            let _ = first.set_status(LegStatus::InTransit, now);
                        }
                    }
                }
            }
            ShipmentStatus::Delivered => {
                self.actual_delivery_date.get_or_insert(now);
            }
            _ => {}
        }
    }

    /// Drive one leg through its machine and apply the completion cascade:
    /// completing leg N advances leg N+1 out of pending, and completing the
    /// last leg delivers the whole shipment. The caller persists the shipment
    /// once, so the cascade commits or fails as a unit.
    pub fn transition_leg(
        &mut self,
        sequence: u32,
        to: LegStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<LegCascade> {
        let leg = self
            .legs
            .iter_mut()
            .find(|l| l.sequence == sequence)
            .ok_or_else(|| {
                DomainError::not_found("leg", format!("{} of shipment {}", sequence, self.id))
            })?;
        let was = leg.status();
        leg.set_status(to, now)?;
        if to != LegStatus::Completed || was == LegStatus::Completed {
            return Ok(LegCascade::None);
        }

        if let Some(next) = self.legs.iter_mut().find(|l| l.sequence == sequence + 1) {
            if next.status() == LegStatus::Pending {
                next.set_status(LegStatus::InTransit, now)?;
                return Ok(LegCascade::NextLegStarted(sequence + 1));
            }
            return Ok(LegCascade::None);
        }

        // Last leg: the shipment is home.
        self.enter(ShipmentStatus::Delivered, now);
        Ok(LegCascade::ShipmentDelivered)
    }

    /// Persist settlement figures computed by the financial ledger. Legal
    /// exactly once, on a delivered shipment.
    pub fn apply_settlement(
        &mut self,
        driver_payment: i64,
        fuel_cost: i64,
        other_expenses: i64,
        company_profit: i64,
    ) -> DomainResult<()> {
        if self.status != ShipmentStatus::Delivered {
            return Err(DomainError::invalid_state(format!(
                "shipment {}: settlement requires delivered status, current {}",
                self.id, self.status
            )));
        }
        if self.is_settled() {
            return Err(DomainError::invalid_state(format!(
                "shipment {}: already settled",
                self.id
            )));
        }
        self.driver_payment = Some(driver_payment);
        self.fuel_cost = Some(fuel_cost);
        self.other_expenses = Some(other_expenses);
        self.company_profit = Some(company_profit);
        Ok(())
    }
}

impl Entity for Shipment {
    type Id = ShipmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
