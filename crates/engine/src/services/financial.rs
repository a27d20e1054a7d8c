use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use freightnet_core::{DomainError, DomainResult, DriverId, EntryId, ShipmentId};
use freightnet_ledger::{
    generate_reference, BalanceReport, EntryType, LedgerEntry, Settlement,
};
use freightnet_shipments::{Shipment, ShipmentStatus};

use crate::record_store::RecordStore;

/// Everything a settlement produced: the updated shipment, the payment
/// entry, and the expense entry when expenses were charged.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub shipment: Shipment,
    pub payment: LedgerEntry,
    pub expense: Option<LedgerEntry>,
}

/// Company-level totals over delivered shipments. Shipments never settled
/// contribute zero to every financial sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyFinancialReport {
    pub total_revenue: i64,
    pub total_driver_payments: i64,
    pub total_expenses: i64,
    pub total_profit: i64,
    pub shipment_count: usize,
}

/// Ledger postings and settlement.
pub struct FinancialService<S> {
    store: S,
}

impl<S: RecordStore> FinancialService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Convert a delivered shipment into money movements: pay the driver 65%
    /// of the shipment value, charge back fuel and other expenses off the
    /// post-payment balance, persist the figures on the shipment, all in one
    /// transaction.
    pub fn settle(
        &self,
        shipment_id: ShipmentId,
        fuel_cost: i64,
        other_expenses: i64,
    ) -> DomainResult<SettlementOutcome> {
        let outcome = self.store.write(|t| {
            let (driver_id, total_value, tracking) = {
                let shipment = t.shipment(shipment_id)?;
                if shipment.status() != ShipmentStatus::Delivered {
                    return Err(DomainError::invalid_state(format!(
                        "shipment {}: settlement requires delivered status, current {}",
                        shipment_id,
                        shipment.status()
                    )));
                }
                if shipment.is_settled() {
                    return Err(DomainError::invalid_state(format!(
                        "shipment {shipment_id}: already settled"
                    )));
                }
                let driver_id = shipment
                    .driver_id()
                    .ok_or_else(|| DomainError::missing_driver(format!("shipment {shipment_id}")))?;
                (
                    driver_id,
                    shipment.total_value(),
                    shipment.tracking_number().to_string(),
                )
            };

            let balance = t.driver(driver_id)?.balance();
            let settlement = Settlement::compute(total_value, fuel_cost, other_expenses)?;
            let now = Utc::now();

            let payment = LedgerEntry::post(
                EntryId::new(),
                driver_id,
                Some(shipment_id),
                EntryType::Payment,
                settlement.driver_payment,
                balance,
                Some(format!("Payment for shipment {tracking}")),
                format!("PAY-{tracking}"),
                now,
            )?;
            let mut new_balance = payment.balance_after();

            let expense = if settlement.combined_expenses() > 0 {
                let entry = LedgerEntry::post(
                    EntryId::new(),
                    driver_id,
                    Some(shipment_id),
                    EntryType::Expense,
                    -settlement.combined_expenses(),
                    new_balance,
                    Some(format!(
                        "Expenses for shipment {tracking}: fuel {}, other {}",
                        settlement.fuel_cost, settlement.other_expenses
                    )),
                    format!("EXP-{tracking}"),
                    now,
                )?;
                new_balance = entry.balance_after();
                Some(entry)
            } else {
                None
            };

            t.shipment_mut(shipment_id)?.apply_settlement(
                settlement.driver_payment,
                settlement.fuel_cost,
                settlement.other_expenses,
                settlement.company_profit,
            )?;
            t.driver_mut(driver_id)?.set_balance(new_balance);
            t.ledger.push(payment.clone());
            if let Some(entry) = &expense {
                t.ledger.push(entry.clone());
            }

            Ok(SettlementOutcome {
                shipment: t.shipment(shipment_id)?.clone(),
                payment,
                expense,
            })
        })?;
        info!(
            %shipment_id,
            driver_payment = outcome.payment.amount(),
            company_profit = outcome.shipment.company_profit().unwrap_or(0),
            "shipment settled"
        );
        Ok(outcome)
    }

    /// Post one ledger entry and move the driver balance with it. Amount
    /// sign follows the caller's convention: payments/refunds positive,
    /// expenses/adjustments negative.
    pub fn create_transaction(
        &self,
        driver_id: DriverId,
        entry_type: EntryType,
        amount: i64,
        description: Option<String>,
        shipment_id: Option<ShipmentId>,
    ) -> DomainResult<LedgerEntry> {
        let entry = self.store.write(|t| {
            let balance = t.driver(driver_id)?.balance();
            if let Some(id) = shipment_id {
                t.shipment(id)?;
            }
            let now = Utc::now();
            let entry = LedgerEntry::post(
                EntryId::new(),
                driver_id,
                shipment_id,
                entry_type,
                amount,
                balance,
                description,
                generate_reference(now),
                now,
            )?;
            t.driver_mut(driver_id)?.set_balance(entry.balance_after());
            t.ledger.push(entry.clone());
            Ok(entry)
        })?;
        info!(
            %driver_id,
            entry_type = %entry.entry_type(),
            amount = entry.amount(),
            balance_after = entry.balance_after(),
            "ledger entry posted"
        );
        Ok(entry)
    }

    /// A driver's entries, newest first, optionally filtered by type.
    /// Defaults to the 50 most recent.
    pub fn driver_transactions(
        &self,
        driver_id: DriverId,
        entry_type: Option<EntryType>,
        limit: Option<usize>,
    ) -> DomainResult<Vec<LedgerEntry>> {
        self.store.read(|t| {
            t.driver(driver_id)?;
            let mut entries: Vec<LedgerEntry> = t
                .ledger_for_driver(driver_id)
                .filter(|e| entry_type.is_none_or(|wanted| e.entry_type() == wanted))
                .cloned()
                .collect();
            entries.reverse();
            entries.truncate(limit.unwrap_or(50));
            Ok(entries)
        })
    }

    /// The stored balance next to the totals recomputed from completed
    /// history: the drift cross-check, not the posting authority.
    pub fn driver_balance(&self, driver_id: DriverId) -> DomainResult<BalanceReport> {
        self.store.read(|t| {
            let driver = t.driver(driver_id)?;
            Ok(BalanceReport::from_history(
                driver_id,
                driver.balance(),
                t.ledger_for_driver(driver_id),
            ))
        })
    }

    /// Totals over delivered shipments, optionally bounded by actual
    /// delivery date. With a bound set, shipments missing the date are
    /// excluded.
    pub fn company_report(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DomainResult<CompanyFinancialReport> {
        self.store.read(|t| {
            let mut report = CompanyFinancialReport {
                total_revenue: 0,
                total_driver_payments: 0,
                total_expenses: 0,
                total_profit: 0,
                shipment_count: 0,
            };
            for shipment in t.shipments.values() {
                if shipment.status() != ShipmentStatus::Delivered {
                    continue;
                }
                if start.is_some() || end.is_some() {
                    let Some(delivered_at) = shipment.actual_delivery_date() else {
                        continue;
                    };
                    if start.is_some_and(|bound| delivered_at < bound)
                        || end.is_some_and(|bound| delivered_at > bound)
                    {
                        continue;
                    }
                }
                report.shipment_count += 1;
                report.total_revenue += shipment.total_value();
                report.total_driver_payments += shipment.driver_payment().unwrap_or(0);
                report.total_expenses += shipment.fuel_cost().unwrap_or(0)
                    + shipment.other_expenses().unwrap_or(0);
                report.total_profit += shipment.company_profit().unwrap_or(0);
            }
            Ok(report)
        })
    }
}
