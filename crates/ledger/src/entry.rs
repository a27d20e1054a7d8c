use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freightnet_core::token::random_token;
use freightnet_core::{DomainError, DomainResult, DriverId, Entity, EntryId, ShipmentId};

/// Ledger entry kind. Payments and refunds credit by convention (positive
/// amounts); expenses and adjustments debit (negative amounts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Payment,
    Expense,
    Refund,
    Adjustment,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Payment => "payment",
            EntryType::Expense => "expense",
            EntryType::Refund => "refund",
            EntryType::Adjustment => "adjustment",
        }
    }

    /// Debit-side types are blocked from driving a balance negative;
    /// payments and refunds never are.
    pub fn is_balance_guarded(self) -> bool {
        matches!(self, EntryType::Expense | EntryType::Adjustment)
    }
}

impl core::fmt::Display for EntryType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

/// One immutable ledger entry. `balance_before`/`balance_after` snapshot the
/// driver balance around the posting; `balance_after - balance_before ==
/// amount` always, and the driver record is updated to `balance_after` in
/// the same store transaction that appends the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: EntryId,
    driver_id: DriverId,
    shipment_id: Option<ShipmentId>,
    entry_type: EntryType,
    status: EntryStatus,
    amount: i64,
    balance_before: i64,
    balance_after: i64,
    description: Option<String>,
    reference: String,
    posted_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Post a completed entry against the given running balance.
    ///
    /// Fails with `InsufficientBalance` when a guarded type (expense,
    /// adjustment) would leave the balance negative. Zero amounts are
    /// meaningless on an append-only ledger and are rejected.
    #[allow(clippy::too_many_arguments)]
    pub fn post(
        id: EntryId,
        driver_id: DriverId,
        shipment_id: Option<ShipmentId>,
        entry_type: EntryType,
        amount: i64,
        balance_before: i64,
        description: Option<String>,
        reference: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if amount == 0 {
            return Err(DomainError::validation("entry amount cannot be zero"));
        }
        let balance_after = balance_before + amount;
        if balance_after < 0 && entry_type.is_balance_guarded() {
            return Err(DomainError::insufficient_balance(format!(
                "driver {}: balance {}, required {}",
                driver_id,
                balance_before,
                amount.abs()
            )));
        }
        Ok(Self {
            id,
            driver_id,
            shipment_id,
            entry_type,
            status: EntryStatus::Completed,
            amount,
            balance_before,
            balance_after,
            description,
            reference,
            posted_at: now,
        })
    }

    pub fn id_typed(&self) -> EntryId {
        self.id
    }

    pub fn driver_id(&self) -> DriverId {
        self.driver_id
    }

    pub fn shipment_id(&self) -> Option<ShipmentId> {
        self.shipment_id
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn balance_before(&self) -> i64 {
        self.balance_before
    }

    pub fn balance_after(&self) -> i64 {
        self.balance_after
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn posted_at(&self) -> DateTime<Utc> {
        self.posted_at
    }
}

impl Entity for LedgerEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Machine-generated ledger reference: `TXN-<unix millis>-<9 chars>`.
pub fn generate_reference(now: DateTime<Utc>) -> String {
    format!("TXN-{}-{}", now.timestamp_millis(), random_token(9))
}

/// Driver balance cross-check, recomputed from completed history.
///
/// The stored running balance on the driver record stays authoritative for
/// new postings; this report exists to surface drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    pub driver_id: DriverId,
    /// The stored running balance.
    pub balance: i64,
    /// Sum of completed entry amounts; should always equal `balance`.
    pub recomputed_balance: i64,
    /// Positive payment/refund amounts.
    pub total_earnings: i64,
    /// Absolute value of negative expense amounts.
    pub total_expenses: i64,
    pub entry_count: usize,
}

impl BalanceReport {
    pub fn from_history<'a, I>(driver_id: DriverId, balance: i64, entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        let mut recomputed_balance = 0;
        let mut total_earnings = 0;
        let mut total_expenses = 0;
        let mut entry_count = 0;

        for entry in entries {
            if entry.status() != EntryStatus::Completed {
                continue;
            }
            entry_count += 1;
            recomputed_balance += entry.amount();
            match entry.entry_type() {
                EntryType::Payment | EntryType::Refund if entry.amount() > 0 => {
                    total_earnings += entry.amount();
                }
                EntryType::Expense if entry.amount() < 0 => {
                    total_expenses += entry.amount().abs();
                }
                _ => {}
            }
        }

        Self {
            driver_id,
            balance,
            recomputed_balance,
            total_earnings,
            total_expenses,
            entry_count,
        }
    }

    pub fn is_reconciled(&self) -> bool {
        self.balance == self.recomputed_balance
    }
}
