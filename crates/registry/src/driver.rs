use serde::{Deserialize, Serialize};

use freightnet_core::{DomainError, DomainResult, DriverId, Entity};

/// Driver position in the shipment lifecycle.
///
/// This field is driven by the engine (assignment, loading completion), not
/// managed independently; `set_status` stays unchecked only as the operator
/// escape hatch the dispatch desk uses to correct reality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Available,
    OnRoute,
    Loading,
    Unloading,
    OffDuty,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Available => "available",
            DriverStatus::OnRoute => "on_route",
            DriverStatus::Loading => "loading",
            DriverStatus::Unloading => "unloading",
            DriverStatus::OffDuty => "off_duty",
        }
    }
}

impl core::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver who transports shipments and is paid through the ledger.
///
/// `balance` is the authoritative running total for new postings; it must
/// only ever change to the `balance_after` of a ledger entry created in the
/// same atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_number: Option<String>,
    status: DriverStatus,
    balance: i64,
    pub is_active: bool,
}

impl Driver {
    pub fn new(
        id: DriverId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        license_number: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> DomainResult<Self> {
        let license_number = license_number.into();
        if license_number.trim().is_empty() {
            return Err(DomainError::validation("license_number cannot be empty"));
        }
        Ok(Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            license_number,
            phone_number: phone_number.into(),
            email: None,
            vehicle_type: None,
            vehicle_number: None,
            status: DriverStatus::Available,
            balance: 0,
            is_active: true,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn status(&self) -> DriverStatus {
        self.status
    }

    pub fn is_available(&self) -> bool {
        self.status == DriverStatus::Available
    }

    /// Unchecked status overwrite (dispatcher escape hatch).
    pub fn set_status(&mut self, status: DriverStatus) {
        self.status = status;
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Overwrite the running balance with a posted entry's `balance_after`.
    ///
    /// Must only be called alongside the ledger insert that produced the new
    /// balance; the engine keeps both in one store transaction.
    pub fn set_balance(&mut self, balance: i64) {
        self.balance = balance;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl Entity for Driver {
    type Id = DriverId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
