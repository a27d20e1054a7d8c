use serde::Serialize;

use freightnet_core::{DomainError, DomainResult};

/// Fixed driver share of a delivered shipment's value.
pub const DRIVER_PAYMENT_RATE_PERCENT: i64 = 65;

/// The financial breakdown of one delivered shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub driver_payment: i64,
    pub fuel_cost: i64,
    pub other_expenses: i64,
    pub company_profit: i64,
}

impl Settlement {
    /// Compute the driver payment (65% of value, rounded toward zero) and
    /// the company profit: value minus payment, fuel, and other expenses.
    /// Profit may legitimately be negative on a bad run.
    pub fn compute(total_value: i64, fuel_cost: i64, other_expenses: i64) -> DomainResult<Self> {
        if fuel_cost < 0 {
            return Err(DomainError::validation("fuel_cost cannot be negative"));
        }
        if other_expenses < 0 {
            return Err(DomainError::validation("other_expenses cannot be negative"));
        }
        let driver_payment = total_value * DRIVER_PAYMENT_RATE_PERCENT / 100;
        let company_profit = total_value - (driver_payment + fuel_cost + other_expenses);
        Ok(Self {
            driver_payment,
            fuel_cost,
            other_expenses,
            company_profit,
        })
    }

    /// Combined out-of-pocket expenses charged back to the driver.
    pub fn combined_expenses(&self) -> i64 {
        self.fuel_cost + self.other_expenses
    }
}
