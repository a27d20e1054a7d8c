//! `freightnet-ledger` — the driver-facing financial ledger: append-only
//! entries bracketing every balance change, and shipment settlement maths.

pub mod entry;
pub mod settlement;

pub use entry::{
    generate_reference, BalanceReport, EntryStatus, EntryType, LedgerEntry,
};
pub use settlement::{Settlement, DRIVER_PAYMENT_RATE_PERCENT};
