//! `freightnet-engine` — the fulfillment engine: a transactional record
//! store collaborator and the command services that drive stock, shipments,
//! the dock queue, and the financial ledger through it.
//!
//! Every public operation runs inside one store transaction: all writes land
//! or none do, and a concurrent reader never observes an intermediate state.

pub mod record_store;
pub mod services;

#[cfg(test)]
mod integration_tests;

pub use record_store::{InMemoryStore, RecordStore, Tables};
pub use services::financial::{CompanyFinancialReport, FinancialService, SettlementOutcome};
pub use services::queue::{EnqueueRequest, QueueService};
pub use services::shipments::{NewShipment, NewShipmentItem, ShipmentService};
pub use services::stock::{LowStockAlert, StockService};
