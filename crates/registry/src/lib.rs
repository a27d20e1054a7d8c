//! `freightnet-registry` — master-data records referenced by the fulfillment
//! engine: products, warehouses, drivers.
//!
//! CRUD surfaces for these records live outside the engine; the records
//! themselves are in scope because shipments, the dock queue, and the ledger
//! read and mutate them.

pub mod driver;
pub mod product;
pub mod warehouse;

pub use driver::{Driver, DriverStatus};
pub use product::Product;
pub use warehouse::Warehouse;
