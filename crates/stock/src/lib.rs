//! `freightnet-stock` — the per-(product, warehouse) stock reservation
//! ledger: on-hand vs. committed quantities.

pub mod record;

pub use record::StockRecord;
