//! Command services: one public method per engine operation, each executing
//! inside a single store transaction.

pub mod financial;
pub mod queue;
pub mod shipments;
pub mod stock;
