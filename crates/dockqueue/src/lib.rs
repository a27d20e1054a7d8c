//! `freightnet-dockqueue` — the per-warehouse loading-dock queue: entries,
//! their lifecycle, the service order, and dock statistics.

pub mod entry;
pub mod stats;

pub use entry::{queue_order, select_next, QueueEntry, QueueStatus};
pub use stats::QueueStatistics;
