//! Tracking-number generation.

use chrono::{DateTime, Utc};

use freightnet_core::token::random_token;

/// Generate a human-readable tracking number: `TRK-<unix millis>-<9 chars>`.
///
/// The timestamp component makes numbers sort roughly by creation time; the
/// random suffix makes collision practically impossible. The store still
/// enforces uniqueness at insert rather than retrying generation.
pub fn generate_tracking_number(now: DateTime<Utc>) -> String {
    format!("TRK-{}-{}", now.timestamp_millis(), random_token(9))
}
