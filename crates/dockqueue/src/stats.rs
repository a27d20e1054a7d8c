use serde::Serialize;

use crate::entry::{QueueEntry, QueueStatus};

/// Dock utilisation snapshot for one warehouse.
///
/// Averages are in minutes, rounded to two decimal places, and cover the
/// completed entries that carry a finish timestamp; with none of those, both
/// averages are simply 0 (not an error).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStatistics {
    pub waiting: usize,
    pub loading: usize,
    pub completed: usize,
    pub average_wait_minutes: f64,
    pub average_loading_minutes: f64,
}

impl QueueStatistics {
    pub fn compute<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a QueueEntry>,
    {
        let mut waiting = 0;
        let mut loading = 0;
        let mut completed = 0;
        let mut measured = 0usize;
        let mut total_wait = 0.0;
        let mut total_loading = 0.0;

        for entry in entries {
            match entry.status() {
                QueueStatus::Waiting => waiting += 1,
                QueueStatus::Loading => loading += 1,
                QueueStatus::Completed => completed += 1,
                QueueStatus::Cancelled => {}
            }

            if entry.status() != QueueStatus::Completed {
                continue;
            }
            let Some(finish) = entry.finish_loading_time() else {
                continue;
            };
            measured += 1;
            if let Some(start) = entry.start_loading_time() {
                total_wait += minutes_between(entry.arrival_time, start);
                total_loading += minutes_between(start, finish);
            }
        }

        let (average_wait_minutes, average_loading_minutes) = if measured > 0 {
            (
                round2(total_wait / measured as f64),
                round2(total_loading / measured as f64),
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            waiting,
            loading,
            completed,
            average_wait_minutes,
            average_loading_minutes,
        }
    }
}

fn minutes_between(
    from: chrono::DateTime<chrono::Utc>,
    to: chrono::DateTime<chrono::Utc>,
) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
