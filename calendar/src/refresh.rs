use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tokio::time::interval;

use crate::table::CalendarTable;

/// External collaborator that supplies the holiday list. The concrete HTTP
/// call behind this is out of scope (news/telemetry adapters, spec §1);
/// this trait is the only surface `calendar` needs from it.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    async fn fetch_holidays(&self) -> anyhow::Result<Vec<NaiveDate>>;
}

/// A `CalendarTable` that can be swapped out from under readers by a
/// background refresh task. Readers never block on refresh.
pub struct Calendar {
    table: RwLock<CalendarTable>,
}

impl Calendar {
    pub fn new(table: CalendarTable) -> Arc<Self> {
        Arc::new(Self {
            table: RwLock::new(table),
        })
    }

    pub async fn snapshot(&self) -> CalendarTable {
        self.table.read().await.clone()
    }

    /// Refresh from `source`. On failure, the last-known table is left
    /// intact and a warning is logged — refresh never surfaces an error to
    /// callers of the pure lookup surface.
    pub async fn refresh_once(&self, source: &dyn HolidaySource) {
        match source.fetch_holidays().await {
            Ok(holidays) => {
                *self.table.write().await = CalendarTable::new(holidays);
                tracing::info!(component = "calendar", "holiday table refreshed");
            }
            Err(err) => {
                tracing::warn!(component = "calendar", error = %err, "holiday refresh failed, keeping last-known table");
            }
        }
    }
}

/// Spawn the daily background refresh task (spec §4.1).
pub fn spawn_refresh_task(
    calendar: Arc<Calendar>,
    source: Arc<dyn HolidaySource>,
    period: StdDuration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            calendar.refresh_once(source.as_ref()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlakySource {
        should_fail: AtomicBool,
    }

    #[async_trait]
    impl HolidaySource for FlakySource {
        async fn fetch_holidays(&self) -> anyhow::Result<Vec<NaiveDate>> {
            if self.should_fail.load(Ordering::SeqCst) {
                anyhow::bail!("upstream unavailable")
            } else {
                Ok(vec![NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()])
            }
        }
    }

    #[tokio::test]
    async fn failed_refresh_preserves_last_known_table() {
        let calendar = Calendar::new(CalendarTable::default());
        let source = FlakySource {
            should_fail: AtomicBool::new(false),
        };

        calendar.refresh_once(&source).await;
        assert!(calendar.snapshot().await.is_holiday(NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()));

        source.should_fail.store(true, Ordering::SeqCst);
        calendar.refresh_once(&source).await;
        // Still holds the table from the successful refresh.
        assert!(calendar.snapshot().await.is_holiday(NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()));
    }
}
