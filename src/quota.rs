use chrono::{DateTime, FixedOffset, Utc};

use crate::config::QuotaConfig;
use crate::DailyPostCount;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

// Quota days roll over at midnight UTC+5:30, regardless of host timezone.
pub fn day_key(at_ms: i64) -> String {
    let offset = FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is in range");
    DateTime::<Utc>::from_timestamp_millis(at_ms)
        .map(|utc| utc.with_timezone(&offset).format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct PostingQuotaGuard {
    limit: u32,
}

impl PostingQuotaGuard {
    pub fn new(config: QuotaConfig) -> Self {
        Self {
            limit: config.daily_limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    // A stored count from a previous day key counts as zero.
    pub fn effective_count(&self, daily: Option<&DailyPostCount>, now_ms: i64) -> u32 {
        let today = day_key(now_ms);
        match daily {
            Some(daily) if daily.date == today => daily.count,
            _ => 0,
        }
    }

    pub fn can_post(&self, daily: Option<&DailyPostCount>, now_ms: i64) -> bool {
        self.effective_count(daily, now_ms) < self.limit
    }

    pub fn record_post(&self, daily: Option<&DailyPostCount>, now_ms: i64) -> DailyPostCount {
        DailyPostCount {
            count: self.effective_count(daily, now_ms) + 1,
            date: day_key(now_ms),
        }
    }

    // Deleting a post only gives the day back when the post was created under
    // today's key and the stored counter is keyed to today as well.
    pub fn record_deletion(
        &self,
        daily: Option<&DailyPostCount>,
        post_created_at: i64,
        now_ms: i64,
    ) -> Option<DailyPostCount> {
        let today = day_key(now_ms);
        let stored = daily?;
        if day_key(post_created_at) != today || stored.date != today {
            return None;
        }
        Some(DailyPostCount {
            count: stored.count.saturating_sub(1),
            date: today,
        })
    }

    // Written back on session load so a stale counter never survives the day
    // rollover in the store.
    pub fn stale_day_reset(
        &self,
        daily: Option<&DailyPostCount>,
        now_ms: i64,
    ) -> Option<DailyPostCount> {
        let today = day_key(now_ms);
        match daily {
            Some(daily) if daily.date == today => None,
            _ => Some(DailyPostCount {
                count: 0,
                date: today,
            }),
        }
    }
}
