//! Time bucketing for referral analytics.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Cut-off instants for the rolling referral counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferralWindows {
    /// UTC midnight of the current day
    pub today_start: DateTime<Utc>,
    /// UTC midnight of the previous day
    pub yesterday_start: DateTime<Utc>,
    pub last_7_days: DateTime<Utc>,
    pub last_30_days: DateTime<Utc>,
}

impl ReferralWindows {
    pub fn at(now: DateTime<Utc>) -> Self {
        let today_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        Self {
            today_start,
            yesterday_start: today_start - Duration::days(1),
            last_7_days: now - Duration::days(7),
            last_30_days: now - Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyCount {
    /// Calendar month, `YYYY-MM`
    #[schema(example = "2025-09")]
    pub month: String,
    pub count: u64,
}

/// Groups creation times by calendar month, oldest first. Months without any
/// referral are not emitted.
pub fn monthly_breakdown<I>(created_at: I) -> Vec<MonthlyCount>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut buckets: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    for ts in created_at {
        *buckets.entry((ts.year(), ts.month())).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|((year, month), count)| MonthlyCount {
            month: format!("{year:04}-{month:02}"),
            count,
        })
        .collect()
}
