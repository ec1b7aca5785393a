use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::model::TimeResolution;

/// Builds the forward-looking instants for `day_count` days starting at
/// local midnight of `start_date`.
///
/// Steps advance on the local wall clock so buckets stay aligned to local
/// hours (00, 06, 12, ...). Local times inside a DST gap are skipped and
/// ambiguous ones resolve to the earlier instant. Instants before `now` are
/// dropped; an empty result is valid.
pub fn build_time_window(
    start_date: NaiveDate,
    day_count: u32,
    resolution: TimeResolution,
    timezone: Tz,
    now: DateTime<Utc>,
) -> Vec<DateTime<Tz>> {
    let Some(last_offset) = day_count.checked_sub(1) else {
        return Vec::new();
    };
    let Some(window_end_date) = start_date.checked_add_days(Days::new(u64::from(last_offset)))
    else {
        return Vec::new();
    };

    let now = now.with_timezone(&timezone);
    let step = resolution.step();
    let mut local = start_date.and_time(NaiveTime::MIN);
    let mut instants = Vec::new();

    while local.date() <= window_end_date {
        match timezone.from_local_datetime(&local).earliest() {
            Some(instant) if instant >= now => instants.push(instant),
            _ => {}
        }

        local = match local.checked_add_signed(step) {
            Some(next) => next,
            None => break,
        };
    }

    instants
}
