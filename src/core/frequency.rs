use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone};
use std::fmt;

use crate::domain::model::Granularity;

/// Regular spacing of a timestamp index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Constant step. Sub-daily steps are measured in absolute time, day
    /// multiples on the local wall clock (so `D` survives DST changes).
    Fixed(Duration),
    /// Every `n` months on the first day of the month.
    MonthStart(u32),
    /// Every `n` months on the last day of the month.
    MonthEnd(u32),
}

impl Frequency {
    pub fn matches(&self, granularity: Granularity) -> bool {
        match (granularity, self) {
            (Granularity::Hourly, Frequency::Fixed(step)) => *step == Duration::hours(1),
            (Granularity::Daily, Frequency::Fixed(step)) => *step == Duration::days(1),
            (Granularity::Monthly, Frequency::MonthStart(1) | Frequency::MonthEnd(1)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn with_count(f: &mut fmt::Formatter<'_>, n: i64, unit: &str) -> fmt::Result {
            if n == 1 {
                f.write_str(unit)
            } else {
                write!(f, "{}{}", n, unit)
            }
        }

        match self {
            Frequency::MonthStart(n) => with_count(f, i64::from(*n), "MS"),
            Frequency::MonthEnd(n) => with_count(f, i64::from(*n), "ME"),
            Frequency::Fixed(step) => {
                let secs = step.num_seconds();
                if secs % 86_400 == 0 {
                    with_count(f, secs / 86_400, "D")
                } else if secs % 3_600 == 0 {
                    with_count(f, secs / 3_600, "h")
                } else if secs % 60 == 0 {
                    with_count(f, secs / 60, "min")
                } else if secs > 0 {
                    with_count(f, secs, "s")
                } else {
                    with_count(f, step.num_milliseconds(), "ms")
                }
            }
        }
    }
}

/// Infers the spacing of `timestamps`, or `None` when it is irregular.
///
/// Needs at least three points, strictly increasing in absolute time.
pub fn infer_frequency<Tz: TimeZone>(timestamps: &[DateTime<Tz>]) -> Option<Frequency> {
    if timestamps.len() < 3 {
        return None;
    }

    let absolute: Vec<Duration> = timestamps
        .windows(2)
        .map(|w| w[1].clone().signed_duration_since(w[0].clone()))
        .collect();
    if absolute.iter().any(|d| *d <= Duration::zero()) {
        return None;
    }

    let local: Vec<NaiveDateTime> = timestamps.iter().map(|t| t.naive_local()).collect();
    let first_local_step = local[1] - local[0];

    if first_local_step > Duration::zero() && first_local_step.num_seconds() % 86_400 == 0 {
        if let Some(monthly) = infer_monthly(&local) {
            return Some(monthly);
        }
        let steps: Vec<Duration> = local.windows(2).map(|w| w[1] - w[0]).collect();
        return all_equal(&steps).then_some(Frequency::Fixed(first_local_step));
    }

    all_equal(&absolute).then_some(Frequency::Fixed(absolute[0]))
}

fn all_equal(steps: &[Duration]) -> bool {
    steps.iter().all(|s| *s == steps[0])
}

fn infer_monthly(local: &[NaiveDateTime]) -> Option<Frequency> {
    let time = local[0].time();
    if local.iter().any(|t| t.time() != time) {
        return None;
    }

    let month_index = |t: &NaiveDateTime| i64::from(t.year()) * 12 + i64::from(t.month0());
    let steps: Vec<i64> = local
        .windows(2)
        .map(|w| month_index(&w[1]) - month_index(&w[0]))
        .collect();
    let step = steps[0];
    if step <= 0 || steps.iter().any(|s| *s != step) {
        return None;
    }
    let step = u32::try_from(step).ok()?;

    if local.iter().all(|t| t.day() == 1) {
        Some(Frequency::MonthStart(step))
    } else if local.iter().all(|t| is_last_day_of_month(t.date())) {
        Some(Frequency::MonthEnd(step))
    } else {
        None
    }
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().map(|next| next.day() == 1).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::Europe::Paris;

    fn utc_series(start: &str, step: Duration, n: i32) -> Vec<DateTime<Utc>> {
        let start = NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc();
        (0..n).map(|i| start + step * i).collect()
    }

    #[test]
    fn test_hourly_and_daily() {
        let hourly = utc_series("2023-01-01 00:00:00", Duration::hours(1), 5);
        assert_eq!(infer_frequency(&hourly), Some(Frequency::Fixed(Duration::hours(1))));
        assert_eq!(infer_frequency(&hourly).unwrap().to_string(), "h");

        let daily = utc_series("2023-01-01 00:00:00", Duration::days(1), 5);
        assert_eq!(infer_frequency(&daily).unwrap().to_string(), "D");

        let quarter_hour = utc_series("2023-01-01 00:00:00", Duration::minutes(15), 4);
        assert_eq!(infer_frequency(&quarter_hour).unwrap().to_string(), "15min");
    }

    #[test]
    fn test_too_short_or_irregular() {
        let two = utc_series("2023-01-01 00:00:00", Duration::hours(1), 2);
        assert_eq!(infer_frequency(&two), None);

        let mut gap = utc_series("2023-01-01 00:00:00", Duration::days(1), 6);
        gap.remove(3);
        assert_eq!(infer_frequency(&gap), None);

        let mut dup = utc_series("2023-01-01 00:00:00", Duration::days(1), 4);
        dup.insert(2, dup[1]);
        assert_eq!(infer_frequency(&dup), None);
    }

    #[test]
    fn test_month_start_and_end() {
        let starts: Vec<DateTime<Utc>> = [(2023, 1), (2023, 2), (2023, 3), (2023, 4)]
            .into_iter()
            .map(|(y, m)| Utc.with_ymd_and_hms(y, m, 1, 0, 0, 0).unwrap())
            .collect();
        assert_eq!(infer_frequency(&starts), Some(Frequency::MonthStart(1)));
        assert!(infer_frequency(&starts).unwrap().matches(Granularity::Monthly));

        let ends: Vec<DateTime<Utc>> = [(2023, 1, 31), (2023, 2, 28), (2023, 3, 31)]
            .into_iter()
            .map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
            .collect();
        assert_eq!(infer_frequency(&ends).unwrap().to_string(), "ME");
    }

    #[test]
    fn test_daily_across_dst_uses_wall_clock() {
        // 2023-03-26 is the spring-forward day in Paris: one day lasts 23h.
        let days: Vec<DateTime<chrono_tz::Tz>> = (24..=28)
            .map(|d| Paris.with_ymd_and_hms(2023, 3, d, 0, 0, 0).unwrap())
            .collect();
        assert_eq!(infer_frequency(&days), Some(Frequency::Fixed(Duration::days(1))));
    }

    #[test]
    fn test_hourly_across_dst_uses_absolute_time() {
        let start = Utc.with_ymd_and_hms(2023, 3, 26, 0, 0, 0).unwrap();
        let hours: Vec<DateTime<chrono_tz::Tz>> = (0..4)
            .map(|h| (start + Duration::hours(h)).with_timezone(&Paris))
            .collect();
        assert_eq!(infer_frequency(&hours), Some(Frequency::Fixed(Duration::hours(1))));
    }
}
