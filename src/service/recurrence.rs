//! Next-occurrence arithmetic for recurring rides.
//!
//! Month and year steps use chrono's `checked_add_months`, which clamps the
//! day of month to the last day of the target month (Jan 31 + 1 month is
//! Feb 28/29, Feb 29 + 1 year is Feb 28). The clamped day is carried into
//! later steps, so a monthly series started on the 31st settles on the
//! shortest month's last day.

use chrono::{DateTime, Datelike, Duration, Months, Utc, Weekday};

use crate::errors::ApiError;
use crate::models::ScheduleUnit;

pub const WEEKDAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Parses one of the seven lowercase english weekday names.
pub fn parse_weekday(day: &str) -> Result<Weekday, ApiError> {
    match day {
        "sunday" => Ok(Weekday::Sun),
        "monday" => Ok(Weekday::Mon),
        "tuesday" => Ok(Weekday::Tue),
        "wednesday" => Ok(Weekday::Wed),
        "thursday" => Ok(Weekday::Thu),
        "friday" => Ok(Weekday::Fri),
        "saturday" => Ok(Weekday::Sat),
        other => Err(ApiError::InvalidWeekday(other.to_string())),
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAY_NAMES[day.num_days_from_sunday() as usize]
}

/// Days until the next `target` strictly after `now`. Same weekday is 7.
fn days_until(now: Weekday, target: Weekday) -> i64 {
    let now = now.num_days_from_sunday() as i64;
    let target = target.num_days_from_sunday() as i64;
    if now < target {
        target - now
    } else {
        7 - (now - target)
    }
}

pub fn next_occurrence(
    current: DateTime<Utc>,
    unit: ScheduleUnit,
    interval: i64,
    weekdays: Option<&[Weekday]>,
) -> Result<DateTime<Utc>, ApiError> {
    if unit != ScheduleUnit::Weekdays && interval < 1 {
        return Err(ApiError::InvalidSchedule(format!(
            "Field 'interval' must be a positive integer, received {interval}."
        )));
    }

    let next = match unit {
        ScheduleUnit::Days => current.checked_add_signed(Duration::days(interval)),
        ScheduleUnit::Weeks => current.checked_add_signed(Duration::weeks(interval)),
        ScheduleUnit::Months => add_months(current, interval),
        ScheduleUnit::Years => interval.checked_mul(12).and_then(|months| add_months(current, months)),
        ScheduleUnit::Weekdays => {
            let weekdays = match weekdays {
                Some(days) if !days.is_empty() => days,
                _ => {
                    return Err(ApiError::InvalidSchedule(
                        "Field 'unit' is 'weekdays' but the field 'weekdays' is empty or undefined."
                            .to_string(),
                    ))
                }
            };
            let now = current.weekday();
            let dist = weekdays
                .iter()
                .map(|day| days_until(now, *day))
                .min()
                .unwrap_or(7);
            debug_assert!((1..=7).contains(&dist));
            current.checked_add_signed(Duration::days(dist))
        }
    };

    next.ok_or_else(|| {
        ApiError::InvalidSchedule(format!(
            "Next {} occurrence after {} is out of range.",
            unit.as_str(),
            current.to_rfc3339()
        ))
    })
}

fn add_months(current: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let months = u32::try_from(months).ok()?;
    current.checked_add_months(Months::new(months))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 8, 30, 0).unwrap()
    }

    #[test]
    fn fixed_units_advance() {
        let start = at(2024, 5, 1);
        assert_eq!(next_occurrence(start, ScheduleUnit::Days, 3, None).unwrap(), at(2024, 5, 4));
        assert_eq!(next_occurrence(start, ScheduleUnit::Weeks, 2, None).unwrap(), at(2024, 5, 15));
        assert_eq!(next_occurrence(start, ScheduleUnit::Months, 1, None).unwrap(), at(2024, 6, 1));
        assert_eq!(next_occurrence(start, ScheduleUnit::Years, 1, None).unwrap(), at(2025, 5, 1));
    }

    #[test]
    fn fixed_units_strictly_increase_and_compose() {
        let start = at(2023, 1, 31);
        for unit in [
            ScheduleUnit::Days,
            ScheduleUnit::Weeks,
            ScheduleUnit::Months,
            ScheduleUnit::Years,
        ] {
            for interval in 1..=13 {
                let once = next_occurrence(start, unit, interval, None).unwrap();
                assert!(once > start, "{unit:?} x{interval} did not advance");
                let twice = next_occurrence(once, unit, interval, None).unwrap();
                assert!(twice > once);
                let composed = next_occurrence(
                    next_occurrence(start, unit, interval, None).unwrap(),
                    unit,
                    interval,
                    None,
                )
                .unwrap();
                assert_eq!(twice, composed);
            }
        }
    }

    #[test]
    fn month_end_is_clamped() {
        assert_eq!(next_occurrence(at(2024, 1, 31), ScheduleUnit::Months, 1, None).unwrap(), at(2024, 2, 29));
        assert_eq!(next_occurrence(at(2023, 1, 31), ScheduleUnit::Months, 1, None).unwrap(), at(2023, 2, 28));
        assert_eq!(next_occurrence(at(2024, 3, 31), ScheduleUnit::Months, 1, None).unwrap(), at(2024, 4, 30));
        assert_eq!(next_occurrence(at(2024, 2, 29), ScheduleUnit::Years, 1, None).unwrap(), at(2025, 2, 28));
        assert_eq!(next_occurrence(at(2024, 2, 29), ScheduleUnit::Years, 4, None).unwrap(), at(2028, 2, 29));
    }

    #[test]
    fn clamped_day_carries_forward() {
        let feb = next_occurrence(at(2023, 1, 31), ScheduleUnit::Months, 1, None).unwrap();
        let mar = next_occurrence(feb, ScheduleUnit::Months, 1, None).unwrap();
        assert_eq!(mar, at(2023, 3, 28));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        assert!(matches!(
            next_occurrence(at(2024, 5, 1), ScheduleUnit::Days, 0, None),
            Err(ApiError::InvalidSchedule(_))
        ));
        assert!(next_occurrence(at(2024, 5, 1), ScheduleUnit::Months, -2, None).is_err());
    }

    #[test]
    fn weekdays_pick_nearest_target() {
        // 2024-05-01 is a wednesday
        let wed = at(2024, 5, 1);
        let days = [Weekday::Mon, Weekday::Thu];
        assert_eq!(
            next_occurrence(wed, ScheduleUnit::Weekdays, 1, Some(&days)).unwrap(),
            at(2024, 5, 2)
        );

        let days = [Weekday::Mon];
        assert_eq!(
            next_occurrence(wed, ScheduleUnit::Weekdays, 1, Some(&days)).unwrap(),
            at(2024, 5, 6)
        );
    }

    #[test]
    fn weekdays_never_return_same_day() {
        let wed = at(2024, 5, 1);
        let days = [Weekday::Wed];
        assert_eq!(
            next_occurrence(wed, ScheduleUnit::Weekdays, 1, Some(&days)).unwrap(),
            at(2024, 5, 8)
        );
    }

    #[test]
    fn weekdays_result_is_member_and_within_a_week() {
        let all = [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ];
        for offset in 0..7 {
            let current = at(2024, 5, 5) + Duration::days(offset);
            for mask in 1u8..128 {
                let days: Vec<Weekday> = all
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| mask & (1 << idx) != 0)
                    .map(|(_, day)| *day)
                    .collect();
                let next = next_occurrence(current, ScheduleUnit::Weekdays, 1, Some(&days)).unwrap();
                let advance = (next - current).num_days();
                assert!((1..=7).contains(&advance));
                assert!(days.contains(&next.weekday()));
            }
        }
    }

    #[test]
    fn weekdays_ignore_interval() {
        let days = [Weekday::Fri];
        assert_eq!(
            next_occurrence(at(2024, 5, 1), ScheduleUnit::Weekdays, 0, Some(&days)).unwrap(),
            at(2024, 5, 3)
        );
    }

    #[test]
    fn weekdays_require_a_set() {
        assert!(matches!(
            next_occurrence(at(2024, 5, 1), ScheduleUnit::Weekdays, 1, None),
            Err(ApiError::InvalidSchedule(_))
        ));
        assert!(matches!(
            next_occurrence(at(2024, 5, 1), ScheduleUnit::Weekdays, 1, Some(&[])),
            Err(ApiError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn weekday_names_are_exact() {
        for name in WEEKDAY_NAMES {
            assert_eq!(weekday_name(parse_weekday(name).unwrap()), name);
        }
        assert!(matches!(parse_weekday("Monday"), Err(ApiError::InvalidWeekday(_))));
        assert!(matches!(parse_weekday("mon"), Err(ApiError::InvalidWeekday(_))));
        assert!(parse_weekday("").is_err());
    }
}
