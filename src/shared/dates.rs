use chrono::{DateTime, Datelike, Utc};

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;
const MINUTES_PER_MONTH: i64 = 30 * MINUTES_PER_DAY;
const MINUTES_PER_YEAR: i64 = 365 * MINUTES_PER_DAY;

fn plural<T: Into<i64>>(count: T, unit: &str) -> String {
    let count = count.into();
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Human readable tour length, e.g. `90` -> `1 hour 30 minutes`.
#[must_use]
pub fn format_tour_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let remaining = minutes % 60;

    if hours == 0 {
        return plural(minutes, "minute");
    }
    if remaining == 0 {
        return plural(hours, "hour");
    }
    format!("{} {}", plural(hours, "hour"), plural(remaining, "minute"))
}

#[must_use]
pub fn is_valid_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start <= end
}

/// Dates strictly after `now`, earliest first.
#[must_use]
pub fn upcoming_dates(dates: &[DateTime<Utc>], now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut upcoming: Vec<DateTime<Utc>> = dates.iter().copied().filter(|d| *d > now).collect();
    upcoming.sort();
    upcoming
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Long date such as `April 29th, 2026`.
#[must_use]
pub fn format_date(date: DateTime<Utc>) -> String {
    let day = date.day();
    format!(
        "{} {day}{}, {}",
        date.format("%B"),
        ordinal_suffix(day),
        date.year()
    )
}

/// Distance between `date` and `now` in words, e.g. `in 3 days` or
/// `about 2 hours ago`.
#[must_use]
pub fn format_relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (date - now).num_seconds();
    let distance = describe_distance(seconds.abs());
    if seconds >= 0 {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

fn rounded_div(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}

fn describe_distance(seconds: i64) -> String {
    let minutes = rounded_div(seconds, 60);
    match minutes {
        0 => "less than a minute".to_string(),
        1..=44 => plural(minutes, "minute"),
        45..=89 => "about 1 hour".to_string(),
        90..=1439 => format!("about {}", plural(rounded_div(minutes, MINUTES_PER_HOUR), "hour")),
        1440..=2519 => "1 day".to_string(),
        2520..=43199 => plural(rounded_div(minutes, MINUTES_PER_DAY), "day"),
        43200..=86399 => format!(
            "about {}",
            plural(rounded_div(minutes, MINUTES_PER_MONTH), "month")
        ),
        _ if minutes < MINUTES_PER_YEAR => plural(rounded_div(minutes, MINUTES_PER_MONTH), "month"),
        _ => {
            let years = minutes / MINUTES_PER_YEAR;
            let months_over = (minutes % MINUTES_PER_YEAR) / MINUTES_PER_MONTH;
            if months_over < 3 {
                format!("about {}", plural(years, "year"))
            } else if months_over < 9 {
                format!("over {}", plural(years, "year"))
            } else {
                format!("almost {}", plural(years + 1, "year"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn durations() {
        assert_eq!(format_tour_duration(45), "45 minutes");
        assert_eq!(format_tour_duration(1), "1 minute");
        assert_eq!(format_tour_duration(60), "1 hour");
        assert_eq!(format_tour_duration(180), "3 hours");
        assert_eq!(format_tour_duration(61), "1 hour 1 minute");
        assert_eq!(format_tour_duration(150), "2 hours 30 minutes");
    }

    #[test]
    fn date_range_allows_same_day() {
        let now = Utc::now();
        assert!(is_valid_date_range(now, now));
        assert!(!is_valid_date_range(now, now - Duration::days(1)));
    }

    #[test]
    fn upcoming_dates_are_sorted_future_only() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).single().unwrap_or_default();
        let dates = [
            now + Duration::days(10),
            now - Duration::days(1),
            now + Duration::days(2),
            now,
        ];
        assert_eq!(
            upcoming_dates(&dates, now),
            vec![now + Duration::days(2), now + Duration::days(10)]
        );
    }

    #[test]
    fn long_dates_use_ordinals() {
        let date = |d| Utc.with_ymd_and_hms(2026, 4, d, 9, 30, 0).single().unwrap_or_default();
        assert_eq!(format_date(date(1)), "April 1st, 2026");
        assert_eq!(format_date(date(2)), "April 2nd, 2026");
        assert_eq!(format_date(date(3)), "April 3rd, 2026");
        assert_eq!(format_date(date(11)), "April 11th, 2026");
        assert_eq!(format_date(date(22)), "April 22nd, 2026");
        assert_eq!(format_date(date(29)), "April 29th, 2026");
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap_or_default();
        let cases = [
            (Duration::seconds(10), "in less than a minute"),
            (Duration::seconds(-50), "1 minute ago"),
            (Duration::minutes(30), "in 30 minutes"),
            (Duration::minutes(-60), "about 1 hour ago"),
            (Duration::hours(5), "in about 5 hours"),
            (Duration::hours(30), "in 1 day"),
            (Duration::days(-3), "3 days ago"),
            (Duration::days(40), "in about 1 month"),
            (Duration::days(200), "in 7 months"),
            (Duration::days(400), "in about 1 year"),
            (Duration::days(-365 * 2 - 200), "over 2 years ago"),
            (Duration::days(365 + 300), "in almost 2 years"),
        ];
        for (offset, expected) in cases {
            assert_eq!(format_relative_time(now + offset, now), expected, "{offset}");
        }
    }
}
