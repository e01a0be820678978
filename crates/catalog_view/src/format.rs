//! Kickoff labels. Every function takes `now` explicitly and renders in
//! `now`'s timezone, so callers choose local vs UTC.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

/// "June 11, 2026"
pub fn format_date<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%B %d, %Y").to_string()
}

/// "19:00"
pub fn format_time<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%H:%M").to_string()
}

/// "Today, 19:00" / "Tomorrow, 19:00" / "Jun 14, 19:00"
pub fn format_match_time<Tz: TimeZone>(kickoff: DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let local = kickoff.with_timezone(&now.timezone());
    let day = local.date_naive();
    let today = now.date_naive();
    let hm = local.format("%H:%M");

    if day == today {
        format!("Today, {hm}")
    } else if today.succ_opt() == Some(day) {
        format!("Tomorrow, {hm}")
    } else {
        format!("{}, {hm}", local.format("%b %d"))
    }
}

/// "in about 2 hours" / "3 days ago"
pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = at.signed_duration_since(now);
    let secs = delta.num_seconds().abs();
    let phrase = distance_phrase(secs);
    if delta.num_seconds() >= 0 {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

fn distance_phrase(secs: i64) -> String {
    const DAY: f64 = 1440.0;
    const MONTH: f64 = 43200.0;

    let minutes = (secs as f64 / 60.0).round();

    if secs < 30 {
        return "less than a minute".to_string();
    }
    if minutes < 2.0 {
        return "1 minute".to_string();
    }
    if minutes < 45.0 {
        return format!("{minutes} minutes");
    }
    if minutes < 90.0 {
        return "about 1 hour".to_string();
    }
    if minutes < DAY {
        return format!("about {} hours", (minutes / 60.0).round());
    }
    if minutes < 2520.0 {
        return "1 day".to_string();
    }
    if minutes < MONTH {
        return format!("{} days", (minutes / DAY).round());
    }
    if minutes < MONTH * 2.0 {
        return "about 1 month".to_string();
    }

    let months = (minutes / MONTH).round();
    if months < 12.0 {
        return format!("{months} months");
    }
    let years = (months / 12.0).round();
    if years <= 1.0 {
        "about 1 year".to_string()
    } else {
        format!("about {years} years")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn today_tomorrow_and_later() {
        let now = at("2026-06-11T10:00:00Z");
        assert_eq!(format_match_time(at("2026-06-11T19:00:00Z"), &now), "Today, 19:00");
        assert_eq!(format_match_time(at("2026-06-12T08:30:00Z"), &now), "Tomorrow, 08:30");
        assert_eq!(format_match_time(at("2026-06-14T21:05:00Z"), &now), "Jun 14, 21:05");
        assert_eq!(format_match_time(at("2026-06-10T21:05:00Z"), &now), "Jun 10, 21:05");
    }

    #[test]
    fn day_boundary_follows_the_viewer_timezone() {
        // 23:30 UTC is already tomorrow at UTC+3
        let nairobi = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = at("2026-06-11T10:00:00Z").with_timezone(&nairobi);
        assert_eq!(format_match_time(at("2026-06-11T23:30:00Z"), &now), "Tomorrow, 02:30");
    }

    #[test]
    fn full_date_and_time() {
        assert_eq!(format_date(at("2026-06-01T19:00:00Z"), &Utc), "June 01, 2026");
        assert_eq!(format_time(at("2026-06-01T07:05:00Z"), &Utc), "07:05");
    }

    #[test]
    fn relative_phrases() {
        let now = at("2026-06-11T10:00:00Z");
        assert_eq!(format_relative_time(now + Duration::seconds(10), now), "in less than a minute");
        assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(format_relative_time(now + Duration::hours(2), now), "in about 2 hours");
        assert_eq!(format_relative_time(now - Duration::days(3), now), "3 days ago");
        assert_eq!(format_relative_time(now - Duration::days(400), now), "about 1 year ago");
    }
}
