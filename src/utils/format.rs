//! Display helpers for amounts, dates and deadlines

use chrono::{DateTime, Utc};

/// USD with thousands separators, e.g. `$1,500.00`
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", if negative { "-" } else { "" }, grouped, frac)
}

/// e.g. `Mar 05, 2024 14:30`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %d, %Y %H:%M").to_string()
}

pub fn is_overdue(deadline: &DateTime<Utc>, now: &DateTime<Utc>) -> bool {
    deadline < now
}

/// Countdown text: `Overdue`, `1d 12h`, or `4h 5m`
pub fn time_remaining(deadline: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let diff = (*deadline - *now).num_seconds();
    if diff <= 0 {
        return "Overdue".to_string();
    }

    let days = diff / (3600 * 24);
    let hours = (diff % (3600 * 24)) / 3600;
    let minutes = (diff % 3600) / 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else {
        format!("{}h {}m", hours, minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1500.0), "$1,500.00");
        assert_eq!(format_currency(0.5), "$0.50");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(999.0), "$999.00");
        assert_eq!(format_currency(-20.0), "-$20.00");
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(format_date(&date), "Mar 05, 2024 14:30");
    }

    #[test]
    fn test_time_remaining() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(time_remaining(&(now + Duration::hours(36)), &now), "1d 12h");
        assert_eq!(time_remaining(&(now + Duration::minutes(245)), &now), "4h 5m");
        assert_eq!(time_remaining(&now, &now), "Overdue");
        assert_eq!(time_remaining(&(now - Duration::days(2)), &now), "Overdue");
    }

    #[test]
    fn test_is_overdue() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert!(is_overdue(&(now - Duration::seconds(1)), &now));
        assert!(!is_overdue(&(now + Duration::seconds(1)), &now));
    }
}
