//! Presentation helpers shared by the listing cards, the detail view and the
//! earnings calculator. Output follows en-IN conventions.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::posting::SalaryRange;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// India Standard Time, used when an absolute date is shown.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Groups an unsigned digit string the Indian way: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Formats a whole number with en-IN digit grouping, e.g. `12,00,000`.
pub fn format_grouped(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let rounded = amount.round();
    let digits = format!("{}", rounded.abs() as u128);
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}", sign, group_indian(&digits))
}

/// Rupee amount with no fractional digits, e.g. `₹5,00,000`.
pub fn format_inr(amount: f64) -> String {
    let grouped = format_grouped(amount);
    match grouped.strip_prefix('-') {
        Some(positive) => format!("-₹{}", positive),
        None => format!("₹{}", grouped),
    }
}

/// `"₹5,00,000 - ₹8,00,000"`
pub fn format_salary_range(range: &SalaryRange) -> String {
    format!("{} - {}", format_inr(range.min), format_inr(range.max))
}

/// Absolute day distance between `date` and `now`, rounded up.
pub fn whole_days_between(date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let diff = (date - now).num_milliseconds().abs();
    (diff + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Bucketed distance used on listing cards ("Today", "In 3 days", ...).
///
/// Beyond 30 days the short absolute date is shown instead.
pub fn relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match whole_days_between(date, now) {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        days @ 2..=7 => format!("In {} days", days),
        days @ 8..=30 => format!("In {} weeks", days / 7),
        _ => short_date(date),
    }
}

/// `"16 Oct 2026"`
pub fn short_date(date: DateTime<Utc>) -> String {
    date.with_timezone(&ist()).format("%-d %b %Y").to_string()
}

/// `"16 October 2026"`
pub fn long_date(date: DateTime<Utc>) -> String {
    date.with_timezone(&ist()).format("%-d %B %Y").to_string()
}
