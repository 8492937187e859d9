//! Typed interpretation of resolved value text.
//!
//! Values stay strings in the export record; these helpers give writers a
//! number or a timestamp when the text allows it.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    // Digits with optional thousands groups ("1 234", "1,234", "1'234") and decimals
    static ref AMOUNT: Regex = Regex::new(
        r"-?\d(?:[\d,.']|[\s\u{00a0}]\d{3}\b)*"
    ).unwrap();

    // YYYY-MM-DD or YYYY/MM/DD
    static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // DD/MM/YYYY, DD.MM.YY, MM-DD-YYYY
    static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    // "March 1, 2024", "Mar 1 2024"
    static ref DATE_MONTH_FIRST: Regex = Regex::new(
        r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    ).unwrap();

    // "1 March 2024", "01-Mar-2024"
    static ref DATE_DAY_FIRST: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?[\s\-]+([a-z]{3,9})\.?,?[\s\-]+(\d{4})\b"
    ).unwrap();

    static ref TIME: Regex = Regex::new(
        r"\b(\d{1,2}):(\d{2})(?::(\d{2}))?\s*(?i:(am|pm))?"
    ).unwrap();
}

/// Parse a monetary amount such as `$1,234.56`, `1 234,56 zł` or `(12.00)`.
///
/// The last `.` or `,` followed by one or two digits is the decimal separator;
/// every other separator is a thousands separator.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let m = AMOUNT.find(text)?;
    let raw: String = m
        .as_str()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .collect();

    let negative = raw.starts_with('-') || text.trim_start().starts_with('(');
    let digits = raw.trim_start_matches('-').trim_end_matches(['.', ',']);

    let normalized = match digits.rfind(['.', ',']) {
        Some(pos) if digits.len() - pos - 1 <= 2 => {
            let integer = digits[..pos].replace(['.', ','], "");
            format!("{}.{}", integer, &digits[pos + 1..])
        }
        _ => digits.replace(['.', ','], ""),
    };

    let amount = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -amount } else { amount })
}

/// Parse an issue date, with an optional time of day.
///
/// Numeric dates are read day-first unless the first component cannot be a
/// day-of-month ordering (second component above 12).
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let date = parse_date_part(text)?;
    let time = parse_time(text).unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}

fn parse_date_part(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_YMD.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_NUMERIC.captures(text) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3]);

        let (day, month) = if second > 12 { (second, first) } else { (first, second) };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_MONTH_FIRST.captures(text) {
        if let Some(month) = month_from_name(&caps[1]) {
            let day: u32 = caps[2].parse().ok()?;
            let year: i32 = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
    }

    if let Some(caps) = DATE_DAY_FIRST.captures(text) {
        let month = month_from_name(&caps[2])?;
        let day: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let caps = TIME.captures(text)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let second: u32 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse::<u32>()).ok()?;

    match caps.get(4).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
