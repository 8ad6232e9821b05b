//! Field-name heuristics and lenient date parsing for list filters

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Field names that probably hold a date or a timestamp
pub fn looks_like_date_field(field: &str) -> bool {
    let f = field.to_lowercase();
    f.contains("date")
        || f.contains("created")
        || f.contains("updated")
        || f.contains("time")
        || f.ends_with("at")
}

/// Field names searched with a substring match instead of equality
pub fn looks_like_free_text_field(field: &str) -> bool {
    let f = field.to_lowercase();
    f.contains("search") || f.contains("name") || f.contains("email")
}

/// Parse ISO 8601, `YYYY-MM-DD`, `MM/DD/YYYY` or `DD/MM/YYYY`.
///
/// Timestamps without an offset are taken as UTC. Slash dates are read as
/// month-first and fall back to day-first when the first part cannot be a month.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    parse_slash_date(value)
}

fn parse_slash_date(value: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = value.split('/').collect();
    let [a, b, year] = parts.as_slice() else {
        return None;
    };
    let shape_ok = (1..=2).contains(&a.len())
        && (1..=2).contains(&b.len())
        && year.len() == 4
        && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit()));
    if !shape_ok {
        return None;
    }

    let a: u32 = a.parse().ok()?;
    let b: u32 = b.parse().ok()?;
    let year: i32 = year.parse().ok()?;

    NaiveDate::from_ymd_opt(year, a, b)
        .or_else(|| NaiveDate::from_ymd_opt(year, b, a))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical text form of a timestamp, used both when writing rows and when
/// binding date filters, so that equality on stored timestamps holds.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
