//! Display formatting for dates, prices and counters, plus id generation.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (taken as UTC midnight).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT).assume_utc())
}

/// Current UTC time as RFC 3339.
#[must_use]
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH.to_string())
}

/// `2026-10-14` -> `Oct 14, 2026`. Input that does not parse is returned as-is.
#[must_use]
pub fn format_date(raw: &str) -> String {
    let Some(ts) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    ts.format(format_description!(
        "[month repr:short] [day padding:none], [year]"
    ))
    .unwrap_or_else(|_| raw.to_string())
}

#[must_use]
pub fn format_date_time(date: &str, time: Option<&str>) -> String {
    let date = format_date(date);
    match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => format!("{date} - {t}"),
        None => date,
    }
}

/// `None`, empty, zero or unparseable prices render as `Free`.
#[must_use]
pub fn format_price(price: Option<&str>) -> String {
    let parsed = price
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .and_then(|p| p.parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p != 0.0);
    match parsed {
        Some(p) => format!("${p:.2}"),
        None => "Free".to_string(),
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[must_use]
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
