use crate::models::ParseOutcome;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Format of the single timestamp column (`Time`).
pub const COMBINED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the separate time column (`Zeit`).
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Parse a float that may use comma as decimal separator
pub fn parse_locale_float(s: &str) -> Result<f64, std::num::ParseFloatError> {
    s.trim().replace(',', ".").parse::<f64>()
}

/// Temperature channel: comma-decimal text narrowed to single precision, zero on failure.
pub fn parse_temperature(s: &str) -> ParseOutcome<f32> {
    match parse_locale_float(s) {
        Ok(v) if (v as f32).is_finite() => ParseOutcome::Parsed(v as f32),
        _ => ParseOutcome::Defaulted(0.0),
    }
}

/// Output channel: integer text, zero on failure or overflow.
pub fn parse_output(s: &str) -> ParseOutcome<i64> {
    match s.trim().parse::<i64>() {
        Ok(v) => ParseOutcome::Parsed(v),
        Err(_) => ParseOutcome::Defaulted(0),
    }
}

/// Timestamp substituted for text that does not parse.
pub fn epoch() -> DateTime<Local> {
    DateTime::<Utc>::UNIX_EPOCH.with_timezone(&Local)
}

/// Resolves a wall-clock time in `tz`.
///
/// A DST fold picks the earlier instant. A time inside a spring-forward gap is
/// moved forward by the hour the clocks skipped, so 02:30 becomes 03:30.
pub fn resolve_wall_clock<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(Duration::hours(1))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}

/// [`resolve_wall_clock`] in the process's local zone.
pub fn local_from_naive(naive: &NaiveDateTime) -> Option<DateTime<Local>> {
    resolve_wall_clock(&Local, naive)
}

/// `YYYY-MM-DD HH:MM:SS` in local time.
pub fn parse_combined_timestamp(s: &str) -> ParseOutcome<DateTime<Local>> {
    NaiveDateTime::parse_from_str(s.trim(), COMBINED_TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| local_from_naive(&naive))
        .map_or_else(|| ParseOutcome::Defaulted(epoch()), ParseOutcome::Parsed)
}

/// `DD.MM.YY` + `HH:MM:SS` in local time; the two-digit year is always 20YY.
pub fn parse_split_timestamp(date: &str, time: &str) -> ParseOutcome<DateTime<Local>> {
    let naive = parse_short_date(date).and_then(|d| {
        NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
            .ok()
            .map(|t| d.and_time(t))
    });
    naive
        .and_then(|n| local_from_naive(&n))
        .map_or_else(|| ParseOutcome::Defaulted(epoch()), ParseOutcome::Parsed)
}

fn parse_short_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().split('.');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || day.len() != 2 || month.len() != 2 || year.len() != 2 {
        return None;
    }
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !(digits(day) && digits(month) && digits(year)) {
        return None;
    }
    NaiveDate::from_ymd_opt(
        2000 + year.parse::<i32>().ok()?,
        month.parse().ok()?,
        day.parse().ok()?,
    )
}
