use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_english::{Dialect, parse_date_string};

use crate::error::{AppError, AppResult};

/// Resolve a date string and a time string to one local instant. The
/// extractor is asked for `YYYY-MM-DD` / `HH:MM`, so that pair is tried
/// verbatim first; anything else ("tomorrow", "3 PM") goes through the
/// natural-language parser anchored at `anchor`.
pub fn resolve(date: &str, time: &str, anchor: DateTime<Local>) -> AppResult<NaiveDateTime> {
    if let Some(parsed) = parse_strict(date.trim(), time.trim()) {
        return Ok(parsed);
    }

    let combined = normalize(&format!("{} {}", date.trim(), time.trim()));
    parse_date_string(&combined, anchor, Dialect::Us)
        .map(|parsed| parsed.naive_local())
        .map_err(|_| {
            AppError::Parse(format!(
                "could not resolve `{date} {time}` to a date and time"
            ))
        })
}

/// ISO-8601 without offset, the format the calendar payload carries
/// alongside an explicit time zone name.
pub fn to_iso(instant: &NaiveDateTime) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn parse_strict(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    Some(date.and_time(time))
}

/// Lowercase and glue meridiem suffixes onto their hour ("3 PM" → "3pm")
/// so the natural-language parser sees the token shape it expects.
fn normalize(input: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();

    for raw in input.split_whitespace() {
        let lower = raw.to_lowercase();
        let meridiem = match lower.as_str() {
            "am" | "a.m." => Some("am"),
            "pm" | "p.m." => Some("pm"),
            _ => None,
        };

        if let (Some(suffix), Some(prev)) = (meridiem, tokens.last_mut()) {
            if prev.ends_with(|ch: char| ch.is_ascii_digit()) {
                prev.push_str(suffix);
                continue;
            }
        }

        tokens.push(lower);
    }

    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone, Timelike};

    use super::*;

    fn anchor() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).single().expect("anchor")
    }

    #[test]
    fn strict_pair_resolves_without_anchor_influence() {
        let parsed = resolve("2026-08-08", "15:00", anchor()).expect("resolved");
        assert_eq!(to_iso(&parsed), "2026-08-08T15:00:00");
    }

    #[test]
    fn strict_pair_accepts_seconds() {
        let parsed = resolve("2026-08-08", "15:00:30", anchor()).expect("resolved");
        assert_eq!(to_iso(&parsed), "2026-08-08T15:00:30");
    }

    #[test]
    fn tomorrow_afternoon_resolves_relative_to_anchor() {
        let parsed = resolve("tomorrow", "3 PM", anchor()).expect("resolved");
        assert_eq!(parsed.date().day(), 8);
        assert_eq!(parsed.date().month(), 8);
        assert_eq!(parsed.time().hour(), 15);
        assert_eq!(parsed.time().minute(), 0);
    }

    #[test]
    fn garbage_input_fails_with_parse_error() {
        let result = resolve("not a date", "whenever", anchor());
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn normalizes_meridiem_spacing() {
        assert_eq!(normalize("tomorrow 3 PM"), "tomorrow 3pm");
        assert_eq!(normalize("Friday 10 a.m."), "friday 10am");
        assert_eq!(normalize("15:00"), "15:00");
    }
}
