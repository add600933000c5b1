//! Identifier validation and date parsing
//!
//! Stadium codes and race numbers are accepted only as well-formed, in-range
//! tokens. Nothing is clamped: `25` is an error, not stadium 24.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScraperError};
use crate::models::{CodeArg, DateArg, RaceDate, RaceNumber, StadiumCode};

/// Number of races held per stadium per day
pub const RACES_PER_DAY: RaceNumber = 12;

/// Number of stadiums
pub const STADIUM_COUNT: StadiumCode = 24;

static STADIUM_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0?[1-9]|1[0-9]|2[0-4])$").expect("stadium code pattern"));

static RACE_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0?[1-9]|1[0-2])$").expect("race number pattern"));

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Validate a single stadium code ("1"-"24", leading zero optional)
pub fn parse_stadium_code(arg: &CodeArg) -> Result<StadiumCode> {
    let text = arg.to_string();
    STADIUM_CODE_PATTERN
        .captures(text.trim())
        .and_then(|caps| caps[1].parse::<StadiumCode>().ok())
        .ok_or_else(|| ScraperError::InvalidStadiumCode(text.clone()))
}

/// Validate a single race number ("1"-"12", leading zero optional)
pub fn parse_race_number(arg: &CodeArg) -> Result<RaceNumber> {
    let text = arg.to_string();
    RACE_NUMBER_PATTERN
        .captures(text.trim())
        .and_then(|caps| caps[1].parse::<RaceNumber>().ok())
        .ok_or_else(|| ScraperError::InvalidRaceNumber(text.clone()))
}

/// Expand an optional race number into the races to fetch.
///
/// Absent means every race of the day, in ascending order.
pub fn resolve_race_numbers(arg: Option<&CodeArg>) -> Result<Vec<RaceNumber>> {
    match arg {
        None => Ok((1..=RACES_PER_DAY).collect()),
        Some(arg) => Ok(vec![parse_race_number(arg)?]),
    }
}

/// Parse a date argument.
///
/// Text may be `YYYYMMDD`, `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD`, a
/// timestamp (the time part is dropped) or one of `today`, `yesterday`,
/// `tomorrow`, which are resolved in Japan Standard Time.
pub fn parse_date(arg: &DateArg) -> Result<RaceDate> {
    match arg {
        DateArg::Date(date) => Ok(RaceDate::new(*date)),
        DateArg::Text(raw) => parse_date_text(raw)
            .map(RaceDate::new)
            .ok_or_else(|| ScraperError::InvalidDate(raw.clone())),
    }
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();

    let today = today_in_japan();
    match text.to_ascii_lowercase().as_str() {
        "today" | "now" => return Some(today),
        "yesterday" => return today.pred_opt(),
        "tomorrow" => return today.succ_opt(),
        _ => {}
    }

    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        let year = text[0..4].parse().ok()?;
        let month = text[4..6].parse().ok()?;
        let day = text[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    {
        return Some(date);
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|datetime| datetime.date())
}

fn today_in_japan() -> NaiveDate {
    (Utc::now() + Duration::hours(9)).date_naive()
}
