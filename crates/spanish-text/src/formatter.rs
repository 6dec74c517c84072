//! Spanish date parsing and formatting

use crate::{Result, TextError};
use chrono::{Datelike, NaiveDate};

/// Spanish month names
pub const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Name of a month (1-12)
///
/// # Examples
/// ```
/// use spanish_text::spanish_month_name;
/// assert_eq!(spanish_month_name(3).unwrap(), "marzo");
/// assert!(spanish_month_name(13).is_err());
/// ```
pub fn spanish_month_name(month: u32) -> Result<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| SPANISH_MONTHS.get(idx as usize))
        .copied()
        .ok_or_else(|| TextError::InvalidDate(format!("month {month} is outside 1-12")))
}

/// Format a date in long Spanish format (e.g., "5 de marzo de 2024")
pub fn format_date(date: NaiveDate) -> String {
    // month() is always 1-12 for a NaiveDate
    let month_name = SPANISH_MONTHS[date.month0() as usize];
    format!("{} de {} de {}", date.day(), month_name, date.year())
}

/// Parse a numeric `dd/mm/yyyy` date; `-` and `.` are accepted as separators
///
/// # Examples
/// ```
/// use spanish_text::parse_numeric_date;
/// let date = parse_numeric_date("05/03/2024").unwrap();
/// assert_eq!(spanish_text::format_date(date), "5 de marzo de 2024");
/// assert!(parse_numeric_date("05/13/2024").is_err());
/// ```
pub fn parse_numeric_date(text: &str) -> Result<NaiveDate> {
    let parts: Vec<&str> = text
        .trim()
        .split(['/', '-', '.'])
        .map(str::trim)
        .collect();

    match parts.as_slice() {
        [day, month, year] => parse_date_parts(day, month, year),
        _ => Err(TextError::InvalidDate(format!(
            "'{text}' is not a dd/mm/yyyy date"
        ))),
    }
}

/// Build a date from separate day, month and year values
///
/// The month may be numeric ("3", "03") or a Spanish month name ("marzo",
/// "Marzo"). Two-digit years are read as 20xx.
pub fn parse_date_parts(day: &str, month: &str, year: &str) -> Result<NaiveDate> {
    let day: u32 = parse_number(day, "day")?;
    let month = parse_month(month)?;
    let mut year: i32 = parse_number(year, "year")?;
    if (0..100).contains(&year) {
        year += 2000;
    }

    spanish_month_name(month)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        TextError::InvalidDate(format!("{day:02}/{month:02}/{year} does not exist"))
    })
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TextError::InvalidDate(format!("invalid {what}: '{value}'")))
}

fn parse_month(value: &str) -> Result<u32> {
    let value = value.trim();
    if value.chars().all(|c| c.is_ascii_digit()) {
        return parse_number(value, "month");
    }
    let lower = value.to_lowercase();
    SPANISH_MONTHS
        .iter()
        .position(|name| *name == lower || (*name == "septiembre" && lower == "setiembre"))
        .map(|idx| idx as u32 + 1)
        .ok_or_else(|| TextError::InvalidDate(format!("unknown month: '{value}'")))
}
