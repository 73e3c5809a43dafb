use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use plateful_core::models::{Day, Entry, MealType};

const SHORT_DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thur", "Fri", "Sat"];
const SHORT_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "April", "May", "June", "July", "Aug", "Sept", "Oct", "Nov", "Dec",
];

pub(crate) fn ordinal_suffix(day: u32) -> &'static str {
    if (4..=20).contains(&day) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Header line like `Sat, Oct 17th, 2026 14:05`.
pub(crate) fn date_header<T: Datelike + Timelike>(now: &T) -> String {
    let day_name = SHORT_DAYS[now.weekday().num_days_from_sunday() as usize];
    let month_name = SHORT_MONTHS[now.month0() as usize];
    let date = now.day();
    let suffix = ordinal_suffix(date);
    let year = now.year();
    let hours = now.hour();
    let minutes = now.minute();
    format!("{day_name}, {month_name} {date}{suffix}, {year} {hours:02}:{minutes:02}")
}

pub(crate) fn print_date_header() {
    println!("{}\n", date_header(&Local::now()));
}

/// Parse a day name, defaulting to today's weekday.
pub(crate) fn parse_day(day: Option<&str>) -> Result<Day> {
    match day {
        None | Some("today") => Ok(Day::from_weekday(Local::now().weekday())),
        Some(s) => s.parse(),
    }
}

pub(crate) fn parse_meal(meal: &str) -> Result<MealType> {
    meal.parse()
}

pub(crate) fn prompt_confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N]: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub(crate) fn print_entry_table<'a>(entries: impl IntoIterator<Item = &'a Entry>) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "Day")]
        day: &'static str,
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Meal")]
        meal: &'static str,
        #[tabled(rename = "Calories")]
        calories: u32,
        #[tabled(rename = "ID")]
        id: u64,
    }

    let rows: Vec<EntryRow> = entries
        .into_iter()
        .map(|e| EntryRow {
            day: e.day.label(),
            food: truncate(&e.food, 35),
            meal: e.meal.label(),
            calories: e.calories,
            id: e.id,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_ordinal_suffix() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(4), "th");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(21), "st");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(23), "rd");
        assert_eq!(ordinal_suffix(30), "th");
        assert_eq!(ordinal_suffix(31), "st");
    }

    #[test]
    fn test_date_header() {
        let t = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(date_header(&t), "Sat, Oct 17th, 2026 14:05");

        let t = NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(date_header(&t), "Mon, Sept 2nd, 2024 08:30");

        let t = NaiveDate::from_ymd_opt(2025, 1, 23)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(date_header(&t), "Thur, Jan 23rd, 2025 00:00");
    }

    #[test]
    fn test_parse_day_default_is_today() {
        let today = Day::from_weekday(Local::now().weekday());
        assert_eq!(parse_day(None).unwrap(), today);
        assert_eq!(parse_day(Some("today")).unwrap(), today);
        assert_eq!(parse_day(Some("wed")).unwrap(), Day::Wednesday);
        assert!(parse_day(Some("someday")).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        // Should not panic on multi-byte characters
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("日清カップヌードル", 8), "日清カップ...");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("boom"), r#"{"error":"boom"}"#);
    }
}
