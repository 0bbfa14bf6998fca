//! Earthquake bulletin extraction from detail pages
//!
//! A detail page nests exactly three `MsoNormalTable` tables inside an outer
//! table, in this order:
//!
//! | Table | Rows (second cell of each) |
//! |-------|----------------------------|
//! | event | date/time, location with coordinates, depth, origin, magnitude |
//! | intensity | reported intensities |
//! | supplementary | damage expected, aftershocks expected, issued on, prepared by |

use crate::state::EarthquakeEvent;
use chrono::NaiveDateTime;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use thiserror::Error;

const TABLE_SELECTOR: &str = "table table.MsoNormalTable";
const ROW_SELECTOR: &str = "tr";
const VALUE_CELL_SELECTOR: &str = "td:nth-child(2)";

/// Bulletin date formats, tried in order
const DATE_FORMATS: [&str; 4] = [
    "%d %b %Y - %I:%M:%S %p",
    "%d %b %Y - %I:%M %p",
    "%d %B %Y - %I:%M:%S %p",
    "%d %B %Y - %I:%M %p",
];

/// None of the bulletin date formats matched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no valid date format for '{input}'")]
pub struct DateParseError {
    pub input: String,
}

/// A detail page could not be turned into an event
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected 3 bulletin tables, found {found}")]
    TableCount { found: usize },

    #[error("expected {expected} rows in the {table} table, found {found}")]
    RowCount {
        table: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("row {row} of the {table} table has no value cell")]
    MissingCell { table: &'static str, row: usize },

    #[error(transparent)]
    Date(#[from] DateParseError),

    #[error("no coordinates in location '{0}'")]
    Coordinates(String),

    #[error("coordinates out of range: {latitude}, {longitude}")]
    CoordinateRange { latitude: f64, longitude: f64 },

    #[error("no magnitude in '{0}'")]
    Magnitude(String),

    #[error("invalid depth '{0}'")]
    Depth(String),
}

/// Extracts an earthquake event from a parsed detail document
///
/// Any structural mismatch is fatal for this document; callers log it and
/// leave the target unscraped.
pub fn extract_event(document: &Html) -> Result<EarthquakeEvent, ParseError> {
    let tables: Vec<ElementRef> = document.select(&selectors().table).collect();
    let [event_table, intensity_table, extra_table] = tables.as_slice() else {
        return Err(ParseError::TableCount {
            found: tables.len(),
        });
    };

    let event_values = row_values(*event_table, "event")?;
    let [datetime, location, depth, origin, magnitude] = event_values.as_slice() else {
        return Err(ParseError::RowCount {
            table: "event",
            expected: 5,
            found: event_values.len(),
        });
    };

    let intensity = intensity_table
        .select(&selectors().value_cell)
        .next()
        .map(cell_text)
        .ok_or(ParseError::MissingCell {
            table: "intensity",
            row: 1,
        })?;

    let extra_values = row_values(*extra_table, "supplementary")?;
    let [damage, aftershock, issued_on, prepared_by] = extra_values.as_slice() else {
        return Err(ParseError::RowCount {
            table: "supplementary",
            expected: 4,
            found: extra_values.len(),
        });
    };

    let (latitude, longitude) = parse_coordinates(location)?;

    Ok(EarthquakeEvent {
        recorded_at: parse_bulletin_datetime(datetime)?,
        depth: parse_depth(depth)?,
        origin: title_case(origin),
        magnitude: parse_magnitude(magnitude)?,
        latitude,
        longitude,
        damage_expected: parse_expected_flag(damage),
        aftershock_expected: parse_expected_flag(aftershock),
        intensity,
        issued_on: parse_bulletin_datetime(issued_on)?,
        prepared_by: prepared_by.clone(),
    })
}

/// Parses a bulletin date such as `05 Jan 2023 - 02:30:15 PM`
pub fn parse_bulletin_datetime(input: &str) -> Result<NaiveDateTime, DateParseError> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| {
            tracing::warn!("No valid date format for {} found", input);
            DateParseError {
                input: input.to_string(),
            }
        })
}

/// Extracts latitude and longitude from a location string
///
/// Only the part before the first `-` is considered, which drops the
/// "N km S 45° W of ..." description that follows the coordinates.
pub fn parse_coordinates(location: &str) -> Result<(f64, f64), ParseError> {
    static COORDINATES: OnceLock<Regex> = OnceLock::new();
    let pattern = COORDINATES.get_or_init(|| {
        Regex::new(r"(\d+\.\d+|\d+)[^\d,]*, (\d+\.\d+|\d+)").expect("valid coordinate pattern")
    });

    let head = location.split('-').next().unwrap_or_default();
    let captures = pattern
        .captures(head)
        .ok_or_else(|| ParseError::Coordinates(location.trim().to_string()))?;

    let number = |i: usize| -> Result<f64, ParseError> {
        captures[i]
            .parse::<f64>()
            .map_err(|_| ParseError::Coordinates(location.trim().to_string()))
    };
    let (latitude, longitude) = (number(1)?, number(2)?);

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(ParseError::CoordinateRange {
            latitude,
            longitude,
        });
    }

    Ok((latitude, longitude))
}

/// Extracts the leading number of a magnitude string such as `4.6 (Ms)`
pub fn parse_magnitude(input: &str) -> Result<f64, ParseError> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let pattern = NUMBER.get_or_init(|| Regex::new(r"\d+\.\d+|\d+").expect("valid number pattern"));

    pattern
        .find(input)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| ParseError::Magnitude(input.trim().to_string()))
}

/// Parses a depth in kilometres; anything but a plain integer is rejected
pub fn parse_depth(input: &str) -> Result<u32, ParseError> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::Depth(input.trim().to_string()))
}

/// `false` only for an explicit "no"; any other answer counts as expected
pub fn parse_expected_flag(input: &str) -> bool {
    !input.trim().eq_ignore_ascii_case("no")
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest
///
/// `"DAVAO ORIENTAL (MATI CITY)"` becomes `"Davao Oriental (Mati City)"`.
pub fn title_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut in_word = false;

    for c in input.trim().chars() {
        if c.is_alphabetic() {
            if in_word {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            result.push(c);
            in_word = false;
        }
    }

    result
}

/// Trimmed text of each row's value cell
fn row_values(table: ElementRef, name: &'static str) -> Result<Vec<String>, ParseError> {
    table
        .select(&selectors().row)
        .enumerate()
        .map(|(i, row)| {
            row.select(&selectors().value_cell)
                .next()
                .map(cell_text)
                .ok_or(ParseError::MissingCell {
                    table: name,
                    row: i + 1,
                })
        })
        .collect()
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

struct BulletinSelectors {
    table: Selector,
    row: Selector,
    value_cell: Selector,
}

fn selectors() -> &'static BulletinSelectors {
    static SELECTORS: OnceLock<BulletinSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| BulletinSelectors {
        table: Selector::parse(TABLE_SELECTOR).expect("valid table selector"),
        row: Selector::parse(ROW_SELECTOR).expect("valid row selector"),
        value_cell: Selector::parse(VALUE_CELL_SELECTOR).expect("valid cell selector"),
    })
}
