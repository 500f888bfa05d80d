//! Parser for the CNB daily fixing text format.
//!
//! A publication looks like this:
//!
//! ```text
//! 03 Jan 2000 #1
//! Country|Currency|Amount|Code|Rate
//! Australia|dollar|1|AUD|23.282
//! USA|dollar|1|USD|25.347
//! ```
//!
//! A broken header rejects the whole publication. A broken data row is
//! dropped and recorded, and parsing carries on with the remaining rows.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use cnb_rates_common::{ExchangeRate, ExchangeRateResponse, RatesError, RatesResult};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Fatal parsing reasons carried by [`RatesError::DataParsing`].
pub mod reasons {
    pub const EMPTY_INPUT: &str = "empty input";
    pub const TOO_FEW_LINES: &str = "too few lines";
    pub const INVALID_HEADER: &str = "invalid header format";
    pub const UNPARSEABLE_DATE: &str = "unparseable date";
    pub const INVALID_SEQUENCE: &str = "invalid sequence number";
    pub const NO_VALID_RATES: &str = "no valid rates found";
}

/// Separator between the fields of a data row.
pub const FIELD_SEPARATOR: char = '|';

/// Number of fields in a data row.
pub const FIELD_COUNT: usize = 5;

/// Column header line as the publisher writes it.
pub const COLUMN_HEADER: &str = "Country|Currency|Amount|Code|Rate";

/// Header date layouts, tried in order.
const DATE_LAYOUTS: &[&str] = &["%d %b %Y", "%d.%b.%Y"];

static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<date>[0-9]{1,2}(?:\.|[ \t]+)[A-Za-z]{3}(?:\.|[ \t]+)[0-9]{4})[ \t]+#(?P<seq>\S+)$")
        .expect("header pattern is a valid regex")
});

/// Identity of a publication, taken from its header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedHeader {
    pub date: NaiveDate,
    pub sequence_number: u32,
}

/// Why a single data row was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// The row did not split into exactly five fields.
    WrongFieldCount(usize),
    /// The amount field is not a positive integer.
    InvalidAmount(String),
    /// The rate field is not a positive decimal.
    InvalidRate(String),
    /// The row parsed but fails the display invariant.
    InvalidRecord,
}

impl RowError {
    /// Short classification of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::WrongFieldCount(_) => "wrong field count",
            RowError::InvalidAmount(_) => "invalid amount",
            RowError::InvalidRate(_) => "invalid rate",
            RowError::InvalidRecord => "invalid record",
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::WrongFieldCount(found) => {
                write!(f, "{}: expected {}, got {}", self.kind(), FIELD_COUNT, found)
            }
            RowError::InvalidAmount(value) | RowError::InvalidRate(value) => {
                write!(f, "{} '{}'", self.kind(), value)
            }
            RowError::InvalidRecord => f.write_str(self.kind()),
        }
    }
}

/// A dropped data row and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// 1-based line number within the raw input.
    pub line: usize,
    pub reason: RowError,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Parsed publication together with the rows that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    pub response: ExchangeRateResponse,
    pub rejected: Vec<RowRejection>,
}

/// Parse a raw feed payload into a publication.
pub fn parse(raw: Option<&str>) -> RatesResult<ExchangeRateResponse> {
    parse_report(raw).map(|report| report.response)
}

/// Parse a raw feed payload, keeping the list of dropped rows.
pub fn parse_report(raw: Option<&str>) -> RatesResult<ParseReport> {
    let raw = raw
        .map(|text| text.trim_start_matches('\u{feff}'))
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| RatesError::parsing(reasons::EMPTY_INPUT))?;

    let lines: Vec<(usize, &str)> = raw
        .lines()
        .enumerate()
        .map(|(idx, text)| (idx + 1, text))
        .filter(|(_, text)| !text.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(RatesError::parsing(reasons::TOO_FEW_LINES));
    }

    let header = parse_header(lines[0].1)?;

    // Header and column header alone carry no rates.
    if lines.len() < 3 {
        return Err(RatesError::parsing(reasons::TOO_FEW_LINES));
    }

    let mut rates = Vec::with_capacity(lines.len() - 2);
    let mut rejected = Vec::new();

    for &(line, text) in &lines[2..] {
        match parse_row(text) {
            Ok(rate) => rates.push(rate),
            Err(reason) => {
                warn!(line, reason = %reason, "Dropping malformed feed row");
                rejected.push(RowRejection { line, reason });
            }
        }
    }

    if rates.is_empty() {
        return Err(RatesError::parsing_with_rows(
            reasons::NO_VALID_RATES,
            rejected.iter().map(ToString::to_string).collect(),
        ));
    }

    debug!(
        date = %header.date,
        sequence = header.sequence_number,
        rows = rates.len(),
        rejected = rejected.len(),
        "Parsed feed"
    );

    Ok(ParseReport {
        response: ExchangeRateResponse::new(header.date, header.sequence_number, rates),
        rejected,
    })
}

/// Parse the header line, e.g. `03 Jan 2000 #1`.
pub fn parse_header(line: &str) -> RatesResult<FeedHeader> {
    let caps = HEADER_PATTERN
        .captures(line.trim())
        .ok_or_else(|| RatesError::parsing(reasons::INVALID_HEADER))?;

    let date = parse_header_date(&caps["date"])
        .ok_or_else(|| RatesError::parsing(reasons::UNPARSEABLE_DATE))?;

    let sequence_number = parse_positive_int(&caps["seq"])
        .ok_or_else(|| RatesError::parsing(reasons::INVALID_SEQUENCE))?;

    Ok(FeedHeader {
        date,
        sequence_number,
    })
}

fn parse_header_date(token: &str) -> Option<NaiveDate> {
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(token, layout).ok())
}

/// Parse one data row, e.g. `Australia|dollar|1|AUD|23.282`.
pub fn parse_row(line: &str) -> Result<ExchangeRate, RowError> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();

    let &[country, currency, amount, code, rate] = fields.as_slice() else {
        return Err(RowError::WrongFieldCount(fields.len()));
    };

    let amount_value =
        parse_positive_int(amount).ok_or_else(|| RowError::InvalidAmount(amount.to_string()))?;
    let rate_value =
        parse_positive_decimal(rate).ok_or_else(|| RowError::InvalidRate(rate.to_string()))?;

    let record = ExchangeRate::new(country, currency, amount_value, code, rate_value);
    if !record.is_valid_for_display() {
        return Err(RowError::InvalidRecord);
    }

    Ok(record)
}

fn parse_positive_int(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u32>().ok().filter(|n| *n > 0)
}

// Only digits and a single '.' are accepted, whatever the host locale.
fn parse_positive_decimal(value: &str) -> Option<Decimal> {
    let well_formed = value.bytes().any(|b| b.is_ascii_digit())
        && value.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && value.bytes().filter(|b| *b == b'.').count() <= 1;
    if !well_formed {
        return None;
    }
    Decimal::from_str(value).ok().filter(|d| *d > Decimal::ZERO)
}
