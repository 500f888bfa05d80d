//! Writes publications back into the CNB text format.

use cnb_rates_common::{format_header_date, ExchangeRate, ExchangeRateResponse};
use tracing::debug;

use crate::parser::{COLUMN_HEADER, FIELD_SEPARATOR};

/// Render a publication in the feed format understood by [`crate::parser::parse`].
///
/// The format has no escaping, so rows whose text fields contain the field
/// separator, a line break, or surrounding whitespace are left out. Every
/// written row parses back to the same values.
pub fn format_feed(response: &ExchangeRateResponse) -> String {
    let mut out = format!(
        "{} #{}\n{}\n",
        format_header_date(response.date),
        response.sequence_number,
        COLUMN_HEADER
    );
    for rate in &response.rates {
        if !is_representable(rate) {
            debug!(code = %rate.code, "Skipping row the feed format cannot carry");
            continue;
        }
        out.push_str(&format_row(rate));
        out.push('\n');
    }
    out
}

/// Check that a record's text fields survive being written as one row.
pub fn is_representable(rate: &ExchangeRate) -> bool {
    [&rate.country, &rate.currency, &rate.code].into_iter().all(|field| {
        field.trim() == field.as_str()
            && !field.contains(|c: char| c == FIELD_SEPARATOR || c == '\n' || c == '\r')
    })
}

/// Render a single data row.
pub fn format_row(rate: &ExchangeRate) -> String {
    let sep = FIELD_SEPARATOR;
    format!(
        "{}{sep}{}{sep}{}{sep}{}{sep}{}",
        rate.country, rate.currency, rate.amount, rate.code, rate.rate
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_feed() {
        let response = ExchangeRateResponse::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            10,
            vec![
                ExchangeRate::new("Australia", "dollar", 1, "AUD", dec!(15.118)),
                ExchangeRate::new("Hungary", "forint", 100, "HUF", dec!(6.512)),
            ],
        );

        assert_eq!(
            format_feed(&response),
            "15 Jan 2024 #10\n\
             Country|Currency|Amount|Code|Rate\n\
             Australia|dollar|1|AUD|15.118\n\
             Hungary|forint|100|HUF|6.512\n"
        );
    }

    #[test]
    fn test_unrepresentable_rows_skipped() {
        let response = ExchangeRateResponse::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            10,
            vec![
                ExchangeRate::new("Bosnia|Herzegovina", "mark", 1, "BAM", dec!(12.4)),
                ExchangeRate::new(" USA ", "dollar", 1, "USD", dec!(22.476)),
                ExchangeRate::new("Korea", "won\n", 100, "KRW", dec!(1.72)),
                ExchangeRate::new("Australia", "dollar", 1, "AUD", dec!(15.118)),
            ],
        );

        let text = format_feed(&response);
        let parsed = crate::parser::parse(Some(text.as_str())).unwrap();

        assert_eq!(parsed.rates, vec![response.rates[3].clone()]);
        assert!(is_representable(&response.rates[3]));
        assert!(!is_representable(&response.rates[0]));
    }
}
