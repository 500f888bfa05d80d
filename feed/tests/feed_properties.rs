//! Property tests for the feed parser and processor.

use chrono::NaiveDate;
use cnb_rates_common::{ExchangeRate, ExchangeRateResponse, RatesError};
use cnb_rates_feed::parser::{reasons, COLUMN_HEADER};
use cnb_rates_feed::{format_feed, parse, process};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2040, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn rate_strategy() -> impl Strategy<Value = ExchangeRate> {
    (
        "[A-Z][a-z]{1,12}( [A-Z][a-z]{1,8})?",
        "[a-z]{2,10}",
        prop::sample::select(vec![1u32, 100, 1000]),
        "[A-Z]{3}",
        (1i64..100_000_000, 0u32..=3),
    )
        .prop_map(|(country, currency, amount, code, (mantissa, scale))| {
            ExchangeRate::new(country, currency, amount, code, Decimal::new(mantissa, scale))
        })
}

fn response_strategy() -> impl Strategy<Value = ExchangeRateResponse> {
    (
        date_strategy(),
        1u32..10_000,
        prop::collection::vec(rate_strategy(), 1..20),
    )
        .prop_map(|(date, sequence, rates)| ExchangeRateResponse::new(date, sequence, rates))
}

fn invalid_row_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Australia|dollar|1|AUD".to_string()),
        Just("Australia|dollar|1|AUD|23.282|extra".to_string()),
        Just("USA|dollar|0|USD|25.347".to_string()),
        Just("USA|dollar|-1|USD|25.347".to_string()),
        Just("USA|dollar|one|USD|25.347".to_string()),
        Just("USA|dollar|1|USD|0".to_string()),
        Just("USA|dollar|1|USD|-3.1".to_string()),
        Just("USA|dollar|1|USD|25,347".to_string()),
        Just("USA|dollar|1|USD|n/a".to_string()),
        "[a-z ]{1,20}",
    ]
}

fn header() -> String {
    format!("03 Jan 2000 #1\n{}\n", COLUMN_HEADER)
}

proptest! {
    #[test]
    fn prop_format_then_parse_preserves_rates(response in response_strategy()) {
        let feed = format_feed(&response);
        let parsed = parse(Some(feed.as_str())).unwrap();

        prop_assert_eq!(parsed.date, response.date);
        prop_assert_eq!(parsed.sequence_number, response.sequence_number);
        prop_assert_eq!(parsed.rates.len(), response.rates.len());
        for (got, want) in parsed.rates.iter().zip(&response.rates) {
            prop_assert_eq!(&got.country, &want.country);
            prop_assert_eq!(&got.currency, &want.currency);
            prop_assert_eq!(got.amount, want.amount);
            prop_assert_eq!(&got.code, &want.code);
            prop_assert!((got.rate - want.rate).abs() < dec!(0.001));
        }
    }

    #[test]
    fn prop_invalid_rows_are_dropped(
        valid in prop::collection::vec(rate_strategy(), 1..10),
        invalid in prop::collection::vec(invalid_row_strategy(), 0..10),
    ) {
        let mut text = header();
        let mut invalid_iter = invalid.iter();
        for rate in &valid {
            text.push_str(&cnb_rates_feed::format::format_row(rate));
            text.push('\n');
            if let Some(row) = invalid_iter.next() {
                text.push_str(row);
                text.push('\n');
            }
        }
        for row in invalid_iter {
            text.push_str(row);
            text.push('\n');
        }

        let parsed = parse(Some(text.as_str())).unwrap();

        prop_assert_eq!(parsed.rates.len(), valid.len());
    }

    #[test]
    fn prop_all_invalid_rows_fail(invalid in prop::collection::vec(invalid_row_strategy(), 1..10)) {
        let text = format!("{}{}\n", header(), invalid.join("\n"));

        let is_parsing_error = matches!(parse(Some(text.as_str())), Err(RatesError::DataParsing { .. }));
        prop_assert!(is_parsing_error);
    }

    #[test]
    fn prop_malformed_header_rejected(first in "[A-Za-z|,;:]{1,30}") {
        let text = format!("{}\n{}\nAustralia|dollar|1|AUD|23.282\n", first, COLUMN_HEADER);

        let err = parse(Some(text.as_str())).unwrap_err();

        prop_assert_eq!(err.reason(), Some(reasons::INVALID_HEADER));
    }

    #[test]
    fn prop_misplaced_sequence_marker_rejected(
        date in date_strategy(),
        sequence in 1u32..10_000,
        (before, after) in prop::sample::select(vec![("", ""), ("", " "), (" ", " "), ("\t", "\t"), ("", "\t")]),
    ) {
        let first = format!(
            "{}{}#{}{}",
            cnb_rates_common::format_header_date(date),
            before,
            after,
            sequence
        );
        let text = format!("{}\n{}\nAustralia|dollar|1|AUD|23.282\n", first, COLUMN_HEADER);

        let err = parse(Some(text.as_str())).unwrap_err();

        prop_assert_eq!(err.reason(), Some(reasons::INVALID_HEADER));
    }

    #[test]
    fn prop_non_ascii_digits_rejected(
        date in date_strategy(),
        offset in prop::sample::select(vec![0xff10u32, 0x0660, 0x06f0, 0x0966]),
    ) {
        let ascii = cnb_rates_common::format_header_date(date);
        let shifted: String = ascii
            .chars()
            .map(|c| match c.to_digit(10) {
                Some(d) => char::from_u32(offset + d).unwrap(),
                None => c,
            })
            .collect();
        let text = format!("{} #1\n{}\nAustralia|dollar|1|AUD|23.282\n", shifted, COLUMN_HEADER);

        let err = parse(Some(text.as_str())).unwrap_err();

        prop_assert_eq!(err.reason(), Some(reasons::INVALID_HEADER));
    }

    #[test]
    fn prop_whitespace_input_rejected(blank in "[ \t\r\n]{0,20}") {
        let err = parse(Some(blank.as_str())).unwrap_err();

        prop_assert_eq!(err.reason(), Some(reasons::EMPTY_INPUT));
    }

    #[test]
    fn prop_processing_is_idempotent(response in response_strategy()) {
        let once = process(response);
        let twice = process(once.clone());

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_processed_rates_sorted(response in response_strategy()) {
        let processed = process(response);

        prop_assert!(processed.rates.windows(2).all(|w| w[0].code <= w[1].code));
    }
}

#[test]
fn concrete_feed_scenario() {
    let text = "03 Jan 2000 #1\n\
        Country|Currency|Amount|Code|Rate\n\
        Australia|dollar|1|AUD|23.282\n\
        USA|dollar|1|USD|25.347\n";

    let response = process(parse(Some(text)).unwrap());

    assert_eq!(response.date, NaiveDate::from_ymd_opt(2000, 1, 3).unwrap());
    assert_eq!(response.sequence_number, 1);
    let codes: Vec<&str> = response.rates.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["AUD", "USD"]);
}
