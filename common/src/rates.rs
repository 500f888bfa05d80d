//! Exchange-rate records as published by the CNB daily fixing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Length of a currency code in characters.
pub const CURRENCY_CODE_LEN: usize = 3;

/// One row of the daily fixing: the rate of a single foreign currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Country display name.
    pub country: String,
    /// Currency unit display name.
    pub currency: String,
    /// Unit multiplier the rate applies to (e.g. 100 for "per 100 units").
    pub amount: u32,
    /// Three letter currency code.
    pub code: String,
    /// Local currency per `amount` units of the foreign currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}

impl ExchangeRate {
    /// Create a new exchange rate record.
    pub fn new(
        country: impl Into<String>,
        currency: impl Into<String>,
        amount: u32,
        code: impl Into<String>,
        rate: Decimal,
    ) -> Self {
        Self {
            country: country.into(),
            currency: currency.into(),
            amount,
            code: code.into(),
            rate,
        }
    }

    /// Check whether the record may be shown to users.
    ///
    /// Country, currency and code must be non-blank, the code must be exactly
    /// three characters, and both amount and rate must be positive.
    pub fn is_valid_for_display(&self) -> bool {
        !self.country.trim().is_empty()
            && !self.currency.trim().is_empty()
            && !self.code.trim().is_empty()
            && self.code.chars().count() == CURRENCY_CODE_LEN
            && self.amount > 0
            && self.rate > Decimal::ZERO
    }
}

/// One publication of the daily fixing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateResponse {
    /// Date the rates apply to.
    pub date: NaiveDate,
    /// Publisher's running publication counter.
    pub sequence_number: u32,
    /// Rates in this publication.
    pub rates: Vec<ExchangeRate>,
}

impl ExchangeRateResponse {
    /// Create a new response snapshot.
    pub fn new(date: NaiveDate, sequence_number: u32, rates: Vec<ExchangeRate>) -> Self {
        Self {
            date,
            sequence_number,
            rates,
        }
    }

    /// Number of rates in the publication.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if the publication carries no rates.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
