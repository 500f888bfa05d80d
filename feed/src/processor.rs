//! Post-processing applied to every parsed publication.

use cnb_rates_common::ExchangeRateResponse;
use tracing::debug;

/// Drop rows that fail the display invariant and order the rest by code.
///
/// Codes are compared byte-wise and the sort is stable, so processing an
/// already processed response leaves it unchanged.
pub fn process(response: ExchangeRateResponse) -> ExchangeRateResponse {
    let ExchangeRateResponse {
        date,
        sequence_number,
        rates,
    } = response;

    let total = rates.len();
    let mut rates: Vec<_> = rates
        .into_iter()
        .filter(|rate| rate.is_valid_for_display())
        .collect();
    rates.sort_by(|a, b| a.code.as_bytes().cmp(b.code.as_bytes()));

    if rates.len() != total {
        debug!(
            date = %date,
            dropped = total - rates.len(),
            "Filtered invalid rates during processing"
        );
    }

    ExchangeRateResponse::new(date, sequence_number, rates)
}
