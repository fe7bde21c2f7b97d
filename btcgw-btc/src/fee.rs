//! Fee arithmetic on decimal BTC strings.
//!
//! Bitcoin Core reports and accepts amounts as decimal strings with eight
//! fractional digits; the subtraction happens in integer satoshi so the
//! result re-formats exactly.

use crate::error::{BtcError, Result};

const SAT_PER_BTC: f64 = 100_000_000.0;

/// Subtract `fee_sat` from `balance` (a decimal BTC string) and return the
/// remainder formatted with eight fractional digits.
///
/// Fails with [`BtcError::NotEnoughBalance`] when the result would be
/// negative.
pub fn calc_fee(balance: &str, fee_sat: u64) -> Result<String> {
    let bal: f64 = balance
        .trim()
        .parse()
        .map_err(|_| BtcError::FailedToDecode(format!("balance is not a number: {balance}")))?;
    let sats = (bal * SAT_PER_BTC) as i64 - fee_sat as i64;
    if sats < 0 {
        return Err(BtcError::NotEnoughBalance(format_btc(
            sats as f64 / SAT_PER_BTC,
        )));
    }
    Ok(format_btc(sats as f64 / SAT_PER_BTC))
}

/// Format a BTC amount with eight fractional digits.
pub fn format_btc(amount: f64) -> String {
    format!("{amount:.8}")
}
