//! Technical indicators over candle closes.

use rust_decimal::Decimal;

/// Lookback of the RSI line included in decision requests.
pub const RSI_PERIOD: usize = 14;

/// Relative Strength Index at the last close, with Wilder smoothing.
///
/// RSI = 100 - 100 / (1 + avg_gain / avg_loss), seeded with the simple
/// average of the first `period` changes.
/// Needs `period + 1` closes and returns `None` with fewer.
/// Edge cases: avg_loss == 0 → 100; avg_gain == 0 → 0; no movement → 50.
#[must_use]
pub fn rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let n = Decimal::from(period);
    let gain = |change: Decimal| change.max(Decimal::ZERO);
    let loss = |change: Decimal| (-change).max(Decimal::ZERO);

    let mut changes = closes.windows(2).map(|w| w[1] - w[0]);
    let (mut avg_gain, mut avg_loss) = changes
        .by_ref()
        .take(period)
        .fold((Decimal::ZERO, Decimal::ZERO), |(g, l), c| (g + gain(c), l + loss(c)));
    avg_gain /= n;
    avg_loss /= n;

    let prior = n - Decimal::ONE;
    for change in changes {
        avg_gain = (avg_gain * prior + gain(change)) / n;
        avg_loss = (avg_loss * prior + loss(change)) / n;
    }

    let hundred = Decimal::ONE_HUNDRED;
    let value = if avg_loss.is_zero() && avg_gain.is_zero() {
        Decimal::from(50)
    } else if avg_loss.is_zero() {
        hundred
    } else {
        hundred - hundred / (Decimal::ONE + avg_gain / avg_loss)
    };
    Some(value.round_dp(2))
}
