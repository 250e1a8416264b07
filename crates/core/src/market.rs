use crate::indicators::{rsi, RSI_PERIOD};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Marker placed in the decision request when no price data could be fetched.
pub const MARKET_UNAVAILABLE_MARKER: &str = "MARKET DATA UNAVAILABLE";

/// One OHLCV candle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// A non-empty, time-ordered run of candles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candles(Vec<Bar>);

impl Candles {
    /// Orders `bars` by timestamp and keeps the trailing `max_len`.
    /// Returns `None` if nothing is left.
    #[must_use]
    pub fn new(mut bars: Vec<Bar>, max_len: usize) -> Option<Self> {
        bars.sort_by_key(|b| b.timestamp);
        if bars.len() > max_len {
            bars.drain(..bars.len() - max_len);
        }
        (!bars.is_empty()).then_some(Self(bars))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Bar] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last `n` candles (all of them if fewer).
    #[must_use]
    pub fn trailing(&self, n: usize) -> &[Bar] {
        &self.0[self.0.len().saturating_sub(n)..]
    }

    #[must_use]
    pub fn last_close(&self) -> Option<Decimal> {
        self.0.last().map(|b| b.close)
    }

    /// RSI over every close held, `None` when there are too few.
    #[must_use]
    pub fn rsi(&self, period: usize) -> Option<Decimal> {
        let closes: Vec<Decimal> = self.0.iter().map(|b| b.close).collect();
        rsi(&closes, period)
    }
}

/// Recent market data for the instrument, or an explicit marker that it
/// could not be fetched this cycle. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MarketWindow {
    Available(Candles),
    Unavailable { cause: String },
}

impl MarketWindow {
    /// Builds a window from raw bars; an empty result is reported as unavailable.
    #[must_use]
    pub fn from_bars(bars: Vec<Bar>, max_len: usize) -> Self {
        Candles::new(bars, max_len).map_or_else(
            || Self::unavailable("broker returned no candles"),
            Self::Available,
        )
    }

    pub fn unavailable(cause: impl Into<String>) -> Self {
        Self::Unavailable {
            cause: cause.into(),
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Latest close, used as the reference price for order sizing.
    #[must_use]
    pub fn last_close(&self) -> Option<Decimal> {
        match self {
            Self::Available(candles) => candles.last_close(),
            Self::Unavailable { .. } => None,
        }
    }

    /// RSI(14) over the fetched window.
    #[must_use]
    pub fn rsi(&self) -> Option<Decimal> {
        match self {
            Self::Available(candles) => candles.rsi(RSI_PERIOD),
            Self::Unavailable { .. } => None,
        }
    }

    /// Renders the trailing `n` candles as text, oldest first, followed by
    /// the RSI line when the window is long enough for one.
    #[must_use]
    pub fn render(&self, timeframe: &str, n: usize) -> String {
        match self {
            Self::Unavailable { cause } => {
                format!("{MARKET_UNAVAILABLE_MARKER} ({cause}). No price data is available this cycle.")
            }
            Self::Available(candles) => {
                let bars = candles.trailing(n);
                let mut text = format!(
                    "Last {} candles ({timeframe}), oldest first:\ntime | open | high | low | close | volume\n",
                    bars.len()
                );
                for bar in bars {
                    text.push_str(&format!(
                        "{} | {} | {} | {} | {} | {}\n",
                        bar.timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
                        bar.open.normalize(),
                        bar.high.normalize(),
                        bar.low.normalize(),
                        bar.close.normalize(),
                        bar.volume.normalize()
                    ));
                }
                if let Some(value) = candles.rsi(RSI_PERIOD) {
                    text.push_str(&format!(
                        "RSI({RSI_PERIOD}) over the last {} closes: {value}\n",
                        candles.len()
                    ));
                }
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn bar(minute: u32, close: Decimal) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 12, minute, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1),
        }
    }

    #[test]
    fn test_window_is_sorted_and_truncated_to_trailing_bars() {
        let bars = vec![bar(3, dec!(103)), bar(1, dec!(101)), bar(2, dec!(102)), bar(0, dec!(100))];
        let window = MarketWindow::from_bars(bars, 3);
        let MarketWindow::Available(candles) = &window else {
            panic!("expected available window");
        };
        let closes: Vec<Decimal> = candles.as_slice().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![dec!(101), dec!(102), dec!(103)]);
        assert_eq!(window.last_close(), Some(dec!(103)));
    }

    #[test]
    fn test_timestamps_are_non_decreasing() {
        let bars = (0..30).rev().map(|m| bar(m, dec!(1))).collect();
        let MarketWindow::Available(candles) = MarketWindow::from_bars(bars, 30) else {
            panic!("expected available window");
        };
        assert!(candles
            .as_slice()
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_empty_bars_are_unavailable() {
        let window = MarketWindow::from_bars(Vec::new(), 30);
        assert!(!window.is_available());
        assert_eq!(window.last_close(), None);
    }

    #[test]
    fn test_render_uses_trailing_bars_only() {
        let bars = (0..30).map(|m| bar(m, Decimal::from(100 + m))).collect();
        let window = MarketWindow::from_bars(bars, 30);
        let text = window.render("1m", 15);
        assert!(text.starts_with("Last 15 candles (1m)"));
        assert!(text.contains("2026-10-16T12:29:00Z"));
        assert!(text.contains("2026-10-16T12:15:00Z"));
        assert!(!text.contains("2026-10-16T12:14:00Z"));
    }

    #[test]
    fn test_render_appends_rsi_over_whole_window() {
        let bars = (0..30).map(|m| bar(m, Decimal::from(100 + m))).collect();
        let window = MarketWindow::from_bars(bars, 30);
        assert_eq!(window.rsi(), Some(dec!(100)));
        let text = window.render("1m", 15);
        assert!(text.ends_with("RSI(14) over the last 30 closes: 100\n"));
    }

    #[test]
    fn test_short_window_omits_rsi() {
        let bars = (0..14).map(|m| bar(m, Decimal::from(100 + m))).collect();
        let window = MarketWindow::from_bars(bars, 30);
        assert_eq!(window.rsi(), None);
        assert!(!window.render("1m", 15).contains("RSI"));
        assert_eq!(MarketWindow::unavailable("timeout").rsi(), None);
    }

    #[test]
    fn test_render_unavailable_has_marker() {
        let text = MarketWindow::unavailable("timeout").render("1m", 15);
        assert!(text.starts_with(MARKET_UNAVAILABLE_MARKER));
        assert!(text.contains("timeout"));
    }
}
