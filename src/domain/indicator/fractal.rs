//! Simplified swing-point (fractal) detection.
//!
//! A bar is a top when its high strictly exceeds the two preceding highs and
//! is >= the two following highs; bottoms mirror the rule on lows. Two bars
//! of lookahead are required, so the final two bars are never classified.

use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone)]
pub struct FractalFlags {
    pub tops: Vec<bool>,
    pub bottoms: Vec<bool>,
}

pub fn fractals(bars: &[PriceBar]) -> FractalFlags {
    let n = bars.len();
    let mut tops = vec![false; n];
    let mut bottoms = vec![false; n];

    if n < 5 {
        return FractalFlags { tops, bottoms };
    }

    for i in 2..n - 2 {
        let h = bars[i].high;
        tops[i] = h > bars[i - 1].high
            && h > bars[i - 2].high
            && h >= bars[i + 1].high
            && h >= bars[i + 2].high;

        let l = bars[i].low;
        bottoms[i] = l < bars[i - 1].low
            && l < bars[i - 2].low
            && l <= bars[i + 1].low
            && l <= bars[i + 2].low;
    }

    FractalFlags { tops, bottoms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(highs: &[f64]) -> Vec<PriceBar> {
        highs
            .iter()
            .enumerate()
            .map(|(i, &high)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: high - 1.0,
                high,
                low: high - 2.0,
                close: high - 1.0,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn detects_local_top() {
        let bars = make_bars(&[10.0, 11.0, 15.0, 12.0, 11.0, 10.0, 9.0]);
        let flags = fractals(&bars);
        assert!(flags.tops[2]);
        assert!(!flags.tops[1]);
        assert!(!flags.tops[3]);
    }

    #[test]
    fn detects_local_bottom() {
        // lows are high - 2, so the dip in highs is also a dip in lows
        let bars = make_bars(&[15.0, 13.0, 10.0, 13.0, 15.0, 16.0, 17.0]);
        let flags = fractals(&bars);
        assert!(flags.bottoms[2]);
    }

    #[test]
    fn last_two_bars_never_classified() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 25.0, 24.0]);
        let flags = fractals(&bars);
        let n = bars.len();
        assert!(!flags.tops[n - 1] && !flags.tops[n - 2]);
        assert!(!flags.bottoms[n - 1] && !flags.bottoms[n - 2]);
    }

    #[test]
    fn flat_plateau_top_allows_equal_followers() {
        // strict rise before, equal highs after: still a top
        let bars = make_bars(&[10.0, 11.0, 14.0, 14.0, 14.0, 13.0, 12.0]);
        let flags = fractals(&bars);
        assert!(flags.tops[2]);
        // bar 3 fails the strict-greater-than-preceding test
        assert!(!flags.tops[3]);
    }

    #[test]
    fn short_series_has_no_fractals() {
        let bars = make_bars(&[10.0, 20.0, 10.0]);
        let flags = fractals(&bars);
        assert!(!flags.tops.iter().any(|&t| t));
        assert!(!flags.bottoms.iter().any(|&b| b));
    }

    #[test]
    fn output_lengths_match_input() {
        let bars = make_bars(&[10.0; 9]);
        let flags = fractals(&bars);
        assert_eq!(flags.tops.len(), 9);
        assert_eq!(flags.bottoms.len(), 9);
    }
}
