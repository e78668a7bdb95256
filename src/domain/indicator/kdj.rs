//! KDJ stochastic oscillator.
//!
//! RSV = (close - lowest_low) / (highest_high - lowest_low) * 100 over the
//! last n bars, undefined when the window range is zero. K smooths RSV with
//! alpha = 1/3 recursively, D smooths K the same way, J = 3K - 2D. K seeds
//! with the first defined RSV; zero-range bars carry the previous K forward.

use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone)]
pub struct KdjSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
    pub j: Vec<Option<f64>>,
}

pub fn kdj(bars: &[PriceBar], window: usize) -> KdjSeries {
    let n = bars.len();
    let mut k_out = vec![None; n];
    let mut d_out = vec![None; n];
    let mut j_out = vec![None; n];
    if window == 0 {
        return KdjSeries {
            k: k_out,
            d: d_out,
            j: j_out,
        };
    }

    let mut k_state: Option<f64> = None;
    let mut d_state: Option<f64> = None;

    for i in 0..n {
        if i + 1 < window {
            continue;
        }
        let slice = &bars[i + 1 - window..=i];
        let highest = slice.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = slice.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let range = highest - lowest;

        let rsv = if range == 0.0 {
            None
        } else {
            Some((bars[i].close - lowest) / range * 100.0)
        };

        let k = match (k_state, rsv) {
            (None, None) => continue,
            (None, Some(rsv)) => rsv,
            (Some(prev), None) => prev,
            (Some(prev), Some(rsv)) => (2.0 * prev + rsv) / 3.0,
        };
        let d = match d_state {
            None => k,
            Some(prev) => (2.0 * prev + k) / 3.0,
        };

        k_state = Some(k);
        d_state = Some(d);
        k_out[i] = Some(k);
        d_out[i] = Some(d);
        j_out[i] = Some(3.0 * k - 2.0 * d);
    }

    KdjSeries {
        k: k_out,
        d: d_out,
        j: j_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, (day / 28) + 1, (day % 28) + 1).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    fn trending_bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64;
                make_bar(i as u32, base + 2.0, base - 2.0, base + 1.0)
            })
            .collect()
    }

    #[test]
    fn kdj_warmup() {
        let series = kdj(&trending_bars(15), 9);
        for i in 0..8 {
            assert!(series.k[i].is_none());
            assert!(series.d[i].is_none());
            assert!(series.j[i].is_none());
        }
        assert!(series.k[8].is_some());
    }

    #[test]
    fn kdj_j_identity() {
        let series = kdj(&trending_bars(20), 9);
        for i in 8..20 {
            let k = series.k[i].unwrap();
            let d = series.d[i].unwrap();
            assert_relative_eq!(series.j[i].unwrap(), 3.0 * k - 2.0 * d);
        }
    }

    #[test]
    fn kdj_seed_is_first_rsv() {
        let bars = trending_bars(10);
        let series = kdj(&bars, 9);
        // window [0..9): high 110, low 98, close 108 -> rsv = 10/12*100
        let slice = &bars[0..9];
        let hi = slice.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lo = slice.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let rsv = (bars[8].close - lo) / (hi - lo) * 100.0;
        assert_relative_eq!(series.k[8].unwrap(), rsv);
        assert_relative_eq!(series.d[8].unwrap(), rsv);
    }

    #[test]
    fn kdj_zero_range_carries_previous() {
        let mut bars = trending_bars(12);
        // freeze the last 9+ bars to a single price point
        for bar in bars.iter_mut().skip(2) {
            bar.high = 100.0;
            bar.low = 100.0;
            bar.close = 100.0;
            bar.open = 100.0;
        }
        let series = kdj(&bars, 9);
        // bars 10 and 11 have a zero-range window; K holds its last value
        if let (Some(prev), Some(curr)) = (series.k[10], series.k[11]) {
            assert_relative_eq!(prev, curr);
        }
    }

    #[test]
    fn kdj_zero_range_from_start_stays_undefined() {
        let bars: Vec<PriceBar> = (0..12).map(|i| make_bar(i, 100.0, 100.0, 100.0)).collect();
        let series = kdj(&bars, 9);
        assert!(series.k.iter().all(Option::is_none));
    }

    #[test]
    fn kdj_lengths_match_input() {
        let series = kdj(&trending_bars(25), 9);
        assert_eq!(series.k.len(), 25);
        assert_eq!(series.d.len(), 25);
        assert_eq!(series.j.len(), 25);
    }
}
