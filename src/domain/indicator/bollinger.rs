//! Bollinger bands: SMA midline, bands at +/- width * rolling sample
//! standard deviation, %b = (close - lower) / (upper - lower).

use super::sma::sma;

#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub mid: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    pub percent_b: Vec<Option<f64>>,
}

pub fn bollinger(closes: &[f64], window: usize, width: f64) -> BollingerSeries {
    let n = closes.len();
    let mid = sma(closes, window);
    let stddev = rolling_stddev(closes, window);

    let mut upper = vec![None; n];
    let mut lower = vec![None; n];
    let mut percent_b = vec![None; n];

    for i in 0..n {
        let (Some(m), Some(s)) = (mid[i], stddev[i]) else {
            continue;
        };
        let up = m + width * s;
        let lo = m - width * s;
        upper[i] = Some(up);
        lower[i] = Some(lo);
        let band = up - lo;
        if band != 0.0 {
            percent_b[i] = Some((closes[i] - lo) / band);
        }
    }

    BollingerSeries {
        mid,
        upper,
        lower,
        percent_b,
    }
}

/// Rolling sample standard deviation (ddof = 1).
fn rolling_stddev(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window < 2 || values.len() < window {
        return out;
    }

    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance =
            slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
        out[i] = Some(variance.sqrt());
    }

    out
}
