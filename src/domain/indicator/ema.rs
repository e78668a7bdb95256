//! Exponential moving average.
//!
//! alpha = 2/(span+1), seeded with the SMA of the first `span` observations,
//! then EMA[i] = x[i]*alpha + EMA[i-1]*(1-alpha). No partial averages are
//! produced before `span` observations exist.

pub fn ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    ema_over_options(&wrapped, span)
}

/// EMA over a series with an undefined prefix (for smoothing derived series
/// such as the MACD dif line). Seeding waits for `span` defined observations;
/// a defined value never follows an undefined one in our inputs.
pub fn ema_over_options(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if span == 0 {
        return out;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut seen = 0usize;
    let mut sum = 0.0;
    let mut state: Option<f64> = None;

    for (i, value) in values.iter().enumerate() {
        let Some(x) = value else { continue };

        match state {
            None => {
                seen += 1;
                sum += x;
                if seen == span {
                    let seed = sum / span as f64;
                    state = Some(seed);
                    out[i] = Some(seed);
                }
            }
            Some(prev) => {
                let next = x * alpha + prev * (1.0 - alpha);
                state = Some(next);
                out[i] = Some(next);
            }
        }
    }

    out
}
