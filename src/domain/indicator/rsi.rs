//! RSI with Wilder smoothing.
//!
//! First averages are simple means over the first `window` price changes,
//! then avg = (prev_avg * (window-1) + current) / window.
//!
//! A zero average loss leaves the ratio undefined, so the output is `None`
//! rather than 100.

pub fn rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 || closes.len() <= window {
        return out;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut avg_gain = gains[..window].iter().sum::<f64>() / window as f64;
    let mut avg_loss = losses[..window].iter().sum::<f64>() / window as f64;
    out[window] = rsi_from_averages(avg_gain, avg_loss);

    for i in (window + 1)..closes.len() {
        let change_idx = i - 1;
        avg_gain = (avg_gain * (window - 1) as f64 + gains[change_idx]) / window as f64;
        avg_loss = (avg_loss * (window - 1) as f64 + losses[change_idx]) / window as f64;
        out[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return None;
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}
