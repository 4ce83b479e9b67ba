//! Exponential moving average recurrence.
//!
//! k = 2/(n+1), seeded with the first input, then EMA[i] = x[i]*k + EMA[i-1]*(1-k).
//! Used by MACD for the fast, slow and signal lines.

/// Raw EMA over `values`, seeded with `values[0]`. Defined for every index.
pub fn ema_recurrence(values: &[f64], period: usize) -> Vec<f64> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &v in values {
        let ema = match prev {
            None => v,
            Some(p) => v * k + p * (1.0 - k),
        };
        out.push(ema);
        prev = Some(ema);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seeded_with_first_value() {
        let raw = ema_recurrence(&[10.0, 20.0, 30.0], 3);
        let k = 0.5;
        assert!((raw[0] - 10.0).abs() < f64::EPSILON);
        assert!((raw[1] - (20.0 * k + 10.0 * (1.0 - k))).abs() < f64::EPSILON);
        assert!((raw[2] - (30.0 * k + 15.0 * (1.0 - k))).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_period_1_tracks_input() {
        assert_eq!(ema_recurrence(&[10.0, 20.0, 30.0], 1), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_equal_values() {
        assert!(ema_recurrence(&[100.0; 5], 3).iter().all(|&v| v == 100.0));
    }

    #[test]
    fn ema_empty_input() {
        assert!(ema_recurrence(&[], 3).is_empty());
    }

    #[test]
    fn ema_smoothing_factor() {
        let raw = ema_recurrence(&[0.0, 11.0], 10);
        // k = 2/11, so the second value is 11 * 2/11.
        assert!((raw[1] - 2.0).abs() < 1e-12);
    }
}
