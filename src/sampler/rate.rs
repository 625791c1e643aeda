use std::time::SystemTime;

/// Cumulative counters captured by the previous sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateState {
    pub at: SystemTime,
    pub cpu_seconds: Option<f64>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Point-in-time rates derived from two consecutive samples.
///
/// All fields are `None` on the first sample. They are never negative and never NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rates {
    pub cpu_percent_of_limit: Option<f64>,
    pub cpu_percent_of_host: Option<f64>,
    pub rx_per_sec: Option<f64>,
    pub tx_per_sec: Option<f64>,
}

impl Rates {
    fn zero() -> Self {
        Rates {
            cpu_percent_of_limit: Some(0.0),
            cpu_percent_of_host: Some(0.0),
            rx_per_sec: Some(0.0),
            tx_per_sec: Some(0.0),
        }
    }
}

/// Computes rates between `prev` and `cur`.
///
/// A clock that did not advance (or went backwards) yields all-zero rates. Counters that
/// went backwards, e.g. after an interface reset, yield a rate of zero. CPU percentages
/// are `None` when the corresponding core count is not positive or either CPU reading is
/// missing.
pub fn compute(
    prev: Option<&RateState>,
    cur: &RateState,
    limit_cores: f64,
    host_cores: f64,
) -> Rates {
    let Some(prev) = prev else {
        return Rates::default();
    };
    let elapsed = cur
        .at
        .duration_since(prev.at)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    if elapsed <= 0.0 {
        return Rates::zero();
    }

    let per_sec = |old: u64, new: u64| new.saturating_sub(old) as f64 / elapsed;
    let cpu_used = match (prev.cpu_seconds, cur.cpu_seconds) {
        (Some(old), Some(new)) => Some((new - old).max(0.0) / elapsed),
        _ => None,
    };
    let percent = |cores: f64| cpu_used.filter(|_| cores > 0.0).map(|used| used / cores * 100.0);

    Rates {
        cpu_percent_of_limit: percent(limit_cores),
        cpu_percent_of_host: percent(host_cores),
        rx_per_sec: Some(per_sec(prev.rx_bytes, cur.rx_bytes)),
        tx_per_sec: Some(per_sec(prev.tx_bytes, cur.tx_bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn state(secs: u64, cpu: f64, rx: u64, tx: u64) -> RateState {
        RateState {
            at: UNIX_EPOCH + Duration::from_secs(secs),
            cpu_seconds: Some(cpu),
            rx_bytes: rx,
            tx_bytes: tx,
        }
    }

    #[test]
    fn test_first_sample_has_no_rates() {
        let rates = compute(None, &state(10, 1.0, 0, 0), 1.0, 4.0);
        assert_eq!(rates, Rates::default());
    }

    #[test]
    fn test_rates_over_one_second() {
        let prev = state(10, 1.0, 1000, 500);
        let cur = state(11, 1.5, 3000, 700);
        let rates = compute(Some(&prev), &cur, 2.0, 4.0);
        assert_eq!(rates.rx_per_sec, Some(2000.0));
        assert_eq!(rates.tx_per_sec, Some(200.0));
        assert_eq!(rates.cpu_percent_of_limit, Some(25.0));
        assert_eq!(rates.cpu_percent_of_host, Some(12.5));
    }

    #[test]
    fn test_counter_reset_floors_at_zero() {
        let prev = state(10, 5.0, 5000, 5000);
        let cur = state(12, 4.0, 100, 100);
        let rates = compute(Some(&prev), &cur, 1.0, 1.0);
        assert_eq!(rates.rx_per_sec, Some(0.0));
        assert_eq!(rates.tx_per_sec, Some(0.0));
        assert_eq!(rates.cpu_percent_of_limit, Some(0.0));
    }

    #[test]
    fn test_non_positive_interval_yields_zero() {
        let prev = state(10, 1.0, 0, 0);
        for cur in [state(10, 9.0, 100, 100), state(9, 9.0, 100, 100)] {
            assert_eq!(compute(Some(&prev), &cur, 1.0, 1.0), Rates::zero());
        }
    }

    #[test]
    fn test_missing_cpu_or_cores() {
        let prev = state(10, 1.0, 0, 0);
        let mut cur = state(11, 2.0, 0, 0);
        let rates = compute(Some(&prev), &cur, 0.0, 2.0);
        assert_eq!(rates.cpu_percent_of_limit, None);
        assert_eq!(rates.cpu_percent_of_host, Some(50.0));

        cur.cpu_seconds = None;
        let rates = compute(Some(&prev), &cur, 1.0, 2.0);
        assert_eq!(rates.cpu_percent_of_host, None);
        assert_eq!(rates.rx_per_sec, Some(0.0));
    }
}
