//! Per-device sliding-window conversion-success accounting.

use heapless::Deque;

/// Upper bound on the sliding window length. `window_ms`/`period_us`
/// combinations that would ask for more samples than this are clamped —
/// the window stays a fixed-capacity, non-allocating buffer regardless of
/// configuration.
pub const MAX_WINDOW: usize = 64;

struct SuccessWindow {
    samples: Deque<bool, MAX_WINDOW>,
    window_len: usize,
    successes: u32,
}

impl SuccessWindow {
    fn new(window_len: usize) -> Self {
        SuccessWindow {
            samples: Deque::new(),
            window_len,
            successes: 0,
        }
    }

    fn record(&mut self, success: bool) {
        let cap = self.window_len.clamp(1, MAX_WINDOW);
        if self.samples.len() >= cap {
            if let Some(old) = self.samples.pop_front() {
                if old {
                    self.successes -= 1;
                }
            }
        }
        let _ = self.samples.push_back(success);
        if success {
            self.successes += 1;
        }
    }

    fn rate(&self) -> f32 {
        if self.samples.is_empty() {
            1.0
        } else {
            self.successes as f32 / self.samples.len() as f32
        }
    }
}

/// Per-device windowed success rates plus the two timing figures the
/// supervisor refreshes each read cycle.
pub struct Diagnostics<const N: usize> {
    windows: [SuccessWindow; N],
    pub reading_period_us: u32,
    pub time_to_read_us: u32,
}

impl<const N: usize> Diagnostics<N> {
    /// `window_len` is the number of samples spanning `window_ms`, i.e.
    /// `ceil(window_ms * 1000 / period_us)`.
    pub fn new(window_len: usize) -> Self {
        Diagnostics {
            windows: core::array::from_fn(|_| SuccessWindow::new(window_len)),
            reading_period_us: 0,
            time_to_read_us: 0,
        }
    }

    /// Records a success/failure sample for `device`, always against its
    /// own explicit index — never a shared or leaked-scope slot.
    pub fn record(&mut self, device: usize, success: bool) {
        self.windows[device].record(success);
    }

    pub fn success_rate(&self, device: usize) -> f32 {
        self.windows[device].rate()
    }
}

/// `ceil(window_ms * 1000 / period_us)`, at least 1.
pub fn window_len_from(window_ms: u32, period_us: u32) -> usize {
    let window_us = window_ms as u64 * 1000;
    let len = window_us.div_ceil(period_us as u64);
    len.max(1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_one_before_any_sample() {
        let diag: Diagnostics<2> = Diagnostics::new(4);
        assert_eq!(diag.success_rate(0), 1.0);
    }

    #[test]
    fn rate_tracks_successes_over_filled_slots_before_window_is_full() {
        let mut diag: Diagnostics<1> = Diagnostics::new(4);
        diag.record(0, true);
        diag.record(0, true);
        diag.record(0, false);
        assert_eq!(diag.success_rate(0), 2.0 / 3.0);
    }

    #[test]
    fn window_evicts_oldest_sample_once_full() {
        let mut diag: Diagnostics<1> = Diagnostics::new(2);
        diag.record(0, true);
        diag.record(0, true);
        assert_eq!(diag.success_rate(0), 1.0);
        diag.record(0, false);
        assert_eq!(diag.success_rate(0), 0.5);
        diag.record(0, false);
        assert_eq!(diag.success_rate(0), 0.0);
    }

    #[test]
    fn samples_for_one_device_do_not_affect_another() {
        let mut diag: Diagnostics<2> = Diagnostics::new(4);
        diag.record(0, false);
        diag.record(0, false);
        assert_eq!(diag.success_rate(1), 1.0);
    }

    #[test]
    fn window_len_from_rounds_up() {
        assert_eq!(window_len_from(1, 10_000), 100);
        assert_eq!(window_len_from(1, 300), 4); // ceil(1000/300) = 4
    }
}
