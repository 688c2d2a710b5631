use serde::{Deserialize, Serialize};

/// A capture device a provider can open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Level notification published once per aggregator report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordingProgress {
    /// Meter value in `0..=100`.
    pub volume_percent: u8,
    /// Smallest normalized sample seen in the report window.
    pub min: f32,
    /// Largest normalized sample seen in the report window.
    pub max: f32,
}

impl RecordingProgress {
    pub fn from_levels(min: f32, max: f32) -> Self {
        Self {
            volume_percent: volume_percent(min, max),
            min,
            max,
        }
    }
}

/// Map a `(min, max)` window of normalized samples to a `0..=100` meter value.
///
/// Monotonic in `max(|min|, |max|)`; full scale reads 100. A NaN on either
/// side reads 0, since `f32::max` would otherwise pick the other operand.
pub fn volume_percent(min: f32, max: f32) -> u8 {
    if min.is_nan() || max.is_nan() {
        return 0;
    }
    let peak = max.abs().max(min.abs());
    (peak * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Per-session counters for debugging capture problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDiagnostics {
    pub buffers_received: u64,
    pub buffers_written: u64,
    pub buffers_dropped: u64,
    pub bytes_written: u64,
    pub reports_emitted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_reads_zero() {
        assert_eq!(volume_percent(0.0, 0.0), 0);
    }

    #[test]
    fn larger_magnitude_wins() {
        assert_eq!(volume_percent(-0.6, 0.3), 60);
        assert_eq!(volume_percent(-0.2, 0.8), 80);
    }

    #[test]
    fn clamps_to_full_scale() {
        assert_eq!(volume_percent(-1.0, 0.99997), 100);
        assert_eq!(volume_percent(-3.0, 2.0), 100);
        assert_eq!(volume_percent(f32::NEG_INFINITY, 0.1), 100);
    }

    #[test]
    fn nan_on_either_side_reads_zero() {
        assert_eq!(volume_percent(f32::NAN, 0.5), 0);
        assert_eq!(volume_percent(-0.5, f32::NAN), 0);
        assert_eq!(volume_percent(f32::NAN, f32::NAN), 0);
    }

    #[test]
    fn monotonic_in_peak() {
        let mut last = 0;
        for step in 0..=1000 {
            let peak = step as f32 / 1000.0;
            let pct = volume_percent(-peak / 2.0, peak);
            assert!(pct >= last, "meter dropped at peak {peak}");
            last = pct;
        }
        assert_eq!(last, 100);
    }
}
