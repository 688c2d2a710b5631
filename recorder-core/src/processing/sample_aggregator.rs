/// Shortest reporting interval the aggregator accepts.
pub const MIN_REPORTING_INTERVAL_MS: u32 = 20;

/// Smallest number of samples per report.
pub const MIN_REPORT_COUNT: u32 = 10;

/// `(min, max)` of the samples seen since the previous report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReport {
    pub min: f32,
    pub max: f32,
}

/// Reduces a sample stream to periodic `(min, max)` level reports.
///
/// Whatever scale is fed in is the scale reported out; the engine feeds
/// samples normalized to `[-1.0, 1.0)`.
///
/// The running min/max restart from zero after each report, so a window of
/// strictly positive samples reports `min == 0.0`.
#[derive(Debug, Clone)]
pub struct SampleAggregator {
    report_count: u32,
    count: u32,
    min_value: f32,
    max_value: f32,
}

impl SampleAggregator {
    pub fn new(samples_per_second: u32, reporting_interval_ms: u32) -> Self {
        let interval = reporting_interval_ms.max(MIN_REPORTING_INTERVAL_MS);
        let report_count = (samples_per_second as u64 * interval as u64 / 1000) as u32;
        Self {
            report_count: report_count.max(MIN_REPORT_COUNT),
            count: 0,
            min_value: 0.0,
            max_value: 0.0,
        }
    }

    /// Number of samples per report window.
    pub fn report_count(&self) -> u32 {
        self.report_count
    }

    /// Add one sample, returning a report when the window fills.
    pub fn add(&mut self, value: f32) -> Option<LevelReport> {
        self.max_value = self.max_value.max(value);
        self.min_value = self.min_value.min(value);
        self.count += 1;

        if self.count >= self.report_count {
            let report = LevelReport {
                min: self.min_value,
                max: self.max_value,
            };
            self.reset();
            return Some(report);
        }
        None
    }

    /// Discard the partial window.
    pub fn reset(&mut self) {
        self.count = 0;
        self.min_value = 0.0;
        self.max_value = 0.0;
    }
}
