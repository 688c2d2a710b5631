use std::time::Duration;

/// Result of one `VolumeFader::fade_buffer` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeOutcome {
    /// The fader is not armed; the buffer was left untouched.
    Inactive,
    /// The buffer was scaled by this gain and the fade continues.
    Fading(f64),
    /// The gain reached zero on this buffer. Returned once per `start`.
    Completed,
}

/// Linear fade-out applied in place to 16-bit little-endian PCM.
///
/// The gain is computed once per buffer, after adding the buffer's byte
/// count to the progress counter, giving a stepwise envelope:
/// `gain = 1 - modified / to_modify`, clamped at 0.
/// Progress is counted in bytes against a target expressed in samples.
#[derive(Debug, Clone)]
pub struct VolumeFader {
    sample_rate: u32,
    fade_duration: Duration,
    active: bool,
    samples_to_modify: u64,
    samples_modified: u64,
}

impl VolumeFader {
    pub fn new(sample_rate: u32, fade_duration: Duration) -> Self {
        Self {
            sample_rate,
            fade_duration,
            active: false,
            samples_to_modify: 0,
            samples_modified: 0,
        }
    }

    /// Arm the fader. The next buffer is the first one attenuated.
    pub fn start(&mut self) {
        let target = (self.fade_duration.as_secs_f64() * self.sample_rate as f64) as u64;
        self.samples_to_modify = target.max(1);
        self.samples_modified = 0;
        self.active = true;
        log::debug!(
            "fade armed: {} samples over {:?}",
            self.samples_to_modify,
            self.fade_duration
        );
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn samples_to_modify(&self) -> u64 {
        self.samples_to_modify
    }

    /// Attenuate `buffer` in place. Odd trailing bytes are counted but not
    /// rewritten.
    pub fn fade_buffer(&mut self, buffer: &mut [u8]) -> FadeOutcome {
        if !self.active {
            return FadeOutcome::Inactive;
        }

        self.samples_modified += buffer.len() as u64;
        let fraction =
            (1.0 - self.samples_modified as f64 / self.samples_to_modify as f64).max(0.0);

        for pair in buffer.chunks_exact_mut(2) {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            let scaled = (sample as f64 * fraction) as i16;
            pair.copy_from_slice(&scaled.to_le_bytes());
        }

        if fraction <= 0.0 {
            self.active = false;
            log::debug!("fade complete after {} bytes", self.samples_modified);
            return FadeOutcome::Completed;
        }
        FadeOutcome::Fading(fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_buffer(sample: i16, bytes: usize) -> Vec<u8> {
        sample.to_le_bytes().iter().copied().cycle().take(bytes).collect()
    }

    fn first_sample(buffer: &[u8]) -> i16 {
        i16::from_le_bytes([buffer[0], buffer[1]])
    }

    fn armed(sample_rate: u32) -> VolumeFader {
        let mut fader = VolumeFader::new(sample_rate, Duration::from_secs(4));
        fader.start();
        fader
    }

    #[test]
    fn four_seconds_at_44100() {
        assert_eq!(armed(44100).samples_to_modify(), 176_400);
    }

    #[test]
    fn unarmed_fader_leaves_buffer_alone() {
        let mut fader = VolumeFader::new(44100, Duration::from_secs(4));
        let mut buffer = constant_buffer(1234, 64);
        assert_eq!(fader.fade_buffer(&mut buffer), FadeOutcome::Inactive);
        assert_eq!(buffer, constant_buffer(1234, 64));
    }

    #[test]
    fn full_length_buffer_completes_exactly_once() {
        let mut fader = armed(44100);
        let mut buffer = vec![0u8; 176_400];

        assert_eq!(fader.fade_buffer(&mut buffer), FadeOutcome::Completed);
        assert!(!fader.is_active());
        assert_eq!(fader.fade_buffer(&mut buffer), FadeOutcome::Inactive);
    }

    #[test]
    fn does_not_complete_early() {
        let mut fader = armed(44100);
        let mut most = vec![0u8; 176_398];
        assert!(matches!(fader.fade_buffer(&mut most), FadeOutcome::Fading(_)));

        let mut last = vec![0u8; 2];
        assert_eq!(fader.fade_buffer(&mut last), FadeOutcome::Completed);
    }

    #[test]
    fn constant_samples_scale_by_gain() {
        let mut fader = armed(44100);
        for (gain, sample) in [(0.75, 750i16), (0.5, 500), (0.25, 250)] {
            let mut buffer = constant_buffer(1000, 44_100);
            assert_eq!(fader.fade_buffer(&mut buffer), FadeOutcome::Fading(gain));
            assert!(buffer.chunks_exact(2).all(|p| i16::from_le_bytes([p[0], p[1]]) == sample));
        }

        let mut buffer = constant_buffer(1000, 44_100);
        assert_eq!(fader.fade_buffer(&mut buffer), FadeOutcome::Completed);
        assert!(buffer.chunks_exact(2).all(|p| i16::from_le_bytes([p[0], p[1]]) == 0));
    }

    #[test]
    fn negative_samples_truncate_toward_zero() {
        let mut fader = armed(44100);
        let mut buffer = constant_buffer(-1001, 88_200);
        assert_eq!(fader.fade_buffer(&mut buffer), FadeOutcome::Fading(0.5));
        assert_eq!(first_sample(&buffer), -500);
    }

    #[test]
    fn magnitude_never_increases_while_fading() {
        let mut fader = armed(8000);
        let mut previous = i32::MAX;
        loop {
            let mut buffer = constant_buffer(i16::MIN, 1_000);
            let outcome = fader.fade_buffer(&mut buffer);
            let magnitude = (first_sample(&buffer) as i32).abs();
            assert!(magnitude <= previous, "{magnitude} > {previous}");
            previous = magnitude;
            if outcome == FadeOutcome::Completed {
                assert_eq!(magnitude, 0);
                break;
            }
        }
    }

    #[test]
    fn restart_rearms_a_spent_fader() {
        let mut fader = armed(44100);
        let mut buffer = vec![0u8; 176_400];
        assert_eq!(fader.fade_buffer(&mut buffer), FadeOutcome::Completed);

        fader.start();
        let mut buffer = constant_buffer(400, 88_200);
        assert_eq!(fader.fade_buffer(&mut buffer), FadeOutcome::Fading(0.5));
        assert_eq!(first_sample(&buffer), 200);
    }
}
