//! 16-bit little-endian PCM helpers.

/// Scale from an `i16` sample to the normalized `[-1.0, 1.0)` range.
pub const I16_SCALE: f32 = 32768.0;

/// Iterate the complete samples in `bytes`, normalized to `[-1.0, 1.0)`.
///
/// A trailing odd byte is ignored.
pub fn normalized_samples(bytes: &[u8]) -> impl Iterator<Item = f32> + '_ {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / I16_SCALE)
}

/// Encode `samples` as little-endian bytes.
pub fn encode_i16(samples: &[i16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        data.extend_from_slice(&sample.to_le_bytes());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn decodes_little_endian() {
        let bytes = encode_i16(&[0, i16::MIN, 16384, -16384]);
        let samples: Vec<f32> = normalized_samples(&bytes).collect();
        assert_eq!(samples.len(), 4);
        assert_relative_eq!(samples[0], 0.0);
        assert_relative_eq!(samples[1], -1.0);
        assert_relative_eq!(samples[2], 0.5);
        assert_relative_eq!(samples[3], -0.5);
    }

    #[test]
    fn full_scale_positive_stays_below_one() {
        let bytes = encode_i16(&[i16::MAX]);
        let sample = normalized_samples(&bytes).next().unwrap();
        assert!(sample < 1.0);
        assert_relative_eq!(sample, 0.99997, epsilon = 1e-5);
    }

    #[test]
    fn odd_trailing_byte_is_ignored() {
        let mut bytes = encode_i16(&[100, 200]);
        bytes.push(0x7f);
        assert_eq!(normalized_samples(&bytes).count(), 2);
    }
}
