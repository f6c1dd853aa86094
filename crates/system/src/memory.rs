/// Bytes per megabyte as reported by OS memory counters.
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Convert a byte count to megabytes.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Fraction of installed memory in use, clamped to `[0, 1]`.
///
/// `available_mb` can briefly exceed `total_mb` (the total comes from a
/// different accounting source than the live counter); the clamp keeps the
/// gauge from overflowing.  Returns `0.0` when the total is unknown.
pub fn used_ratio(total_mb: f64, available_mb: f64) -> f32 {
    if total_mb <= 0.0 {
        return 0.0;
    }
    ((total_mb - available_mb) / total_mb).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_gig_with_four_free() {
        assert_eq!(used_ratio(16_000.0, 4_000.0), 0.75);
    }

    #[test]
    fn ratio_is_clamped() {
        assert_eq!(used_ratio(16_000.0, 20_000.0), 0.0);
        assert_eq!(used_ratio(16_000.0, -5.0), 1.0);
    }

    #[test]
    fn unknown_total() {
        assert_eq!(used_ratio(0.0, 100.0), 0.0);
    }

    #[test]
    fn mb_conversion() {
        assert_eq!(bytes_to_mb(8 * 1024 * 1024 * 1024), 8192.0);
    }
}
