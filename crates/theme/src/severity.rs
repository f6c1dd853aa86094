/// Upper bound (inclusive) of the good bucket.
pub const GOOD_MAX: f32 = 50.0;
/// Lower bound (inclusive) of the critical bucket.
pub const CRITICAL_MIN: f32 = 85.0;

/// How alarming a metric value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Good,
    Warning,
    Critical,
}

impl Severity {
    /// Bucket a value on the 0–100 scale.
    ///
    /// `<= 50` is good, `>= 85` is critical, anything in between is a warning.
    pub fn classify(value: f32) -> Self {
        if value <= GOOD_MAX {
            Self::Good
        } else if value >= CRITICAL_MIN {
            Self::Critical
        } else {
            Self::Warning
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive_at_both_ends() {
        assert_eq!(Severity::classify(50.0), Severity::Good);
        assert_eq!(Severity::classify(50.01), Severity::Warning);
        assert_eq!(Severity::classify(84.99), Severity::Warning);
        assert_eq!(Severity::classify(85.0), Severity::Critical);
    }

    #[test]
    fn extremes() {
        assert_eq!(Severity::classify(0.0), Severity::Good);
        assert_eq!(Severity::classify(100.0), Severity::Critical);
        // GPU sums across engines can exceed 100.
        assert_eq!(Severity::classify(240.0), Severity::Critical);
    }

    #[test]
    fn ram_ratio_scaled_to_percent() {
        let used = (16_000.0_f32 - 4_000.0) / 16_000.0;
        assert_eq!(Severity::classify(used * 100.0), Severity::Warning);
    }
}
