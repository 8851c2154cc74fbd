//! # Retention Policy
//!
//! Decide se la versione ricodificata sostituisce l'originale.
//! Soglia fissa: sostituisce solo se `nuovo / originale < 0.93`, cioè con
//! almeno il 7% di riduzione. Il confronto è stretto.

use serde::Serialize;

/// Default size ratio below which the transcoded file is kept
pub const DEFAULT_THRESHOLD: f64 = 0.93;

/// Outcome of the size comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionDecision {
    Replace,
    Discard,
}

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    threshold: f64,
}

impl RetentionPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `Replace` iff `ratio < threshold`; NaN and infinity never replace
    pub fn decide(&self, ratio: f64) -> RetentionDecision {
        if ratio < self.threshold {
            RetentionDecision::Replace
        } else {
            RetentionDecision::Discard
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// `output / input` as a float. An empty input gives a non-finite ratio.
pub fn size_ratio(input_size: u64, output_size: u64) -> f64 {
    output_size as f64 / input_size as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.decide(0.5), RetentionDecision::Replace);
        assert_eq!(policy.decide(0.93), RetentionDecision::Discard);
        assert_eq!(policy.decide(0.9299), RetentionDecision::Replace);
        assert_eq!(policy.decide(1.2), RetentionDecision::Discard);
        assert_eq!(policy.decide(0.0), RetentionDecision::Replace);
    }

    #[test]
    fn test_non_finite_ratios_discard() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.decide(size_ratio(0, 0)), RetentionDecision::Discard);
        assert_eq!(policy.decide(size_ratio(0, 10)), RetentionDecision::Discard);
    }

    #[test]
    fn test_size_ratio() {
        assert_eq!(size_ratio(200, 100), 0.5);
        assert_eq!(size_ratio(100, 100), 1.0);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = RetentionPolicy::new(0.5);
        assert_eq!(policy.decide(0.6), RetentionDecision::Discard);
        assert_eq!(policy.decide(0.49), RetentionDecision::Replace);
        assert_eq!(policy.threshold(), 0.5);
    }
}
