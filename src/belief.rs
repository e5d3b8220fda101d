//! Belief values: the (strength, confidence) pair weighting every fact, task and goal.
//!
//! Both components live in `[0.0, 1.0]`. Construction clamps, so no operation
//! in this module can produce an out-of-range value.

use serde::{Deserialize, Serialize};

/// Weight given to the second operand's confidence when two beliefs are revised.
pub const EVIDENCE_ACCUMULATION: f64 = 0.1;

/// An immutable (strength, confidence) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeliefValue {
    strength: f64,
    confidence: f64,
}

impl BeliefValue {
    /// The value carried by freshly created atoms: full strength, no evidence.
    pub const NO_EVIDENCE: Self = Self {
        strength: 1.0,
        confidence: 0.0,
    };

    /// Create a belief value, clamping both components into `[0, 1]`.
    ///
    /// NaN inputs collapse to zero.
    pub fn new(strength: f64, confidence: f64) -> Self {
        Self {
            strength: clamp_unit(strength),
            confidence: clamp_unit(confidence),
        }
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Evidence weight: `strength * confidence`.
    pub fn weight(&self) -> f64 {
        self.strength * self.confidence
    }

    /// Whether the confidence reaches the given threshold.
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }

    /// Revise this belief with another piece of evidence.
    ///
    /// Strength is the confidence-weighted average of both strengths (0 when
    /// neither side carries confidence). Confidence grows by the other side's
    /// confidence scaled by [`EVIDENCE_ACCUMULATION`], saturating at 1.
    pub fn revise(&self, other: &BeliefValue) -> BeliefValue {
        let total = self.confidence + other.confidence;
        let strength = if total > 0.0 {
            (self.strength * self.confidence + other.strength * other.confidence) / total
        } else {
            0.0
        };
        let confidence = (self.confidence + other.confidence * EVIDENCE_ACCUMULATION).min(1.0);
        BeliefValue::new(strength, confidence)
    }
}

impl Default for BeliefValue {
    fn default() -> Self {
        Self::NO_EVIDENCE
    }
}

impl std::fmt::Display for BeliefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{:.3}, {:.3}>", self.strength, self.confidence)
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_clamps() {
        let b = BeliefValue::new(1.7, -0.3);
        assert_eq!(b.strength(), 1.0);
        assert_eq!(b.confidence(), 0.0);
        assert_eq!(BeliefValue::new(f64::NAN, 0.5).strength(), 0.0);
    }

    #[test]
    fn revise_weights_strength_by_confidence() {
        let a = BeliefValue::new(1.0, 0.6);
        let b = BeliefValue::new(0.0, 0.2);
        let r = a.revise(&b);
        assert!((r.strength() - 0.75).abs() < 1e-9);
        assert!((r.confidence() - 0.62).abs() < 1e-9);
    }

    #[test]
    fn revise_zero_confidence_falls_back_to_zero_strength() {
        let a = BeliefValue::new(0.9, 0.0);
        let b = BeliefValue::new(0.4, 0.0);
        let r = a.revise(&b);
        assert_eq!(r.strength(), 0.0);
        assert_eq!(r.confidence(), 0.0);
    }

    #[test]
    fn revise_stays_in_unit_square() {
        let samples = [0.0, 0.1, 0.5, 0.9, 1.0];
        for &s1 in &samples {
            for &c1 in &samples {
                for &s2 in &samples {
                    for &c2 in &samples {
                        let r = BeliefValue::new(s1, c1).revise(&BeliefValue::new(s2, c2));
                        assert!((0.0..=1.0).contains(&r.strength()));
                        assert!((0.0..=1.0).contains(&r.confidence()));
                    }
                }
            }
        }
    }

    #[test]
    fn confidence_saturates() {
        let r = BeliefValue::new(0.5, 1.0).revise(&BeliefValue::new(0.5, 1.0));
        assert_eq!(r.confidence(), 1.0);
    }

    #[test]
    fn display_format() {
        assert_eq!(BeliefValue::new(0.5, 0.25).to_string(), "<0.500, 0.250>");
    }
}
