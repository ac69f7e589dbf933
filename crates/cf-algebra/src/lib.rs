//! Certainty-Factor Arithmetic
//!
//! Pure numeric functions used by diagnosis rule actions. Positive
//! CFs confirm, negative CFs disconfirm, magnitude is strength.
//! Conclusions live in [-1, 1]; evidence in [0, 1].

use serde::{Deserialize, Serialize};

/// Minimum CF considered meaningful for a conclusion
pub const MIN_CONFIDENCE: f64 = 0.1;

/// Clamp a raw value into the CF interval [-1, 1]. Idempotent.
pub fn clamp(cf: f64) -> f64 {
    cf.clamp(-1.0, 1.0)
}

/// Rule strength class, scaling evidence into a conclusion CF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    /// Circumstantial evidence
    Weak,
    /// Typical presentation
    Medium,
    /// Pathognomonic presentation
    Strong,
}

impl Strength {
    /// Literature-derived scaling constant for this class
    pub fn factor(&self) -> f64 {
        match self {
            Strength::Weak => 0.45,
            Strength::Medium => 0.70,
            Strength::Strong => 0.90,
        }
    }

    /// Scale an evidence CF by this class's constant
    pub fn scale(&self, cf: f64) -> f64 {
        clamp(cf * self.factor())
    }

    /// String representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
        }
    }
}

/// Probabilistic OR of two independent CFs in [0, 1]:
/// `1 - (1-a)(1-b)`. Commutative, associative, and never below
/// either argument.
pub fn prob_or(a: f64, b: f64) -> f64 {
    1.0 - (1.0 - a) * (1.0 - b)
}

/// Probabilistic OR folded over any number of CFs. Empty input is 0.
pub fn prob_or_all(cfs: impl IntoIterator<Item = f64>) -> f64 {
    cfs.into_iter().fold(0.0, prob_or)
}

/// Conjunctive aggregation: the strict minimum. Empty input is 0.
pub fn min_agg(cfs: impl IntoIterator<Item = f64>) -> f64 {
    let min = cfs.into_iter().fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        min
    } else {
        0.0
    }
}

/// Bounded multiplicative adjustment: `clamp(base * factor)`
pub fn adjust(base: f64, factor: f64) -> f64 {
    clamp(base * factor)
}

/// Final CF for a category: the strict minimum of the base CF, the
/// post-adjustment CF, and the accumulated evidence CF when present.
/// Never a weighted average or a sum.
pub fn final_value(base: f64, adjusted: f64, evidence: Option<f64>) -> f64 {
    let floor = base.min(adjusted);
    match evidence {
        Some(e) => floor.min(e),
        None => floor,
    }
}

/// MYCIN combination of two CFs in [-1, 1]. Accumulates belief when
/// both confirm, disbelief when both disconfirm, and attenuates on
/// conflicting signs.
pub fn combine(cf1: f64, cf2: f64) -> f64 {
    let (cf1, cf2) = (clamp(cf1), clamp(cf2));
    let result = if cf1 >= 0.0 && cf2 >= 0.0 {
        cf1 + cf2 * (1.0 - cf1)
    } else if cf1 < 0.0 && cf2 < 0.0 {
        cf1 + cf2 * (1.0 + cf1)
    } else {
        let denom = 1.0 - cf1.abs().min(cf2.abs());
        if denom == 0.0 {
            0.0
        } else {
            (cf1 + cf2) / denom
        }
    };
    clamp(result)
}

/// MYCIN combination folded over a sequence of CFs. Empty input is 0.
pub fn combine_all(cfs: impl IntoIterator<Item = f64>) -> f64 {
    cfs.into_iter().fold(0.0, combine)
}

/// True when a CF clears the given confidence threshold
pub fn meets_threshold(cf: f64, threshold: f64) -> bool {
    cf >= threshold
}

/// Human-readable confidence label for a CF
pub fn confidence_level(cf: f64) -> &'static str {
    if cf < 0.0 {
        "Negative (against)"
    } else if cf >= 0.8 {
        "Very High"
    } else if cf >= 0.6 {
        "High"
    } else if cf >= 0.4 {
        "Moderate"
    } else if cf >= 0.2 {
        "Low"
    } else {
        "Very Low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_clamp_range() {
        assert_eq!(clamp(1.5), 1.0);
        assert_eq!(clamp(-1.5), -1.0);
        assert_eq!(clamp(0.3), 0.3);
    }

    #[test]
    fn test_strength_factors() {
        assert_eq!(Strength::Weak.factor(), 0.45);
        assert_eq!(Strength::Medium.factor(), 0.70);
        assert_eq!(Strength::Strong.factor(), 0.90);
    }

    #[test]
    fn test_strength_scaling() {
        // Single weak core symptom at 0.85 evidence
        assert!((Strength::Weak.scale(0.85) - 0.3825).abs() < EPS);
        // Strong rule over min(0.85, 0.85)
        assert!((Strength::Strong.scale(0.85) - 0.765).abs() < EPS);
    }

    #[test]
    fn test_prob_or() {
        assert!((prob_or(0.5, 0.5) - 0.75).abs() < EPS);
        assert!((prob_or(0.49, 0.49) - 0.7399).abs() < EPS);
        assert_eq!(prob_or(0.0, 0.3), 0.3);
        assert_eq!(prob_or(1.0, 0.3), 1.0);
    }

    #[test]
    fn test_prob_or_all() {
        assert_eq!(prob_or_all([]), 0.0);
        assert!((prob_or_all([0.5, 0.5, 0.5]) - 0.875).abs() < EPS);
    }

    #[test]
    fn test_min_agg() {
        assert_eq!(min_agg([0.85, 0.85]), 0.85);
        assert_eq!(min_agg([0.9, 0.2, 0.5]), 0.2);
        assert_eq!(min_agg([]), 0.0);
    }

    #[test]
    fn test_adjust_clamps() {
        assert!((adjust(0.8, 1.2) - 0.96).abs() < EPS);
        assert!((adjust(0.8, 0.7) - 0.56).abs() < EPS);
        assert_eq!(adjust(0.9, 1.5), 1.0);
        assert_eq!(adjust(-0.9, 1.5), -1.0);
    }

    #[test]
    fn test_final_value_is_strict_min() {
        assert_eq!(final_value(0.85, 0.595, None), 0.595);
        assert_eq!(final_value(0.9, 0.9, None), 0.9);
        assert_eq!(final_value(0.9, 0.9, Some(0.4)), 0.4);
        assert_eq!(final_value(0.3, 0.9, Some(0.4)), 0.3);
    }

    #[test]
    fn test_combine_both_positive() {
        // 0.8 + 0.6 * (1 - 0.8) = 0.92
        assert!((combine(0.8, 0.6) - 0.92).abs() < EPS);
    }

    #[test]
    fn test_combine_both_negative() {
        // -0.5 + (-0.3) * (1 - 0.5) = -0.65
        assert!((combine(-0.5, -0.3) + 0.65).abs() < EPS);
    }

    #[test]
    fn test_combine_mixed_signs() {
        // (0.7 - 0.4) / (1 - 0.4) = 0.5
        assert!((combine(0.7, -0.4) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_combine_total_conflict() {
        assert_eq!(combine(1.0, -1.0), 0.0);
    }

    #[test]
    fn test_combine_all() {
        // 0.8 ⊕ 0.6 = 0.92; 0.92 ⊕ 0.4 = 0.952
        assert!((combine_all([0.8, 0.6, 0.4]) - 0.952).abs() < EPS);
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(confidence_level(0.9), "Very High");
        assert_eq!(confidence_level(0.5), "Moderate");
        assert_eq!(confidence_level(0.05), "Very Low");
        assert_eq!(confidence_level(-0.3), "Negative (against)");
    }

    #[test]
    fn test_meets_threshold() {
        assert!(meets_threshold(0.5, 0.4));
        assert!(meets_threshold(0.4, 0.4));
        assert!(!meets_threshold(0.3, 0.4));
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn clamp_is_idempotent_and_in_range(x in -1e6f64..1e6) {
            let c = clamp(x);
            prop_assert!((-1.0..=1.0).contains(&c));
            prop_assert_eq!(clamp(c), c);
        }

        #[test]
        fn prob_or_commutative(a in 0.0f64..1.0, b in 0.0f64..1.0) {
            prop_assert!((prob_or(a, b) - prob_or(b, a)).abs() < 1e-12);
        }

        #[test]
        fn prob_or_associative(
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
            c in 0.0f64..1.0,
        ) {
            let left = prob_or(prob_or(a, b), c);
            let right = prob_or(a, prob_or(b, c));
            prop_assert!((left - right).abs() < 1e-9);
        }

        #[test]
        fn prob_or_dominates_max(a in 0.0f64..1.0, b in 0.0f64..1.0) {
            prop_assert!(prob_or(a, b) >= a.max(b) - 1e-12);
        }

        #[test]
        fn min_agg_below_any_pair(
            a in -1.0f64..1.0,
            b in -1.0f64..1.0,
            c in -1.0f64..1.0,
        ) {
            prop_assert!(min_agg([a, b, c]) <= a.min(b));
        }

        #[test]
        fn adjust_stays_bounded(base in -1.0f64..1.0, factor in 0.0f64..3.0) {
            let out = adjust(base, factor);
            prop_assert!((-1.0..=1.0).contains(&out));
        }

        #[test]
        fn combine_commutative_and_bounded(
            a in -1.0f64..=1.0,
            b in -1.0f64..=1.0,
        ) {
            let ab = combine(a, b);
            prop_assert!((-1.0..=1.0).contains(&ab));
            prop_assert!((ab - combine(b, a)).abs() < 1e-9);
        }

        #[test]
        fn final_value_never_exceeds_inputs(
            base in -1.0f64..=1.0,
            adjusted in -1.0f64..=1.0,
            evidence in proptest::option::of(0.0f64..=1.0),
        ) {
            let v = final_value(base, adjusted, evidence);
            prop_assert!(v <= base && v <= adjusted);
            if let Some(e) = evidence {
                prop_assert!(v <= e);
            }
        }
    }
}
