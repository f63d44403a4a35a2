//! Pure post-processing over raw per-class scores. These functions are
//! independent of the HTTP layer and of the inference runtime's output
//! types, so they can be tested on plain slices.

/// Index of the highest score. A forward scan with strict `>` keeps the
/// lowest index on ties. Returns `None` for an empty slice.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Numerically stable softmax (max-subtracted before exponentiation).
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Softmax probability of the predicted class, as a percentage rounded to
/// two decimal places. Always in [0, 100].
pub fn confidence_percent(scores: &[f32]) -> f32 {
    let probs = softmax(scores);
    let max = probs.iter().cloned().fold(0.0f32, f32::max);
    round2(max * 100.0)
}

pub(crate) fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_highest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[3.0, -1.0, 2.0]), Some(0));
    }

    #[test]
    fn test_argmax_tie_breaks_to_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[0.1, 0.9, 0.9]), Some(1));
    }

    #[test]
    fn test_argmax_empty() {
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_is_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_softmax_preserves_argmax() {
        let logits = [0.3, -2.0, 5.1, 4.9];
        assert_eq!(argmax(&logits), argmax(&softmax(&logits)));
    }

    #[test]
    fn test_confidence_percent_range() {
        let confidence = confidence_percent(&[1.0, 2.0, 3.0]);
        assert!((0.0..=100.0).contains(&confidence));
    }

    #[test]
    fn test_confidence_percent_rounds_to_two_decimals() {
        // Two equal logits give exactly 50%.
        assert_eq!(confidence_percent(&[1.0, 1.0]), 50.0);
        let confidence = confidence_percent(&[0.1, 0.2, 0.3]);
        assert_eq!(confidence, round2(confidence));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666_6), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }
}
