use crate::error::RepeatError;

const SUM_TOLERANCE: f64 = 1e-3;

/// Row-wise softmax turning classifier logits into categorical predictions.
pub fn predictions_from_logits(logits: &[Vec<f64>]) -> Vec<Vec<f32>> {
    logits
        .iter()
        .map(|row| {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = row.iter().map(|&x| (x - max).exp()).collect();
            let total: f64 = exps.iter().sum();
            exps.iter().map(|&e| (e / total) as f32).collect()
        })
        .collect()
}

/// Checks that `predictions` pairs one fixed-width distribution with every
/// trace sample.
pub fn validate_predictions(
    signal_len: usize,
    predictions: &[Vec<f32>],
) -> Result<(), RepeatError> {
    if predictions.len() != signal_len {
        return Err(RepeatError::invalid_input(format!(
            "prediction count ({}) does not match signal length ({signal_len})",
            predictions.len()
        )));
    }
    let Some(width) = predictions.first().map(Vec::len) else {
        return Ok(());
    };
    if width == 0 {
        return Err(RepeatError::invalid_input("prediction vectors are empty"));
    }
    for (index, vector) in predictions.iter().enumerate() {
        if vector.len() != width {
            return Err(RepeatError::invalid_input(format!(
                "prediction {index} has {} symbols, expected {width}",
                vector.len()
            )));
        }
        if vector.iter().any(|&p| !p.is_finite() || p < 0.0) {
            return Err(RepeatError::invalid_input(format!(
                "prediction {index} contains a negative or non-finite probability"
            )));
        }
        let total: f64 = vector.iter().map(|&p| f64::from(p)).sum();
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Err(RepeatError::invalid_input(format!(
                "prediction {index} sums to {total:.4}, expected 1"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_rows_sum_to_one() {
        let logits = vec![vec![1.0, 2.0, 3.0, 0.5, -1.0], vec![1000.0, 1000.0, 0.0, 0.0, 0.0]];
        let probs = predictions_from_logits(&logits);
        for row in &probs {
            let total: f32 = row.iter().sum();
            assert!((total - 1.0).abs() < 1e-5);
        }
        assert!(probs[0][2] > probs[0][1]);
        assert!((probs[1][0] - 0.5).abs() < 1e-5);
        assert!(validate_predictions(2, &probs).is_ok());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let probs = vec![vec![1.0f32, 0.0]; 3];
        let err = validate_predictions(4, &probs).unwrap_err();
        assert!(err.to_string().contains("does not match signal length"));
    }

    #[test]
    fn ragged_or_unnormalized_vectors_are_rejected() {
        let ragged = vec![vec![1.0f32, 0.0], vec![1.0f32, 0.0, 0.0]];
        assert!(validate_predictions(2, &ragged).is_err());
        let unnormalized = vec![vec![0.7f32, 0.7]];
        assert!(validate_predictions(1, &unnormalized).is_err());
        let negative = vec![vec![1.5f32, -0.5]];
        assert!(validate_predictions(1, &negative).is_err());
    }
}
